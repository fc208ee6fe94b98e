//! StatArb - Cointegration Pairs Research Engine
//!
//! Screens a price panel for cointegrated pairs and reports on the
//! resulting portfolio.

use anyhow::Result;
use statarb::adapters::cli;

fn main() -> Result<()> {
    // Load .env file if it exists (STATARB_PANEL, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app)
}
