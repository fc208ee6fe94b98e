//! CLI Command Handlers
//!
//! Implementation of the research commands: pair screening, the full
//! analysis run and the parameter sweep.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::json_panel::JsonPanelSource;
use crate::application::ResearchPipeline;
use crate::config::{load_or_default, Config};
use crate::ports::panel_source::PanelSource;
use crate::strategy::pair_selection::PairSelector;
use crate::strategy::params::max_hold_option;
use crate::strategy::spread::construct_spread;
use crate::validation::sensitivity::{best_row, parameter_sweep};

/// StatArb - Cointegration pairs research engine
#[derive(Parser, Debug)]
#[command(
    name = "statarb",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Cointegration pairs research engine",
    long_about = "StatArb screens a price panel for cointegrated pairs, trades their \
                  z-scored spreads under a portfolio risk overlay and reports \
                  performance and robustness diagnostics."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the panel for cointegrated pairs
    Select(SelectCmd),

    /// Run the full research pipeline
    Analyze(AnalyzeCmd),

    /// Sweep signal parameters on one pair
    Sweep(SweepCmd),
}

/// Input options shared by every command
#[derive(Parser, Debug, Clone, Default)]
pub struct InputArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON price panel (overrides [data].panel and STATARB_PANEL)
    #[arg(short, long, value_name = "FILE")]
    pub panel: Option<PathBuf>,
}

/// Screen for cointegrated pairs
#[derive(Parser, Debug)]
pub struct SelectCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Override significance level
    #[arg(long, value_name = "ALPHA")]
    pub significance: Option<f64>,

    /// Print the full p-value matrix
    #[arg(long)]
    pub matrix: bool,
}

/// Run the full pipeline
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Parameter sensitivity sweep
#[derive(Parser, Debug)]
pub struct SweepCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Pair to sweep (e.g., AAA/BBB)
    #[arg(long, value_name = "PAIR")]
    pub pair: String,

    /// Entry thresholds, comma separated
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub entry: Vec<f64>,

    /// Exit thresholds, comma separated
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub exit: Vec<f64>,

    /// Holding limits, comma separated (0 = no limit)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub max_hold: Vec<usize>,
}

impl SweepCmd {
    /// Split `--pair` into its two legs
    pub fn legs(&self) -> Result<(&str, &str)> {
        match self.pair.split_once('/') {
            Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a, b)),
            _ => bail!("Invalid pair '{}': expected ASSET_A/ASSET_B", self.pair),
        }
    }
}

/// Execute the CLI command
pub fn execute(app: CliApp) -> Result<()> {
    // Initialize logging based on flags
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Select(cmd) => select_command(cmd),
        Command::Analyze(cmd) => analyze_command(cmd),
        Command::Sweep(cmd) => sweep_command(cmd),
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Load config and resolve the panel source
fn load_inputs(input: &InputArgs) -> Result<(Config, JsonPanelSource)> {
    let config = load_or_default(input.config.as_ref()).context("Failed to load configuration")?;

    let path = match &input.panel {
        Some(path) => path.to_string_lossy().into_owned(),
        None => match config.data.panel_path() {
            Some(path) => path,
            None => bail!("No price panel given: pass --panel, set [data].panel or STATARB_PANEL"),
        },
    };

    let source = JsonPanelSource::new(&path)
        .with_window(config.backtest.start_date, config.backtest.end_date);
    Ok((config, source))
}

/// Handle select command
fn select_command(cmd: SelectCmd) -> Result<()> {
    let (config, source) = load_inputs(&cmd.input)?;
    let panel = source
        .load_panel()
        .with_context(|| format!("Failed to load {}", source.describe()))?;

    let mut selection = config.selection.clone();
    if let Some(alpha) = cmd.significance {
        selection = selection.with_significance(alpha);
        selection.validate()?;
    }

    tracing::info!(
        "Screening {} assets over {} rows",
        panel.n_assets(),
        panel.len()
    );
    let result = PairSelector::new(selection)
        .find_cointegrated_pairs(&panel)
        .context("Pair selection failed")?;

    if result.pairs.is_empty() {
        println!("No cointegrated pairs found");
    }
    for pair in &result.pairs {
        println!("{}", pair);
    }

    if cmd.matrix {
        println!();
        println!("{:>10} {}", "", panel.assets().join(" "));
        for (asset, row) in panel.assets().iter().zip(result.p_values.rows()) {
            let cells: Vec<String> = row.iter().map(|p| format!("{:.4}", p)).collect();
            println!("{:>10} {}", asset, cells.join(" "));
        }
    }

    Ok(())
}

/// Handle analyze command
fn analyze_command(cmd: AnalyzeCmd) -> Result<()> {
    let (config, source) = load_inputs(&cmd.input)?;
    let pipeline = ResearchPipeline::new(config);

    let report = pipeline.run_source(&source).context("Research run failed")?;
    tracing::info!(
        "{} tradable pairs, sharpe {:.3}, halted: {}",
        report.tradable_pairs().count(),
        report.performance.sharpe,
        report.risk.halted
    );

    let json = serde_json::to_string_pretty(&report)?;
    match cmd.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Handle sweep command
fn sweep_command(cmd: SweepCmd) -> Result<()> {
    let (asset_a, asset_b) = cmd.legs()?;
    let (config, source) = load_inputs(&cmd.input)?;
    let panel = source
        .load_panel()
        .with_context(|| format!("Failed to load {}", source.describe()))?;

    let s1 = panel.column(asset_a)?;
    let s2 = panel.column(asset_b)?;
    let spread = construct_spread(s1, s2).with_context(|| format!("Spread for {}", cmd.pair))?;

    let validation = &config.validation;
    let entry = if cmd.entry.is_empty() {
        validation.entry_range.clone()
    } else {
        cmd.entry.clone()
    };
    let exit = if cmd.exit.is_empty() {
        validation.exit_range.clone()
    } else {
        cmd.exit.clone()
    };
    let max_hold: Vec<Option<usize>> = if cmd.max_hold.is_empty() {
        validation.max_hold_options()
    } else {
        cmd.max_hold.iter().map(|&h| max_hold_option(h)).collect()
    };

    let rows = parameter_sweep(&spread.zscore, &entry, &exit, &max_hold, s1)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);

    if let Some(best) = best_row(&rows) {
        eprintln!(
            "Best: entry={} exit={} max_hold={:?} pnl={:.4}",
            best.entry, best.exit, best.max_hold, best.final_pnl
        );
    }

    Ok(())
}
