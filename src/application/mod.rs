//! Application Layer - Research use cases
//!
//! Composes the domain and strategy layers into the batch research run.

pub mod pipeline;

pub use pipeline::{PairReport, PipelineError, ResearchPipeline, ResearchReport};
