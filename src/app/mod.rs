// Application layer: prompt texts, pipeline wiring and terminal presentation.

pub mod console;
pub mod factory;
pub mod pipelines;
pub mod prompts;

pub use factory::{build_pipeline, open_portfolio_index, DefaultPipeline};
