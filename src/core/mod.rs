pub mod composer;
pub mod engine;
pub mod extractor;
pub mod invoker;
pub mod matcher;
pub mod portfolio;
pub mod prompt;

pub use crate::domain::model::{JobPosting, MatchResult, PortfolioEntry};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
