pub mod cli;
pub mod toml_config;

use crate::adapters::llm::DEFAULT_API_BASE_URL;
use crate::domain::model::{ModelPair, SenderProfile};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_FALLBACK_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_PORTFOLIO_PATH: &str = "my_portfolio.csv";
pub const DEFAULT_VECTORSTORE_PATH: &str = "vectorstore";
pub const DEFAULT_COLLECTION: &str = "portfolio";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const MAX_NEIGHBORS_PER_SKILL: usize = 10;

/// 兩種配置共用的驗證規則
pub(crate) fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validation::validate_url("api_base_url", config.api_base_url())?;
    validation::validate_non_empty_string("api_key", config.api_key())?;

    let models = config.models();
    validation::validate_non_empty_string("primary_model", &models.primary)?;
    validation::validate_non_empty_string("fallback_model", &models.fallback)?;

    validation::validate_range("temperature", config.temperature(), 0.0, 2.0)?;
    if let Some(secs) = config.request_timeout_secs() {
        validation::validate_positive_number("request_timeout_secs", secs as usize, 1)?;
    }

    validation::validate_path("portfolio_path", config.portfolio_path())?;
    validation::validate_file_extensions(
        "portfolio_path",
        &[config.portfolio_path().to_string()],
        &["csv"],
    )?;
    validation::validate_path("vectorstore_path", config.vectorstore_path())?;
    validation::validate_non_empty_string("collection_name", config.collection_name())?;
    validation::validate_range(
        "neighbors_per_skill",
        config.neighbors_per_skill(),
        1,
        MAX_NEIGHBORS_PER_SKILL,
    )?;
    validation::validate_path("output_path", config.output_path())?;
    validation::validate_non_empty_string("sender_name", &config.profile().name)?;

    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "coldmail")]
#[command(about = "Generate a cold email for a job posting, backed by your portfolio")]
pub struct CliConfig {
    /// Careers page URL to scrape
    pub job_url: String,

    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: String,

    #[arg(long, default_value = DEFAULT_PRIMARY_MODEL)]
    pub primary_model: String,

    #[arg(long, default_value = DEFAULT_FALLBACK_MODEL)]
    pub fallback_model: String,

    #[arg(long, default_value = "0.0")]
    pub temperature: f32,

    #[arg(long, help = "Per-request timeout in seconds (no timeout when unset)")]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value = DEFAULT_PORTFOLIO_PATH)]
    pub portfolio: String,

    #[arg(long, default_value = DEFAULT_VECTORSTORE_PATH)]
    pub vectorstore: String,

    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(short = 'k', long, default_value = "2", help = "Portfolio neighbors per skill")]
    pub neighbors: usize,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    #[arg(long, help = "Do not write the email to the output directory")]
    pub no_save: bool,

    #[arg(long, env = "COLDMAIL_SENDER_NAME", default_value = "Applicant")]
    pub sender_name: String,

    #[arg(long)]
    pub sender_headline: Option<String>,

    #[arg(long = "sender-highlight", help = "Repeatable line for the about-me block")]
    pub sender_highlights: Vec<String>,

    #[arg(long)]
    pub sender_github: Option<String>,

    #[arg(long)]
    pub sender_linkedin: Option<String>,

    #[arg(long, help = "Print the run report as JSON")]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn models(&self) -> ModelPair {
        ModelPair::new(&self.primary_model, &self.fallback_model)
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn request_timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    fn portfolio_path(&self) -> &str {
        &self.portfolio
    }

    fn vectorstore_path(&self) -> &str {
        &self.vectorstore
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn neighbors_per_skill(&self) -> usize {
        self.neighbors
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn save_email(&self) -> bool {
        !self.no_save
    }

    fn profile(&self) -> SenderProfile {
        SenderProfile {
            name: self.sender_name.clone(),
            headline: self.sender_headline.clone(),
            highlights: self.sender_highlights.clone(),
            github: self.sender_github.clone(),
            linkedin: self.sender_linkedin.clone(),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("job_url", &self.job_url)?;
        validate_provider(self)
    }
}
