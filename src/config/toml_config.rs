use crate::adapters::llm::DEFAULT_API_BASE_URL;
use crate::config::{
    validate_provider, DEFAULT_COLLECTION, DEFAULT_FALLBACK_MODEL, DEFAULT_OUTPUT_PATH,
    DEFAULT_PORTFOLIO_PATH, DEFAULT_PRIMARY_MODEL, DEFAULT_VECTORSTORE_PATH,
};
use crate::core::matcher::DEFAULT_NEIGHBORS_PER_SKILL;
use crate::domain::model::{ModelPair, SenderProfile};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{OutreachError, Result};
use crate::utils::validation::{validate_required_field, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    pub profile: SenderProfile,
    #[serde(default)]
    pub output: OutputConfig,
    pub job: Option<JobConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub api_key: String,
    #[serde(default = "default_primary_model")]
    pub primary: String,
    #[serde(default = "default_fallback_model")]
    pub fallback: String,
    #[serde(default)]
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default = "default_portfolio_path")]
    pub csv_path: String,
    #[serde(default = "default_vectorstore_path")]
    pub vectorstore_path: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_neighbors")]
    pub neighbors_per_skill: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub save_email: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub url: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_string()
}

fn default_fallback_model() -> String {
    DEFAULT_FALLBACK_MODEL.to_string()
}

fn default_portfolio_path() -> String {
    DEFAULT_PORTFOLIO_PATH.to_string()
}

fn default_vectorstore_path() -> String {
    DEFAULT_VECTORSTORE_PATH.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_neighbors() -> usize {
    DEFAULT_NEIGHBORS_PER_SKILL
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            csv_path: default_portfolio_path(),
            vectorstore_path: default_vectorstore_path(),
            collection: default_collection(),
            neighbors_per_skill: default_neighbors(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            save_email: true,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(OutreachError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| OutreachError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GROQ_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 設定檔中的職缺網址（可由命令列覆寫）
    pub fn job_url(&self) -> Option<&str> {
        self.job.as_ref().map(|job| job.url.as_str())
    }

    /// 命令列網址優先；兩者皆無時回報缺少 `[job].url`
    pub fn resolve_job_url(&self, override_url: Option<&str>) -> Result<String> {
        let (field, url) = match override_url {
            Some(url) => ("url", url),
            None => (
                "job.url",
                validate_required_field("job.url", &self.job)?.url.as_str(),
            ),
        };
        validate_url(field, url)?;
        Ok(url.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.model.api_key.contains("${") {
            return Err(OutreachError::MissingConfigError {
                field: format!("model.api_key ({})", self.model.api_key),
            });
        }
        if let Some(url) = self.job_url() {
            validate_url("job.url", url)?;
        }
        validate_provider(self)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base_url(&self) -> &str {
        &self.model.api_base_url
    }

    fn api_key(&self) -> &str {
        &self.model.api_key
    }

    fn models(&self) -> ModelPair {
        ModelPair::new(&self.model.primary, &self.model.fallback)
    }

    fn temperature(&self) -> f32 {
        self.model.temperature
    }

    fn request_timeout_secs(&self) -> Option<u64> {
        self.model.timeout_seconds
    }

    fn portfolio_path(&self) -> &str {
        &self.portfolio.csv_path
    }

    fn vectorstore_path(&self) -> &str {
        &self.portfolio.vectorstore_path
    }

    fn collection_name(&self) -> &str {
        &self.portfolio.collection
    }

    fn neighbors_per_skill(&self) -> usize {
        self.portfolio.neighbors_per_skill
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn save_email(&self) -> bool {
        self.output.save_email
    }

    fn profile(&self) -> SenderProfile {
        self.profile.clone()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[model]
api_key = "gsk_literal"

[profile]
name = "Ada Lovelace"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.api_base_url(), "https://api.groq.com/openai/v1");
        assert_eq!(config.models().primary, "llama-3.3-70b-versatile");
        assert_eq!(config.models().fallback, "llama-3.1-8b-instant");
        assert_eq!(config.temperature(), 0.0);
        assert_eq!(config.portfolio_path(), "my_portfolio.csv");
        assert_eq!(config.vectorstore_path(), "vectorstore");
        assert_eq!(config.collection_name(), "portfolio");
        assert_eq!(config.neighbors_per_skill(), 2);
        assert_eq!(config.output_path(), "./output");
        assert!(config.save_email());
        assert!(config.job_url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_job_url_requires_a_source() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        match config.resolve_job_url(None) {
            Err(OutreachError::MissingConfigError { field }) => assert_eq!(field, "job.url"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(
            config.resolve_job_url(Some("https://jobs.example.com/a")).unwrap(),
            "https://jobs.example.com/a"
        );
        assert!(config.resolve_job_url(Some("not a url")).is_err());
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[model]
api_base_url = "http://localhost:8080/v1"
api_key = "gsk_literal"
primary = "big-model"
fallback = "small-model"
temperature = 0.2
timeout_seconds = 30

[portfolio]
csv_path = "data/portfolio.csv"
vectorstore_path = "data/index"
collection = "projects"
neighbors_per_skill = 3

[profile]
name = "Ada Lovelace"
headline = "Backend engineer"
highlights = ["Shipped a payments platform"]
github = "https://github.com/ada"

[output]
path = "mail"
save_email = false

[job]
url = "https://jobs.example.com/backend"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.models(), ModelPair::new("big-model", "small-model"));
        assert_eq!(config.request_timeout_secs(), Some(30));
        assert_eq!(config.neighbors_per_skill(), 3);
        assert_eq!(config.profile().highlights, vec!["Shipped a payments platform"]);
        assert!(config.profile().linkedin.is_none());
        assert!(!config.save_email());
        assert_eq!(config.job_url(), Some("https://jobs.example.com/backend"));
        assert_eq!(
            config.resolve_job_url(None).unwrap(),
            "https://jobs.example.com/backend"
        );
        assert_eq!(
            config.resolve_job_url(Some("https://other.example.com/ml")).unwrap(),
            "https://other.example.com/ml"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("COLDMAIL_TEST_API_KEY", "gsk_from_env");
        let toml_content = r#"
[model]
api_key = "${COLDMAIL_TEST_API_KEY}"

[profile]
name = "Ada"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), "gsk_from_env");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = r#"
[model]
api_key = "${COLDMAIL_TEST_UNSET_VARIABLE}"

[profile]
name = "Ada"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), "${COLDMAIL_TEST_UNSET_VARIABLE}");
        assert!(matches!(
            config.validate(),
            Err(OutreachError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let bad_k = MINIMAL.to_string() + "\n[portfolio]\nneighbors_per_skill = 0\n";
        let config = TomlConfig::from_toml_str(&bad_k).unwrap();
        assert!(config.validate().is_err());

        let bad_url = MINIMAL.to_string() + "\n[job]\nurl = \"ftp://example.com\"\n";
        let config = TomlConfig::from_toml_str(&bad_url).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_profile_is_parse_error() {
        let result = TomlConfig::from_toml_str("[model]\napi_key = \"k\"\n");
        assert!(matches!(
            result,
            Err(OutreachError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.profile().name, "Ada Lovelace");
    }
}
