use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutreachError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Failed to fetch page {url}: {reason}")]
    PageFetchError { url: String, reason: String },

    #[error("Model '{model}' is rate limited: {message}")]
    RateLimitedError { model: String, message: String },

    #[error("Model '{model}' request failed{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    GenerationError {
        model: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Could not extract job data: {reason}")]
    ExtractionParseError { reason: String },

    #[error("Prompt template references unbound field '{field}'")]
    PromptError { field: String },

    #[error("Vector index error: {message}")]
    VectorIndexError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, OutreachError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Model,
    Extraction,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 可重試
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl OutreachError {
    /// 僅限流錯誤會觸發備援模型
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, OutreachError::RateLimitedError { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            OutreachError::ConfigError { .. }
            | OutreachError::MissingConfigError { .. }
            | OutreachError::InvalidConfigValueError { .. }
            | OutreachError::ConfigValidationError { .. }
            | OutreachError::PromptError { .. } => ErrorCategory::Configuration,
            OutreachError::HttpError(_) | OutreachError::PageFetchError { .. } => {
                ErrorCategory::Network
            }
            OutreachError::RateLimitedError { .. } | OutreachError::GenerationError { .. } => {
                ErrorCategory::Model
            }
            OutreachError::ExtractionParseError { .. } => ErrorCategory::Extraction,
            OutreachError::IoError(_) | OutreachError::VectorIndexError { .. } => {
                ErrorCategory::Storage
            }
            OutreachError::CsvError(_)
            | OutreachError::SerializationError(_)
            | OutreachError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OutreachError::RateLimitedError { .. } => ErrorSeverity::Medium,
            OutreachError::HttpError(_)
            | OutreachError::PageFetchError { .. }
            | OutreachError::GenerationError { .. }
            | OutreachError::ExtractionParseError { .. }
            | OutreachError::CsvError(_)
            | OutreachError::SerializationError(_)
            | OutreachError::ValidationError { .. } => ErrorSeverity::High,
            OutreachError::ConfigError { .. }
            | OutreachError::MissingConfigError { .. }
            | OutreachError::InvalidConfigValueError { .. }
            | OutreachError::ConfigValidationError { .. }
            | OutreachError::PromptError { .. }
            | OutreachError::IoError(_)
            | OutreachError::VectorIndexError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            OutreachError::HttpError(_) => {
                "Check your network connection and the service endpoints".to_string()
            }
            OutreachError::PageFetchError { .. } => {
                "Verify the job posting URL is reachable and returns readable content".to_string()
            }
            OutreachError::RateLimitedError { .. } => {
                "Both models are throttled; wait a moment and run again".to_string()
            }
            OutreachError::GenerationError { status: Some(401), .. } => {
                "Check that GROQ_API_KEY is set to a valid key".to_string()
            }
            OutreachError::GenerationError { .. } => {
                "Check the model identifiers and the API base URL".to_string()
            }
            OutreachError::ExtractionParseError { .. } => {
                "The model did not return a clean JSON array; try again or switch models"
                    .to_string()
            }
            OutreachError::CsvError(_) => {
                "Make sure the portfolio CSV has 'Techstack' and 'Links' columns".to_string()
            }
            OutreachError::VectorIndexError { .. } => {
                "Delete the vector store directory to rebuild the portfolio index".to_string()
            }
            OutreachError::IoError(_) => "Check file paths and permissions".to_string(),
            OutreachError::ConfigError { .. }
            | OutreachError::MissingConfigError { .. }
            | OutreachError::InvalidConfigValueError { .. }
            | OutreachError::ConfigValidationError { .. } => {
                "Review the configuration values and try again".to_string()
            }
            OutreachError::PromptError { .. } => {
                "A prompt template is missing a field binding".to_string()
            }
            OutreachError::SerializationError(_) | OutreachError::ValidationError { .. } => {
                "Inspect the input data for unexpected values".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            OutreachError::PageFetchError { url, .. } => {
                format!("Could not load the job page at {}", url)
            }
            OutreachError::RateLimitedError { model, .. } => {
                format!("The language model is rate limited (last tried '{}')", model)
            }
            OutreachError::GenerationError { model, .. } => {
                format!("The language model '{}' failed to respond", model)
            }
            OutreachError::ExtractionParseError { .. } => {
                "Could not extract job data from the page".to_string()
            }
            OutreachError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            OutreachError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}
