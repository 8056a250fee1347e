use crate::domain::model::{
    ExtractionOutcome, Invocation, JobPosting, MatchResult, ModelPair, OutreachReport,
    PopulationReport, PortfolioEntry, QueryResponse, SenderProfile,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn api_key(&self) -> &str;
    fn models(&self) -> ModelPair;
    fn temperature(&self) -> f32;
    fn request_timeout_secs(&self) -> Option<u64>;
    fn portfolio_path(&self) -> &str;
    fn vectorstore_path(&self) -> &str;
    fn collection_name(&self) -> &str;
    fn neighbors_per_skill(&self) -> usize;
    fn output_path(&self) -> &str;
    fn save_email(&self) -> bool;
    fn profile(&self) -> SenderProfile;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Raw text completion. A throttled call must fail with `OutreachError::RateLimitedError`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn count(&self) -> Result<usize>;
    async fn add(&self, entry: PortfolioEntry, id: String) -> Result<()>;
    /// All-or-nothing: on failure no entry of the batch is stored or counted.
    async fn add_all(&self, entries: Vec<(String, PortfolioEntry)>) -> Result<()>;
    async fn query(&self, texts: &[String], k: usize) -> Result<QueryResponse>;
}

#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn load(&self) -> Result<Vec<PortfolioEntry>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn prepare(&self) -> Result<PopulationReport>;
    async fn fetch(&self, url: &str) -> Result<String>;
    async fn extract(&self, page_text: &str) -> Result<Invocation<ExtractionOutcome>>;
    async fn match_portfolio(&self, job: &JobPosting) -> Result<MatchResult>;
    async fn compose(&self, job: &JobPosting, matches: &MatchResult)
        -> Result<Invocation<String>>;
    async fn load(&self, report: &OutreachReport) -> Result<Option<String>>;
}
