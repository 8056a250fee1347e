use crate::core::composer::EmailComposer;
use crate::core::extractor::JobExtractor;
use crate::core::invoker::ResilientInvoker;
use crate::core::matcher::PortfolioMatcher;
use crate::core::portfolio::ensure_populated;
use crate::domain::model::{
    ExtractionOutcome, Invocation, JobPosting, MatchResult, OutreachReport, PopulationReport,
    SenderProfile,
};
use crate::domain::ports::{
    PageFetcher, Pipeline, PortfolioSource, Storage, TextGenerator, VectorIndex,
};
use crate::utils::error::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// 郵件輸出目的地：`Storage` 負責寫入，`dir` 只用於回報路徑
pub struct EmailSink<S: Storage> {
    pub storage: S,
    pub dir: PathBuf,
}

impl<S: Storage> EmailSink<S> {
    pub fn new(storage: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            dir: dir.into(),
        }
    }
}

pub struct OutreachPipeline<F, G, V, P, S>
where
    F: PageFetcher,
    G: TextGenerator,
    V: VectorIndex,
    P: PortfolioSource,
    S: Storage,
{
    fetcher: F,
    extractor: JobExtractor<G>,
    matcher: PortfolioMatcher<V>,
    composer: EmailComposer<G>,
    index: Arc<V>,
    source: P,
    sink: EmailSink<S>,
    save_email: bool,
}

impl<F, G, V, P, S> OutreachPipeline<F, G, V, P, S>
where
    F: PageFetcher,
    G: TextGenerator,
    V: VectorIndex,
    P: PortfolioSource,
    S: Storage,
{
    pub fn new(
        fetcher: F,
        invoker: ResilientInvoker<G>,
        index: Arc<V>,
        source: P,
        sink: EmailSink<S>,
        profile: SenderProfile,
    ) -> Self {
        let invoker = Arc::new(invoker);
        Self {
            fetcher,
            extractor: JobExtractor::new(invoker.clone()),
            matcher: PortfolioMatcher::new(index.clone()),
            composer: EmailComposer::new(invoker, profile),
            index,
            source,
            sink,
            save_email: true,
        }
    }

    pub fn with_neighbors_per_skill(mut self, k: usize) -> Self {
        self.matcher = PortfolioMatcher::new(self.index.clone()).with_neighbors_per_skill(k);
        self
    }

    pub fn with_save_email(mut self, save_email: bool) -> Self {
        self.save_email = save_email;
        self
    }

    pub fn index(&self) -> &V {
        &self.index
    }
}

/// `job_application_<Role>_<timestamp>.txt`，角色名稱中的空白換成底線並移除不安全字元
pub fn email_file_name(report: &OutreachReport) -> String {
    let role: String = report
        .job
        .role
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let role = role.trim_matches('.');
    let role = if role.is_empty() { "role" } else { role };

    format!(
        "job_application_{}_{}.txt",
        role,
        report.generated_at.format("%Y%m%d_%H%M%S")
    )
}

#[async_trait::async_trait]
impl<F, G, V, P, S> Pipeline for OutreachPipeline<F, G, V, P, S>
where
    F: PageFetcher,
    G: TextGenerator,
    V: VectorIndex,
    P: PortfolioSource,
    S: Storage,
{
    async fn prepare(&self) -> Result<PopulationReport> {
        ensure_populated(self.index.as_ref(), &self.source).await
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetcher.fetch(url).await
    }

    async fn extract(&self, page_text: &str) -> Result<Invocation<ExtractionOutcome>> {
        self.extractor.extract(page_text).await
    }

    async fn match_portfolio(&self, job: &JobPosting) -> Result<MatchResult> {
        self.matcher.match_skills(&job.skills).await
    }

    async fn compose(&self, job: &JobPosting, matches: &MatchResult) -> Result<Invocation<String>> {
        self.composer.compose(job, matches).await
    }

    async fn load(&self, report: &OutreachReport) -> Result<Option<String>> {
        if !self.save_email {
            tracing::debug!("Email saving disabled, skipping load stage");
            return Ok(None);
        }

        let file_name = email_file_name(report);
        self.sink
            .storage
            .write_file(&file_name, report.email.as_bytes())
            .await?;

        Ok(Some(self.sink.dir.join(file_name).display().to_string()))
    }
}
