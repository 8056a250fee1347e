use crate::domain::model::{
    ExtractionOutcome, FallbackEvent, Invocation, OutreachReport, RunOutcome, Stage,
};
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use chrono::Utc;

pub struct OutreachEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> OutreachEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 單次、線性執行；任何錯誤都會中止本次執行，不產生部分結果
    pub async fn run(&self, url: &str) -> Result<RunOutcome> {
        tracing::info!("🚀 Starting cold email run for {}", url);
        let mut fallbacks = Vec::new();

        self.pipeline.prepare().await?;

        tracing::info!("🔍 Fetching job page...");
        let page_text = self.pipeline.fetch(url).await?;
        tracing::info!("📄 Fetched {} characters of page text", page_text.len());

        tracing::info!("🧠 Extracting job details...");
        let extraction = self.pipeline.extract(&page_text).await?;
        record_fallback(&mut fallbacks, Stage::Extraction, &extraction);

        let job = match extraction.value {
            ExtractionOutcome::NoPostings { dropped } => {
                tracing::warn!("📭 No job postings found on {}", url);
                return Ok(RunOutcome::NoPostings {
                    url: url.to_string(),
                    dropped,
                });
            }
            ExtractionOutcome::Found {
                job, remaining, ..
            } => {
                if remaining > 0 {
                    tracing::info!(
                        "📌 Using the first posting '{}', ignoring {} more",
                        job.role,
                        remaining
                    );
                }
                job
            }
        };

        tracing::info!("📊 Matching skills against the portfolio...");
        let matches = self.pipeline.match_portfolio(&job).await?;

        tracing::info!("📧 Generating the email...");
        let email = self.pipeline.compose(&job, &matches).await?;
        record_fallback(&mut fallbacks, Stage::Composition, &email);

        let mut report = OutreachReport {
            url: url.to_string(),
            job,
            matches,
            email: email.value,
            fallbacks,
            generated_at: Utc::now(),
            output_path: None,
        };

        report.output_path = self.pipeline.load(&report).await?;
        if let Some(path) = &report.output_path {
            tracing::info!("💾 Email saved to: {}", path);
        }

        Ok(RunOutcome::Completed(report))
    }
}

fn record_fallback<T>(events: &mut Vec<FallbackEvent>, stage: Stage, invocation: &Invocation<T>) {
    if let Some(primary) = &invocation.fell_back_from {
        events.push(FallbackEvent {
            stage,
            primary: primary.clone(),
            fallback: invocation.model.clone(),
        });
    }
}
