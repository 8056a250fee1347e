use crate::app::prompts::EXTRACT_JOBS_PROMPT;
use crate::core::invoker::ResilientInvoker;
use crate::core::prompt::{PromptFields, PromptTemplate};
use crate::domain::model::{ExtractionOutcome, Invocation, JobPosting};
use crate::domain::ports::TextGenerator;
use crate::utils::error::{OutreachError, Result};
use crate::utils::validation::Validate;
use serde_json::Value;
use std::sync::Arc;

/// Postings that passed validation, in their original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedPostings {
    pub postings: Vec<JobPosting>,
    pub dropped: usize,
}

impl ValidatedPostings {
    /// 選擇策略：第一筆有效職缺即為當前職缺，不做排序
    pub fn first(&self) -> Option<&JobPosting> {
        self.postings.first()
    }

    pub fn into_outcome(self) -> ExtractionOutcome {
        match self.first() {
            Some(job) => ExtractionOutcome::Found {
                job: job.clone(),
                remaining: self.postings.len() - 1,
                dropped: self.dropped,
            },
            None => ExtractionOutcome::NoPostings {
                dropped: self.dropped,
            },
        }
    }
}

/// Parses raw model output. Anything but a bare JSON array is a contract violation.
pub fn parse_postings(raw: &str) -> Result<Vec<Value>> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| OutreachError::ExtractionParseError {
            reason: format!("model output is not valid JSON: {}", e),
        })?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(OutreachError::ExtractionParseError {
            reason: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
    }
}

/// 逐筆驗證；不合格的紀錄丟棄，不影響整批
pub fn validate_postings(items: Vec<Value>) -> ValidatedPostings {
    let mut validated = ValidatedPostings::default();

    for (index, item) in items.into_iter().enumerate() {
        match validate_posting(item) {
            Ok(posting) => validated.postings.push(posting),
            Err(reason) => {
                tracing::warn!("🗑️ Dropping job posting #{}: {}", index, reason);
                validated.dropped += 1;
            }
        }
    }

    validated
}

fn validate_posting(item: Value) -> std::result::Result<JobPosting, String> {
    if !item.is_object() {
        return Err(format!("expected an object, got {}", json_kind(&item)));
    }

    let posting: JobPosting = serde_json::from_value(item).map_err(|e| e.to_string())?;
    posting.validate().map_err(|e| e.to_string())?;
    Ok(posting)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub struct JobExtractor<G: TextGenerator> {
    invoker: Arc<ResilientInvoker<G>>,
    template: PromptTemplate,
}

impl<G: TextGenerator> JobExtractor<G> {
    pub fn new(invoker: Arc<ResilientInvoker<G>>) -> Self {
        Self {
            invoker,
            template: EXTRACT_JOBS_PROMPT,
        }
    }

    pub fn invoker(&self) -> &ResilientInvoker<G> {
        &self.invoker
    }

    pub async fn extract(&self, page_text: &str) -> Result<Invocation<ExtractionOutcome>> {
        let fields = PromptFields::from([("page_data", page_text.to_string())]);
        let invocation = self.invoker.invoke(&self.template, &fields).await?;

        tracing::debug!("Extraction response: {} characters", invocation.value.len());

        let items = parse_postings(&invocation.value)?;
        let total = items.len();
        let validated = validate_postings(items);

        tracing::info!(
            "📋 Model returned {} postings, {} valid",
            total,
            validated.postings.len()
        );

        Ok(invocation.map(|_| validated.into_outcome()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoker::tests::{rate_limited, ScriptedGenerator};
    use crate::domain::model::ModelPair;

    const BACKEND_JOB: &str = r#"{
        "role": "Backend Engineer",
        "experience": "2 years",
        "skills": ["Go", "SQL"],
        "location": "Remote",
        "description": "Build and run payment services"
    }"#;

    fn backend_job() -> JobPosting {
        JobPosting {
            role: "Backend Engineer".to_string(),
            experience: "2 years".to_string(),
            skills: vec!["Go".to_string(), "SQL".to_string()],
            location: "Remote".to_string(),
            description: "Build and run payment services".to_string(),
        }
    }

    fn extractor(script: Vec<Result<String>>) -> JobExtractor<ScriptedGenerator> {
        let invoker = ResilientInvoker::new(
            ScriptedGenerator::new(script),
            ModelPair::new("big", "small"),
        );
        JobExtractor::new(Arc::new(invoker))
    }

    #[tokio::test]
    async fn test_returns_first_valid_posting_unchanged() {
        let response = format!(
            r#"[{}, {{"role": "Data Engineer", "experience": "5 years", "skills": ["Spark"], "location": "Berlin", "description": "Pipelines"}}]"#,
            BACKEND_JOB
        );
        let extractor = extractor(vec![Ok(response)]);

        let result = extractor.extract("careers page").await.unwrap();

        assert_eq!(
            result.value,
            ExtractionOutcome::Found {
                job: backend_job(),
                remaining: 1,
                dropped: 0
            }
        );
        assert_eq!(result.model, "big");
    }

    #[tokio::test]
    async fn test_prompt_contains_page_text() {
        let extractor = extractor(vec![Ok("[]".to_string())]);
        extractor.extract("We are hiring a {Rust} engineer").await.unwrap();

        let calls = extractor.invoker_generator_calls();
        assert!(calls[0].contains("### SCRAPED TEXT FROM WEBSITE:\nWe are hiring a {Rust} engineer"));
    }

    #[tokio::test]
    async fn test_empty_array_is_no_postings() {
        let extractor = extractor(vec![Ok("  []\n".to_string())]);
        let result = extractor.extract("nothing here").await.unwrap();
        assert_eq!(result.value, ExtractionOutcome::NoPostings { dropped: 0 });
    }

    #[tokio::test]
    async fn test_all_invalid_records_is_no_postings() {
        let response = r#"[
            {"role": "Missing skills", "experience": "1", "location": "x", "description": "y"},
            {"role": "Empty skills", "experience": "1", "skills": [], "location": "x", "description": "y"},
            {"role": null, "experience": "1", "skills": ["Go"], "location": "x", "description": "y"},
            "not an object"
        ]"#;
        let extractor = extractor(vec![Ok(response.to_string())]);

        let result = extractor.extract("page").await.unwrap();

        assert_eq!(result.value, ExtractionOutcome::NoPostings { dropped: 4 });
    }

    #[tokio::test]
    async fn test_invalid_records_are_skipped_before_selection() {
        let response = format!(
            r#"[{{"role": "Broken", "skills": "Go"}}, {}]"#,
            BACKEND_JOB
        );
        let extractor = extractor(vec![Ok(response)]);

        let result = extractor.extract("page").await.unwrap();

        assert_eq!(
            result.value,
            ExtractionOutcome::Found {
                job: backend_job(),
                remaining: 0,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_preamble_is_contract_violation() {
        let response = format!("Here is the JSON: [{}]", BACKEND_JOB);
        let extractor = extractor(vec![Ok(response)]);

        let err = extractor.extract("page").await.unwrap_err();
        assert!(matches!(err, OutreachError::ExtractionParseError { .. }));
    }

    #[tokio::test]
    async fn test_markdown_fence_is_contract_violation() {
        let response = format!("```json\n[{}]\n```", BACKEND_JOB);
        let extractor = extractor(vec![Ok(response)]);

        let err = extractor.extract("page").await.unwrap_err();
        assert!(matches!(err, OutreachError::ExtractionParseError { .. }));
    }

    #[tokio::test]
    async fn test_non_array_json_is_contract_violation() {
        let extractor = extractor(vec![Ok(BACKEND_JOB.to_string())]);

        let err = extractor.extract("page").await.unwrap_err();
        match err {
            OutreachError::ExtractionParseError { reason } => {
                assert_eq!(reason, "expected a JSON array, got an object")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_extraction_recovers_from_rate_limit() {
        let response = format!("[{}]", BACKEND_JOB);
        let extractor = extractor(vec![Err(rate_limited("big")), Ok(response)]);

        let result = extractor.extract("page").await.unwrap();

        assert_eq!(result.model, "small");
        assert_eq!(result.fell_back_from.as_deref(), Some("big"));
        assert!(matches!(result.value, ExtractionOutcome::Found { .. }));
    }

    #[test]
    fn test_validate_then_select_are_independent() {
        let items = parse_postings(&format!(r#"[{{"role": 7}}, {}]"#, BACKEND_JOB)).unwrap();
        let validated = validate_postings(items);

        assert_eq!(validated.dropped, 1);
        assert_eq!(validated.postings.len(), 1);
        assert_eq!(validated.first(), Some(&backend_job()));
    }

    #[test]
    fn test_outcome_takes_the_first_valid_posting() {
        let second = BACKEND_JOB.replace("Backend Engineer", "Data Engineer");
        let items =
            parse_postings(&format!(r#"[{}, {{"skills": []}}, {}]"#, BACKEND_JOB, second)).unwrap();
        let validated = validate_postings(items);
        let selected = validated.first().cloned();

        match validated.into_outcome() {
            ExtractionOutcome::Found {
                job,
                remaining,
                dropped,
            } => {
                assert_eq!(Some(job), selected);
                assert_eq!(remaining, 1);
                assert_eq!(dropped, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            ValidatedPostings::default().into_outcome(),
            ExtractionOutcome::NoPostings { dropped: 0 }
        );
    }

    impl JobExtractor<ScriptedGenerator> {
        fn invoker_generator_calls(&self) -> Vec<String> {
            self.invoker
                .generator()
                .calls
                .lock()
                .unwrap()
                .iter()
                .map(|(prompt, _)| prompt.clone())
                .collect()
        }
    }
}
