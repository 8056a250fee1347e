use crate::utils::error::{OutreachError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 從頁面抽取出的職缺，驗證後不可變
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub role: String,
    pub experience: String,
    pub skills: Vec<String>,
    pub location: String,
    pub description: String,
}

impl JobPosting {
    pub fn skills_joined(&self) -> String {
        self.skills.join(", ")
    }
}

impl Validate for JobPosting {
    fn validate(&self) -> Result<()> {
        if self.skills.is_empty() {
            return Err(OutreachError::ValidationError {
                message: "skills must be a non-empty list".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub tech_stack: String,
    pub links: Vec<String>,
}

/// Flattened portfolio matches, skill-major then rank-major. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub tech_stacks: Vec<String>,
    pub links: Vec<String>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.tech_stacks.is_empty() && self.links.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub document: String,
    pub links: Vec<String>,
    pub distance: f32,
}

/// Neighbors for one query text, closest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNeighbors {
    pub query: String,
    pub neighbors: Vec<Neighbor>,
}

/// One entry per query text, in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<SkillNeighbors>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPair {
    pub primary: String,
    pub fallback: String,
}

impl ModelPair {
    pub fn new(primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }
}

/// 模型呼叫的結果，附帶實際使用的模型
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<T> {
    pub value: T,
    pub model: String,
    /// Set to the rate-limited primary model when the fallback produced `value`.
    pub fell_back_from: Option<String>,
}

impl<T> Invocation<T> {
    pub fn fell_back(&self) -> bool {
        self.fell_back_from.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Invocation<U> {
        Invocation {
            value: f(self.value),
            model: self.model,
            fell_back_from: self.fell_back_from,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Found {
        job: JobPosting,
        /// Valid postings after the active one; not processed.
        remaining: usize,
        dropped: usize,
    },
    NoPostings {
        dropped: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub name: String,
    pub headline: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

impl SenderProfile {
    /// 渲染成郵件提示中的 ABOUT ME 區塊
    pub fn render_block(&self) -> String {
        let mut lines = vec![format!("- Name: {}", self.name)];
        if let Some(headline) = &self.headline {
            lines.push(format!("- {}", headline));
        }
        for highlight in &self.highlights {
            lines.push(format!("- {}", highlight));
        }
        if let Some(github) = &self.github {
            lines.push(format!("- GitHub: {}", github));
        }
        if let Some(linkedin) = &self.linkedin {
            lines.push(format!("- LinkedIn: {}", linkedin));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Composition,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Composition => write!(f, "composition"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEvent {
    pub stage: Stage,
    pub primary: String,
    pub fallback: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutreachReport {
    pub url: String,
    pub job: JobPosting,
    pub matches: MatchResult,
    pub email: String,
    pub fallbacks: Vec<FallbackEvent>,
    pub generated_at: DateTime<Utc>,
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    NoPostings { url: String, dropped: usize },
    Completed(OutreachReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PopulationReport {
    Populated { added: usize },
    Skipped { existing: usize },
}
