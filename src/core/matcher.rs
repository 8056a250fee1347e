use crate::domain::model::{MatchResult, QueryResponse};
use crate::domain::ports::VectorIndex;
use crate::utils::error::Result;
use std::sync::Arc;

pub const DEFAULT_NEIGHBORS_PER_SKILL: usize = 2;

/// The single normalization from an index response to a `MatchResult`.
///
/// Order is query order first, then neighbor rank (closest first). Nothing is
/// deduplicated: a stack that answers several skills appears once per skill.
pub fn flatten_neighbors(response: &QueryResponse) -> MatchResult {
    let mut result = MatchResult::default();

    for skill in &response.results {
        for neighbor in &skill.neighbors {
            result.tech_stacks.push(neighbor.document.clone());
            result.links.extend(neighbor.links.iter().cloned());
        }
    }

    result
}

pub struct PortfolioMatcher<V: VectorIndex> {
    index: Arc<V>,
    neighbors_per_skill: usize,
}

impl<V: VectorIndex> PortfolioMatcher<V> {
    pub fn new(index: Arc<V>) -> Self {
        Self {
            index,
            neighbors_per_skill: DEFAULT_NEIGHBORS_PER_SKILL,
        }
    }

    pub fn with_neighbors_per_skill(mut self, k: usize) -> Self {
        self.neighbors_per_skill = k.max(1);
        self
    }

    pub fn neighbors_per_skill(&self) -> usize {
        self.neighbors_per_skill
    }

    /// 一次批次查詢所有技能，不設相似度門檻
    pub async fn match_skills(&self, skills: &[String]) -> Result<MatchResult> {
        if skills.is_empty() {
            return Ok(MatchResult::default());
        }

        tracing::debug!(
            "Querying portfolio index for {} skills (k={})",
            skills.len(),
            self.neighbors_per_skill
        );
        let response = self.index.query(skills, self.neighbors_per_skill).await?;
        let result = flatten_neighbors(&response);

        tracing::info!(
            "🔗 Matched {} portfolio entries and {} links",
            result.tech_stacks.len(),
            result.links.len()
        );
        Ok(result)
    }
}
