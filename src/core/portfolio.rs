use crate::domain::model::PopulationReport;
use crate::domain::ports::{PortfolioSource, VectorIndex};
use crate::utils::error::Result;
use uuid::Uuid;

/// Populates the index from the portfolio source only when the index is empty.
pub async fn ensure_populated<V, S>(index: &V, source: &S) -> Result<PopulationReport>
where
    V: VectorIndex + ?Sized,
    S: PortfolioSource + ?Sized,
{
    let existing = index.count().await?;
    if existing > 0 {
        tracing::info!(
            "📚 Portfolio index already holds {} entries, skipping population",
            existing
        );
        return Ok(PopulationReport::Skipped { existing });
    }

    let entries = source.load().await?;
    if entries.is_empty() {
        tracing::warn!("📭 Portfolio source is empty, nothing to index");
        return Ok(PopulationReport::Populated { added: 0 });
    }

    // 單次批次寫入：失敗時索引維持空的，下次執行會重新建立
    let added = entries.len();
    let batch = entries
        .into_iter()
        .map(|entry| (Uuid::new_v4().to_string(), entry))
        .collect();
    index.add_all(batch).await?;

    tracing::info!("📚 Indexed {} portfolio entries", added);
    Ok(PopulationReport::Populated { added })
}
