use crate::domain::model::PortfolioEntry;
use crate::domain::ports::PortfolioSource;
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct PortfolioRow {
    #[serde(rename = "Techstack", alias = "TechStack", alias = "techstack", alias = "tech_stack")]
    tech_stack: String,
    #[serde(rename = "Links", alias = "links", default)]
    links: String,
}

/// 解析作品集 CSV（欄位 `Techstack`、`Links`）
pub fn parse_portfolio_csv<R: Read>(reader: R) -> Result<Vec<PortfolioEntry>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (line, row) in csv_reader.deserialize::<PortfolioRow>().enumerate() {
        let row = row?;
        if row.tech_stack.is_empty() {
            tracing::warn!("⚠️ Skipping portfolio row {} with an empty tech stack", line + 2);
            continue;
        }

        entries.push(PortfolioEntry {
            tech_stack: row.tech_stack,
            links: split_links(&row.links),
        });
    }

    Ok(entries)
}

fn split_links(cell: &str) -> Vec<String> {
    cell.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
        .filter(|link| !link.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct CsvPortfolioSource {
    path: PathBuf,
}

impl CsvPortfolioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl PortfolioSource for CsvPortfolioSource {
    async fn load(&self) -> Result<Vec<PortfolioEntry>> {
        tracing::debug!("Reading portfolio from {}", self.path.display());
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OutreachError::ConfigError {
                    message: format!("portfolio file not found: {}", self.path.display()),
                }
            } else {
                OutreachError::IoError(e)
            }
        })?;

        parse_portfolio_csv(data.as_slice())
    }
}
