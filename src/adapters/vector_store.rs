//! File-backed vector index for the portfolio.
//!
//! The collection is stored as `<collection>.json` through a [`Storage`]. Only ids,
//! documents and links are persisted; embeddings are recomputed when the index is
//! opened, so the file stays readable and embedder-independent.

use crate::domain::model::{Neighbor, PortfolioEntry, QueryResponse, SkillNeighbors};
use crate::domain::ports::{Storage, VectorIndex};
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::RwLock;

pub const DEFAULT_DIMENSIONS: usize = 384;

pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Signed feature hashing over word tokens and character trigrams, L2-normalized.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    const TOKEN_WEIGHT: f32 = 1.0;
    const TRIGRAM_WEIGHT: f32 = 0.3;

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];

        for token in tokenize(text) {
            self.accumulate(&mut vector, &token, Self::TOKEN_WEIGHT);

            let padded: Vec<char> = format!("^{}$", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut vector, &trigram, Self::TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

/// 小寫切詞；保留 `+` 與 `#`（C++、C#）
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedCollection {
    name: String,
    entries: Vec<PersistedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    id: String,
    document: String,
    #[serde(default)]
    links: Vec<String>,
}

struct IndexedEntry {
    entry: PersistedEntry,
    embedding: Vec<f32>,
}

pub struct LocalVectorIndex<S: Storage, E: Embedder = HashingEmbedder> {
    storage: S,
    embedder: E,
    name: String,
    entries: RwLock<Vec<IndexedEntry>>,
}

impl<S: Storage, E: Embedder> LocalVectorIndex<S, E> {
    /// Opens the named collection, starting empty when no file exists yet.
    pub async fn open(storage: S, name: impl Into<String>, embedder: E) -> Result<Self> {
        let name = name.into();
        let file_name = collection_file(&name);

        let persisted = match storage.read_file(&file_name).await {
            Ok(bytes) => serde_json::from_slice::<PersistedCollection>(&bytes).map_err(|e| {
                OutreachError::VectorIndexError {
                    message: format!("corrupt collection file {}: {}", file_name, e),
                }
            })?,
            Err(OutreachError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                PersistedCollection {
                    name: name.clone(),
                    entries: Vec::new(),
                }
            }
            Err(e) => return Err(e),
        };

        if persisted.name != name {
            return Err(OutreachError::VectorIndexError {
                message: format!(
                    "collection file {} belongs to '{}', expected '{}'",
                    file_name, persisted.name, name
                ),
            });
        }

        let entries = persisted
            .entries
            .into_iter()
            .map(|entry| IndexedEntry {
                embedding: embedder.embed(&entry.document),
                entry,
            })
            .collect::<Vec<_>>();

        tracing::debug!("Opened collection '{}' with {} entries", name, entries.len());

        Ok(Self {
            storage,
            embedder,
            name,
            entries: RwLock::new(entries),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 先寫入儲存，成功後才更新記憶體中的集合
    async fn persist(&self, entries: &[IndexedEntry], pending: &[IndexedEntry]) -> Result<()> {
        let collection = PersistedCollection {
            name: self.name.clone(),
            entries: entries
                .iter()
                .chain(pending)
                .map(|e| e.entry.clone())
                .collect(),
        };
        let data = serde_json::to_vec_pretty(&collection)?;
        self.storage
            .write_file(&collection_file(&self.name), &data)
            .await
    }
}

fn collection_file(name: &str) -> String {
    format!("{}.json", name)
}

#[async_trait]
impl<S: Storage, E: Embedder> VectorIndex for LocalVectorIndex<S, E> {
    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn add(&self, entry: PortfolioEntry, id: String) -> Result<()> {
        self.add_all(vec![(id, entry)]).await
    }

    async fn add_all(&self, batch: Vec<(String, PortfolioEntry)>) -> Result<()> {
        let mut entries = self.entries.write().await;

        let mut seen: HashSet<&str> = entries.iter().map(|e| e.entry.id.as_str()).collect();
        for (id, _) in &batch {
            if !seen.insert(id.as_str()) {
                return Err(OutreachError::VectorIndexError {
                    message: format!("duplicate entry id '{}'", id),
                });
            }
        }

        let pending: Vec<IndexedEntry> = batch
            .into_iter()
            .map(|(id, entry)| IndexedEntry {
                embedding: self.embedder.embed(&entry.tech_stack),
                entry: PersistedEntry {
                    id,
                    document: entry.tech_stack,
                    links: entry.links,
                },
            })
            .collect();

        self.persist(&entries, &pending).await?;
        entries.extend(pending);
        Ok(())
    }

    async fn query(&self, texts: &[String], k: usize) -> Result<QueryResponse> {
        let entries = self.entries.read().await;

        let results = texts
            .iter()
            .map(|text| {
                let query = self.embedder.embed(text);
                let mut ranked: Vec<(usize, f32)> = entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (i, cosine_distance(&query, &e.embedding)))
                    .collect();
                // 穩定排序：距離相同時保留加入順序
                ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

                let neighbors = ranked
                    .into_iter()
                    .take(k)
                    .map(|(i, distance)| {
                        let entry = &entries[i].entry;
                        Neighbor {
                            id: entry.id.clone(),
                            document: entry.document.clone(),
                            links: entry.links.clone(),
                            distance,
                        }
                    })
                    .collect();

                SkillNeighbors {
                    query: text.clone(),
                    neighbors,
                }
            })
            .collect();

        Ok(QueryResponse { results })
    }
}
