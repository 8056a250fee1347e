// Adapters layer: concrete implementations of the domain ports (page fetching, chat completions, vector index, portfolio CSV).

pub mod http;
pub mod llm;
pub mod portfolio;
pub mod vector_store;

pub use http::HttpPageFetcher;
pub use llm::GroqClient;
pub use portfolio::CsvPortfolioSource;
pub use vector_store::{Embedder, HashingEmbedder, LocalVectorIndex};
