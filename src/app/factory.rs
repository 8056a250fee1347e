use crate::adapters::{
    CsvPortfolioSource, GroqClient, HashingEmbedder, HttpPageFetcher, LocalVectorIndex,
};
use crate::app::pipelines::{EmailSink, OutreachPipeline};
use crate::config::cli::LocalStorage;
use crate::core::invoker::ResilientInvoker;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use std::sync::Arc;

pub type PortfolioIndex = LocalVectorIndex<LocalStorage, HashingEmbedder>;

pub type DefaultPipeline = OutreachPipeline<
    HttpPageFetcher,
    GroqClient,
    PortfolioIndex,
    CsvPortfolioSource,
    LocalStorage,
>;

/// 開啟設定中的作品集索引（不存在時為空集合）
pub async fn open_portfolio_index<C: ConfigProvider>(config: &C) -> Result<PortfolioIndex> {
    LocalVectorIndex::open(
        LocalStorage::new(config.vectorstore_path()),
        config.collection_name(),
        HashingEmbedder::default(),
    )
    .await
}

/// 依配置組裝完整的求職信管道
pub async fn build_pipeline<C: ConfigProvider>(config: &C) -> Result<DefaultPipeline> {
    let generator = GroqClient::from_config(config)?;
    let invoker = ResilientInvoker::new(generator, config.models());
    let index = open_portfolio_index(config).await?;

    let pipeline = OutreachPipeline::new(
        HttpPageFetcher::new(),
        invoker,
        Arc::new(index),
        CsvPortfolioSource::new(config.portfolio_path()),
        EmailSink::new(
            LocalStorage::new(config.output_path()),
            config.output_path(),
        ),
        config.profile(),
    )
    .with_neighbors_per_skill(config.neighbors_per_skill())
    .with_save_email(config.save_email());

    Ok(pipeline)
}
