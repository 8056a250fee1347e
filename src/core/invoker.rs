use crate::core::prompt::{PromptFields, PromptTemplate};
use crate::domain::model::{Invocation, ModelPair};
use crate::domain::ports::TextGenerator;
use crate::utils::error::{OutreachError, Result};
use std::sync::Arc;

/// Notified once per escalation from the primary to the fallback model.
pub trait FallbackObserver: Send + Sync {
    fn on_fallback(&self, primary: &str, fallback: &str, cause: &OutreachError);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl FallbackObserver for LogObserver {
    fn on_fallback(&self, primary: &str, fallback: &str, cause: &OutreachError) {
        tracing::warn!(
            "⚠️ Primary model '{}' rate limit reached. Switching to fallback model '{}'... ({})",
            primary,
            fallback,
            cause
        );
    }
}

/// 主模型遇到限流時，以備援模型重送一次；最多兩次網路呼叫
pub struct ResilientInvoker<G: TextGenerator> {
    generator: G,
    models: ModelPair,
    observer: Arc<dyn FallbackObserver>,
}

impl<G: TextGenerator> ResilientInvoker<G> {
    pub fn new(generator: G, models: ModelPair) -> Self {
        Self {
            generator,
            models,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FallbackObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn models(&self) -> &ModelPair {
        &self.models
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn invoke(
        &self,
        template: &PromptTemplate,
        fields: &PromptFields<'_>,
    ) -> Result<Invocation<String>> {
        self.invoke_with(template, fields, &self.models.primary, &self.models.fallback)
            .await
    }

    pub async fn invoke_with(
        &self,
        template: &PromptTemplate,
        fields: &PromptFields<'_>,
        primary_model: &str,
        fallback_model: &str,
    ) -> Result<Invocation<String>> {
        let prompt = template.render(fields)?;
        tracing::debug!(
            "Invoking model '{}' with a {} character prompt",
            primary_model,
            prompt.len()
        );

        match self.generator.generate(&prompt, primary_model).await {
            Ok(text) => Ok(Invocation {
                value: text,
                model: primary_model.to_string(),
                fell_back_from: None,
            }),
            Err(err) if err.is_rate_limited() => {
                self.observer.on_fallback(primary_model, fallback_model, &err);

                // 備援失敗直接往上拋，不再重試
                let text = self.generator.generate(&prompt, fallback_model).await?;
                tracing::info!("✅ Fallback model '{}' responded", fallback_model);
                Ok(Invocation {
                    value: text,
                    model: fallback_model.to_string(),
                    fell_back_from: Some(primary_model.to_string()),
                })
            }
            Err(err) => Err(err),
        }
    }
}
