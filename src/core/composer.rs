use crate::app::prompts::COLD_EMAIL_PROMPT;
use crate::core::invoker::ResilientInvoker;
use crate::core::prompt::{PromptFields, PromptTemplate};
use crate::domain::model::{Invocation, JobPosting, MatchResult, SenderProfile};
use crate::domain::ports::TextGenerator;
use crate::utils::error::Result;
use std::sync::Arc;

pub struct EmailComposer<G: TextGenerator> {
    invoker: Arc<ResilientInvoker<G>>,
    profile: SenderProfile,
    template: PromptTemplate,
}

impl<G: TextGenerator> EmailComposer<G> {
    pub fn new(invoker: Arc<ResilientInvoker<G>>, profile: SenderProfile) -> Self {
        Self {
            invoker,
            profile,
            template: COLD_EMAIL_PROMPT,
        }
    }

    pub fn fields(&self, job: &JobPosting, matches: &MatchResult) -> PromptFields<'static> {
        PromptFields::from([
            ("role", job.role.clone()),
            ("experience", job.experience.clone()),
            ("skills", job.skills_joined()),
            ("location", job.location.clone()),
            ("description", job.description.clone()),
            ("profile", self.profile.render_block()),
            ("techstack", matches.tech_stacks.join(", ")),
            ("links", matches.links.join(", ")),
        ])
    }

    /// 模型回傳的郵件原樣返回，不做格式檢查
    pub async fn compose(
        &self,
        job: &JobPosting,
        matches: &MatchResult,
    ) -> Result<Invocation<String>> {
        let fields = self.fields(job, matches);
        let invocation = self.invoker.invoke(&self.template, &fields).await?;
        tracing::info!(
            "📧 Email generated by '{}' ({} characters)",
            invocation.model,
            invocation.value.len()
        );
        Ok(invocation)
    }
}
