// src/evaluator/mod.rs — Score candidates against fixed criteria

pub mod parser;

use std::sync::Arc;

use crate::core::backend::StepClient;
use crate::core::brief::DesignBrief;
use crate::core::prompts;
use crate::core::types::{Candidate, Evaluation, Step};
use crate::infra::errors::DesignError;

/// Scores every candidate on accuracy, power, cost and reliability.
pub struct Evaluator {
    client: Arc<StepClient>,
}

impl Evaluator {
    pub fn new(client: Arc<StepClient>) -> Self {
        Self { client }
    }

    /// Evaluate the current candidates.
    ///
    /// An empty candidate list returns immediately without a backend call.
    /// The result only references ids present in `candidates`.
    pub async fn evaluate(
        &self,
        brief: &DesignBrief,
        candidates: &[Candidate],
    ) -> Result<Vec<Evaluation>, DesignError> {
        if candidates.is_empty() {
            tracing::info!("No candidates to evaluate");
            return Ok(Vec::new());
        }

        let prompt = prompts::evaluate(brief, candidates)?;
        let text = self
            .client
            .ask(Step::Evaluate, prompts::EVALUATOR_SYSTEM, prompt)
            .await?;

        let evaluations = parser::parse_evaluations(&text, candidates);
        if evaluations.len() < candidates.len() {
            tracing::warn!(
                candidates = candidates.len(),
                evaluations = evaluations.len(),
                "Some candidates were not scored"
            );
        }
        tracing::info!(count = evaluations.len(), "Evaluated candidates");
        Ok(evaluations)
    }
}
