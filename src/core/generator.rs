// src/core/generator.rs — Propose the initial candidate set

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use super::backend::StepClient;
use super::brief::DesignBrief;
use super::extract::extract_list;
use super::prompts;
use super::types::{Candidate, Step};
use crate::infra::errors::DesignError;

/// Asks the backend for `count` fresh candidates.
pub struct Generator {
    client: Arc<StepClient>,
    count: u32,
}

impl Generator {
    pub fn new(client: Arc<StepClient>, count: u32) -> Self {
        Self { client, count }
    }

    /// Generate candidates for the brief.
    ///
    /// A response with no usable records yields an empty list; only a
    /// failed backend call is an error.
    pub async fn generate(&self, brief: &DesignBrief) -> Result<Vec<Candidate>, DesignError> {
        let prompt = prompts::generate(brief, self.count)?;
        let text = self
            .client
            .ask(Step::Generate, prompts::GENERATOR_SYSTEM, prompt)
            .await?;

        let candidates = parse_candidates(&text, self.count);
        tracing::info!(
            requested = self.count,
            received = candidates.len(),
            "Generated candidates"
        );
        Ok(candidates)
    }
}

/// Parse a generator response into at most `count` candidates with unique
/// ids in `[1, count]`.
pub fn parse_candidates(text: &str, count: u32) -> Vec<Candidate> {
    match extract_list(text, "candidates") {
        Some(records) => collect_candidates(&records, count),
        None => {
            tracing::warn!("No candidate list found in generator response");
            Vec::new()
        }
    }
}

/// Keep valid records in order, dropping duplicates and anything past
/// `max_id` records.
pub fn collect_candidates(records: &[Value], max_id: u32) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        if candidates.len() >= max_id as usize {
            tracing::warn!(
                ignored = records.len() - idx,
                "Ignoring candidates past the requested count"
            );
            break;
        }
        match Candidate::from_json(record, max_id) {
            Some(c) if seen.insert(c.id) => candidates.push(c),
            Some(c) => tracing::warn!(id = c.id, "Dropping duplicate candidate id"),
            None => tracing::warn!("Dropping candidate record without a valid id"),
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;
    use serde_json::json;

    #[test]
    fn test_parse_well_formed() {
        let text = r#"[
            {"id": 1, "microcontroller": "nRF52832", "rationale": "r1"},
            {"id": 2, "microcontroller": "STM32L4", "rationale": "r2"}
        ]"#;
        let c = parse_candidates(text, 5);
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].id, 1);
        assert_eq!(c[1].param_text("microcontroller").as_deref(), Some("STM32L4"));
    }

    #[test]
    fn test_parse_named_field_in_prose() {
        let text = "Here you go:\n{\"candidates\": [{\"id\": 3}]}\nThanks";
        let c = parse_candidates(text, 5);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].id, 3);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_candidates("Sorry, I can't do that.", 5).is_empty());
    }

    #[test]
    fn test_ids_unique_and_in_range() {
        let records = vec![
            json!({"id": 1, "microcontroller": "first"}),
            json!({"id": 1, "microcontroller": "dup"}),
            json!({"id": 9}),
            json!({"name": "no id"}),
            json!({"id": "2"}),
        ];
        let c = collect_candidates(&records, 5);
        let ids: Vec<u32> = c.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(c[0].param_text("microcontroller").as_deref(), Some("first"));
    }

    #[test]
    fn test_capped_at_count() {
        let records: Vec<Value> = (1..=3).map(|i| json!({"id": i})).collect();
        let c = collect_candidates(&records, 2);
        assert_eq!(c.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_calls_backend_once() {
        let mock = Arc::new(MockProvider::with_responses([
            r#"[{"id": 1, "microcontroller": "nRF52840"}]"#,
        ]));
        let client = Arc::new(StepClient::with_default_model(mock.clone()));
        let generator = Generator::new(client, 5);

        let c = generator.generate(&DesignBrief::sample()).await.unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(mock.call_count(), 1);
        assert!(mock.last_prompt().unwrap().contains("exactly 5 candidates"));
    }

    #[tokio::test]
    async fn test_generate_backend_failure_propagates() {
        let mock = Arc::new(MockProvider::new());
        mock.push_error(DesignError::Provider {
            provider: "mock".into(),
            message: "HTTP 401".into(),
            retriable: false,
        });
        let client = Arc::new(StepClient::with_default_model(mock));
        let result = Generator::new(client, 5).generate(&DesignBrief::sample()).await;
        assert!(matches!(result, Err(DesignError::Provider { .. })));
    }
}
