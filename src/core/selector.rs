// src/core/selector.rs — Choose the final recommendation

use std::sync::Arc;

use serde_json::{Map, Value};

use super::backend::StepClient;
use super::brief::DesignBrief;
use super::extract::{extract_object, parse_id};
use super::prompts;
use super::refiner::rank;
use super::types::{Candidate, Evaluation, Step};
use crate::infra::errors::DesignError;
use crate::util::json_text;

pub const NO_CANDIDATES: &str = "No candidates available; selection was not possible.";
pub const UNPARSEABLE: &str = "Unable to parse selection";

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub top_pick: Option<Candidate>,
    /// Always plain text.
    pub justification: String,
}

pub struct Selector {
    client: Arc<StepClient>,
}

impl Selector {
    pub fn new(client: Arc<StepClient>) -> Self {
        Self { client }
    }

    /// Ask for one recommendation. With no candidates nothing is asked and
    /// nothing is picked.
    pub async fn select(
        &self,
        brief: &DesignBrief,
        candidates: &[Candidate],
        evaluations: &[Evaluation],
    ) -> Result<Selection, DesignError> {
        if candidates.is_empty() {
            tracing::warn!("No candidates to select from");
            return Ok(Selection {
                top_pick: None,
                justification: NO_CANDIDATES.to_string(),
            });
        }

        let prompt = prompts::select(brief, candidates, evaluations)?;
        let text = self
            .client
            .ask(Step::Select, prompts::SELECTOR_SYSTEM, prompt)
            .await?;

        let selection = parse_selection(&text, candidates, evaluations);
        tracing::info!(
            top_pick = ?selection.top_pick.as_ref().map(|c| c.id),
            "Selected final candidate"
        );
        Ok(selection)
    }
}

/// Parse a selector response, resolving the pick against `candidates`.
pub fn parse_selection(
    text: &str,
    candidates: &[Candidate],
    evaluations: &[Evaluation],
) -> Selection {
    let Some(obj) = extract_object(text) else {
        tracing::warn!("No selection object found in selector response");
        return Selection {
            top_pick: fallback_pick(candidates, evaluations),
            justification: UNPARSEABLE.to_string(),
        };
    };

    let justification = ["selection_reasoning", "justification", "reasoning"]
        .iter()
        .find_map(|key| {
            obj.get(*key)
                .map(json_text)
                .filter(|text| !text.is_empty())
        })
        .unwrap_or_default();

    let top_pick = match picked_id(&obj).and_then(|id| candidates.iter().find(|c| c.id == id)) {
        Some(c) => Some(c.clone()),
        None => {
            tracing::warn!("Selected candidate not in the current set, using best ranked");
            fallback_pick(candidates, evaluations)
        }
    };

    Selection {
        top_pick,
        justification,
    }
}

fn picked_id(obj: &Map<String, Value>) -> Option<u32> {
    let direct = match obj.get("top_pick") {
        Some(Value::Object(pick)) => pick.get("id").and_then(parse_id),
        Some(other) => parse_id(other),
        None => None,
    };
    direct.or_else(|| obj.get("top_pick_id").and_then(parse_id))
}

/// The highest-ranked evaluated candidate, or the first candidate.
fn fallback_pick(candidates: &[Candidate], evaluations: &[Evaluation]) -> Option<Candidate> {
    rank(evaluations)
        .into_iter()
        .find_map(|e| candidates.iter().find(|c| c.id == e.candidate_id))
        .or_else(|| candidates.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;
    use serde_json::json;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(1).with_param("microcontroller", "MSP430"),
            Candidate::new(2).with_param("microcontroller", "nRF52840"),
            Candidate::new(3).with_param("microcontroller", "STM32L0"),
        ]
    }

    fn eval(id: u32, overall: f64) -> Evaluation {
        Evaluation {
            candidate_id: id,
            accuracy_score: 7.0,
            power_score: 7.0,
            cost_score: 7.0,
            reliability_score: 7.0,
            overall_score: overall,
            feedback: String::new(),
        }
    }

    #[test]
    fn test_plain_string_justification() {
        let text = json!({
            "top_pick": {"id": 2, "microcontroller": "nRF52840"},
            "selection_reasoning": "Best balance of power and accuracy."
        })
        .to_string();
        let s = parse_selection(&text, &candidates(), &[]);
        assert_eq!(s.top_pick.map(|c| c.id), Some(2));
        assert_eq!(s.justification, "Best balance of power and accuracy.");
    }

    #[test]
    fn test_nested_justification_collapsed() {
        let text = json!({
            "top_pick": {"id": 3},
            "selection_reasoning": {
                "accuracy": "16-bit ADC keeps MARD low.",
                "power": "Aggressive power gating."
            }
        })
        .to_string();
        let s = parse_selection(&text, &candidates(), &[]);
        assert_eq!(
            s.justification,
            "16-bit ADC keeps MARD low. Aggressive power gating."
        );
    }

    #[test]
    fn test_null_or_blank_justification_skipped() {
        let text = json!({
            "top_pick": {"id": 2},
            "selection_reasoning": null,
            "justification": "   ",
            "reasoning": "Integrated radio saves a chip."
        })
        .to_string();
        let s = parse_selection(&text, &candidates(), &[]);
        assert_eq!(s.justification, "Integrated radio saves a chip.");

        let s = parse_selection(r#"{"top_pick": {"id": 1}}"#, &candidates(), &[]);
        assert_eq!(s.top_pick.map(|c| c.id), Some(1));
        assert!(s.justification.is_empty());
    }

    #[test]
    fn test_pick_resolved_from_current_set() {
        // The backend echoes an outdated record; the current one wins.
        let text = r#"{"top_pick": {"id": "1", "microcontroller": "stale"}, "selection_reasoning": "x"}"#;
        let s = parse_selection(text, &candidates(), &[]);
        assert_eq!(
            s.top_pick.unwrap().param_text("microcontroller").as_deref(),
            Some("MSP430")
        );
    }

    #[test]
    fn test_pick_by_bare_id() {
        let s = parse_selection(r#"{"top_pick_id": 3, "justification": "ok"}"#, &candidates(), &[]);
        assert_eq!(s.top_pick.map(|c| c.id), Some(3));
        assert_eq!(s.justification, "ok");
    }

    #[test]
    fn test_unknown_pick_falls_back_to_best_ranked() {
        let text = r#"{"top_pick": {"id": 9}, "selection_reasoning": "x"}"#;
        let s = parse_selection(text, &candidates(), &[eval(1, 6.0), eval(3, 8.0)]);
        assert_eq!(s.top_pick.map(|c| c.id), Some(3));
        assert_eq!(s.justification, "x");
    }

    #[test]
    fn test_unparseable_falls_back() {
        let s = parse_selection("I like number two.", &candidates(), &[]);
        assert_eq!(s.top_pick.map(|c| c.id), Some(1));
        assert_eq!(s.justification, UNPARSEABLE);
    }

    #[tokio::test]
    async fn test_no_candidates_no_call() {
        let mock = Arc::new(MockProvider::new());
        let selector = Selector::new(Arc::new(StepClient::with_default_model(mock.clone())));
        let s = selector.select(&DesignBrief::sample(), &[], &[]).await.unwrap();
        assert!(s.top_pick.is_none());
        assert_eq!(s.justification, NO_CANDIDATES);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_select_uses_selector_priming() {
        let mock = Arc::new(MockProvider::with_responses([
            r#"{"top_pick": {"id": 2}, "selection_reasoning": "fine"}"#,
        ]));
        let selector = Selector::new(Arc::new(StepClient::with_default_model(mock.clone())));
        let s = selector
            .select(&DesignBrief::sample(), &candidates(), &[])
            .await
            .unwrap();
        assert_eq!(s.top_pick.map(|c| c.id), Some(2));
        assert_eq!(mock.requests()[0].messages[0].content, prompts::SELECTOR_SYSTEM);
    }
}
