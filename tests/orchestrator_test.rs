// tests/orchestrator_test.rs — Integration test: full pipeline with a mock provider

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use designloop::core::backend::StepClient;
use designloop::core::brief::{AdcBits, AlertThresholds, Constraints, DesignBrief, Requirements};
use designloop::core::orchestrator::Orchestrator;
use designloop::core::types::{ExplorationConfig, ProgressEvent, Step};
use designloop::infra::errors::DesignError;
use designloop::provider::*;
use designloop::report;

/// A mock provider that replays canned responses without any network calls.
struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl MockProvider {
    fn new<I: IntoIterator<Item = String>>(responses: I) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn system_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|turns| turns[0].content.clone())
            .collect()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DesignError> {
        self.prompts.lock().unwrap().push(request.messages);
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DesignError::Provider {
                provider: "mock".into(),
                message: "script exhausted".into(),
                retriable: false,
            })?;
        Ok(ChatResponse {
            content,
            usage: TokenUsage {
                input_tokens: 120,
                output_tokens: 80,
            },
            stop_reason: StopReason::EndTurn,
        })
    }
}

fn candidates_json() -> String {
    json!({
        "candidates": [
            {"id": 1, "microcontroller": "MSP430FR2355", "sensor_type": "Enzymatic GOx",
             "adc_bits": 12, "ble_module_tx_interval": "CC2541, 0 dBm, 60 s", "battery": "CR2032",
             "rationale": "Ultra-low sleep current."},
            {"id": 2, "microcontroller": "nRF52832", "sensor_type": "Enzymatic GOx",
             "adc_bits": 14, "ble_module_tx_interval": "Integrated, -4 dBm, 300 s", "battery": "CR2032",
             "rationale": "Integrated radio."},
            {"id": 3, "microcontroller": "STM32L031", "sensor_type": "Optical NIR",
             "adc_bits": 12, "ble_module_tx_interval": "BlueNRG-2, 0 dBm, 60 s", "battery": "LiPo 40 mAh",
             "rationale": "Cheap."}
        ]
    })
    .to_string()
}

fn evaluations_json(scores: &[(u32, f64)]) -> String {
    let records: Vec<serde_json::Value> = scores
        .iter()
        .map(|(id, overall)| {
            json!({
                "candidate_id": id,
                "accuracy_score": 8, "power_score": 7, "cost_score": 6,
                "reliability_score": 9, "overall_score": overall,
                "feedback": format!("Tighten duty cycle on #{id}.")
            })
        })
        .collect();
    format!("```json\n{}\n```", serde_json::to_string_pretty(&records).unwrap())
}

/// The brief from the end-to-end scenario: free-text ADC set, no cap in the brief.
fn scenario_brief() -> DesignBrief {
    DesignBrief::new(
        Some(Requirements {
            sampling_interval: Some("5min".into()),
            alert_thresholds: Some(AlertThresholds::Bounds {
                low: 70.0,
                high: 180.0,
            }),
            battery_life: Some(">=24h".into()),
            ..Default::default()
        }),
        Some(Constraints {
            adc_bits: Some(AdcBits::Text("{10,12,14,16}".into())),
            ..Default::default()
        }),
    )
    .unwrap()
}

fn orchestrator(mock: Arc<MockProvider>, config: ExplorationConfig) -> Orchestrator {
    let client = Arc::new(StepClient::with_default_model(mock));
    Orchestrator::new(client, config)
}

// ─── End-to-end ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_zero_iterations_generate_evaluate_select_render() {
    let mock = Arc::new(MockProvider::new([
        candidates_json(),
        evaluations_json(&[(1, 7.2), (2, 8.8), (3, 6.1)]),
        json!({
            "top_pick": {"id": 2},
            "selection_reasoning": {
                "accuracy": "14-bit ADC resolves the 70 mg/dL threshold.",
                "power": "Integrated radio avoids a second IC."
            }
        })
        .to_string(),
    ]));
    let config = ExplorationConfig {
        candidate_count: 3,
        max_iterations: 0,
        ..Default::default()
    };

    let state = orchestrator(mock.clone(), config)
        .run(scenario_brief())
        .await
        .unwrap();

    assert_eq!(mock.calls(), 3);
    assert_eq!(
        mock.system_prompts(),
        vec![
            designloop::core::prompts::GENERATOR_SYSTEM,
            designloop::core::prompts::EVALUATOR_SYSTEM,
            designloop::core::prompts::SELECTOR_SYSTEM,
        ]
    );
    assert_eq!(state.iteration, 0);
    assert_eq!(state.candidates.len(), 3);
    assert_eq!(state.evaluations.len(), 3);
    assert_eq!(state.top_pick.as_ref().map(|c| c.id), Some(2));
    assert_eq!(
        state.justification,
        "14-bit ADC resolves the 70 mg/dL threshold. Integrated radio avoids a second IC."
    );
    assert_eq!(state.usage.total(), 600);

    let report = state.report.clone().unwrap();
    assert!(report.contains("  Iterations completed: 0\n"));
    assert!(report.contains("  #2: nRF52832\n"));
    assert!(report.contains("      * Score: 8.8/10\n"));
    assert!(report.contains("      * Overall:     8.8/10\n"));
    assert_eq!(report, report::render(&state));
}

#[tokio::test]
async fn test_refinement_rounds_with_degraded_responses() {
    let mock = Arc::new(MockProvider::new([
        candidates_json(),
        evaluations_json(&[(1, 5.0), (2, 9.0), (3, 7.0)]),
        // Round 1: refiner answers in prose; top two are kept unrefined.
        "I've improved them as requested.".to_string(),
        // Evaluator cites an id that no longer exists.
        evaluations_json(&[(2, 9.1), (3, 7.4), (1, 9.9)]),
        // Round 2: one refined record.
        json!([{"id": 3, "microcontroller": "STM32U031", "adc_bits": 14}]).to_string(),
        evaluations_json(&[(2, 9.0), (3, 9.3)]),
        "no json here".to_string(),
    ]));
    let config = ExplorationConfig {
        candidate_count: 3,
        top_k: 2,
        max_iterations: 2,
        ..Default::default()
    };

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let state = orchestrator(mock.clone(), config)
        .with_progress(move |e| {
            if let ProgressEvent::RefineStart { selected, .. } = e {
                sink.lock().unwrap().push(selected);
            }
        })
        .run(scenario_brief())
        .await
        .unwrap();

    assert_eq!(mock.calls(), 7);
    assert_eq!(state.iteration, 2);
    assert_eq!(*events.lock().unwrap(), vec![vec![2, 3], vec![2, 3]]);

    let ids: Vec<u32> = state.candidates.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(
        state.candidates[1].param_text("microcontroller").as_deref(),
        Some("STM32U031")
    );
    assert_eq!(state.initial_candidates.len(), 3);

    // Every evaluation refers to a current candidate.
    for e in &state.evaluations {
        assert!(state.candidates.iter().any(|c| c.id == e.candidate_id));
    }

    // Unparseable selection falls back to the best-ranked candidate.
    assert_eq!(state.top_pick.as_ref().map(|c| c.id), Some(3));
    assert_eq!(state.justification, "Unable to parse selection");
}

#[tokio::test]
async fn test_empty_generation_still_renders() {
    let mock = Arc::new(MockProvider::new(["Sorry, no.".to_string()]));
    let state = orchestrator(mock.clone(), ExplorationConfig::default())
        .run(scenario_brief())
        .await
        .unwrap();

    assert_eq!(mock.calls(), 1);
    assert!(state.candidates.is_empty());
    assert!(state.evaluations.is_empty());
    assert!(state.top_pick.is_none());
    let report = state.report.unwrap();
    assert!(report.contains("  Final candidates: 0\n"));
    assert!(report.contains("  No top pick selected.\n"));
}

// ─── Failures ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_backend_failure_is_structured() {
    let mock = Arc::new(MockProvider::new([candidates_json()]));
    let err = orchestrator(mock, ExplorationConfig::default())
        .run(scenario_brief())
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Evaluate));
    assert!(!err.is_config_fault());
}

#[tokio::test]
async fn test_missing_fields_fail_before_any_call() {
    let mock = Arc::new(MockProvider::new(Vec::<String>::new()));
    let mut brief = scenario_brief();
    brief.constraints.adc_bits = None;

    let err = orchestrator(mock.clone(), ExplorationConfig::default())
        .run(brief)
        .await
        .unwrap_err();
    assert!(err.is_config_fault());
    assert_eq!(err.to_string(), "Missing required fields: adc_bits");
    assert_eq!(mock.calls(), 0);
}
