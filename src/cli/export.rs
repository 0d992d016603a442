// src/cli/export.rs — JSON export of a finished run, and re-rendering from it

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::RunState;
use crate::report;

/// A finished run with its metadata, as written by `--json-out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `provider/model` of the default model.
    pub provider: String,
    pub state: RunState,
}

impl RunExport {
    pub fn new(
        state: RunState,
        provider: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            finished_at,
            provider: provider.into(),
            state,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "Wrote run export");
        Ok(())
    }
}

/// Read a run state from an export document, or from a bare state object.
pub fn load_state(path: &Path) -> anyhow::Result<RunState> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let state = if value.get("state").is_some() {
        serde_json::from_value::<RunExport>(value)?.state
    } else {
        serde_json::from_value::<RunState>(value)?
    };
    Ok(state)
}

/// `designloop render`: print the report for an exported run.
pub fn run_render(path: &Path) -> anyhow::Result<()> {
    let state = load_state(path)
        .map_err(|e| anyhow::anyhow!("Cannot read run from {}: {e}", path.display()))?;
    print!("{}", report::render(&state));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::brief::DesignBrief;
    use crate::core::types::{Candidate, Evaluation};

    fn finished_state() -> RunState {
        let mut state = RunState::new(DesignBrief::sample(), 2);
        state.iteration = 2;
        state.candidates = vec![Candidate::new(1)
            .with_param("microcontroller", "nRF52840")
            .with_param("adc_bits", 16)];
        state.initial_candidates = state.candidates.clone();
        state.evaluations = vec![Evaluation {
            candidate_id: 1,
            accuracy_score: 9.0,
            power_score: 8.0,
            cost_score: 6.5,
            reliability_score: 9.0,
            overall_score: 8.2,
            feedback: "ok".into(),
        }];
        state.top_pick = state.candidates.first().cloned();
        state.justification = "Lowest power at the required accuracy.".into();
        state.report = Some(report::render(&state));
        state
    }

    #[test]
    fn test_export_document_shape() {
        let now = Utc::now();
        let export = RunExport::new(finished_state(), "groq/llama-3.3-70b-versatile", now, now);
        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        for key in ["run_id", "started_at", "finished_at", "provider", "state"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["state"]["iteration"], 2);
        assert_eq!(value["state"]["candidates"][0]["microcontroller"], "nRF52840");
        assert_eq!(value["state"]["brief"]["title"], "GLUCOSE MONITORING SYSTEM");
    }

    #[test]
    fn test_rerender_matches_original_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let now = Utc::now();
        let state = finished_state();
        RunExport::new(state.clone(), "mock/mock-model", now, now)
            .write(&path)
            .unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(report::render(&loaded), state.report.unwrap());
    }

    #[test]
    fn test_load_bare_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, serde_json::to_string(&finished_state()).unwrap()).unwrap();
        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.top_pick.map(|c| c.id), Some(1));
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"state\": 3}").unwrap();
        assert!(load_state(&path).is_err());
        assert!(run_render(&path).is_err());
    }
}
