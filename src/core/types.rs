// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::brief::DesignBrief;
use crate::infra::config::ExplorationSettings;
use crate::infra::errors::DesignError;
use crate::provider::TokenUsage;
use crate::util::json_text;

/// Design-parameter fields every generated candidate is asked to carry,
/// besides `id` and `rationale`.
pub const CANDIDATE_FIELDS: &[&str] = &[
    "microcontroller",
    "sensor_type",
    "sensor_bias_voltage",
    "sensor_tau",
    "afe_gain_filter",
    "adc_bits",
    "ble_module_tx_interval",
    "battery",
    "power_gating",
    "sampling_interval",
    "ble_bundling",
];

/// Lower and upper bound of every evaluation score.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// One proposed hardware configuration.
///
/// Only `id` and `rationale` are typed; design parameters stay in an open
/// bag so whatever fields the backend returns survive a refinement round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u32,
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
    #[serde(default)]
    pub rationale: String,
}

impl Candidate {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            params: BTreeMap::new(),
            rationale: String::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// A design parameter as display text; `None` when absent or empty.
    pub fn param_text(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .map(json_text)
            .filter(|s| !s.is_empty())
    }

    /// Build a candidate from a loosely-shaped backend record.
    ///
    /// The id must be a positive integer (or a numeric string) no larger
    /// than `max_id`. Everything except `id` and `rationale` is kept as a
    /// design parameter.
    pub fn from_json(value: &Value, max_id: u32) -> Option<Self> {
        let obj = value.as_object()?;
        let id = super::extract::parse_id(obj.get("id")?)?;
        if id == 0 || id > max_id {
            return None;
        }

        let rationale = obj.get("rationale").map(json_text).unwrap_or_default();
        let params = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "id" && k.as_str() != "rationale")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(Self {
            id,
            params,
            rationale,
        })
    }

    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            id: self.id,
            microcontroller: self.param_text("microcontroller"),
            sensor_type: self.param_text("sensor_type"),
            adc_bits: self.param_text("adc_bits"),
            ble: self
                .param_text("ble_module_tx_interval")
                .or_else(|| self.param_text("ble_module")),
            battery: self.param_text("battery"),
        }
    }
}

/// Backend-supplied scores for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub candidate_id: u32,
    pub accuracy_score: f64,
    pub power_score: f64,
    pub cost_score: f64,
    pub reliability_score: f64,
    /// Aggregate used for ranking. Supplied by the backend, never recomputed.
    pub overall_score: f64,
    #[serde(default)]
    pub feedback: String,
}

/// The handful of fields progress output shows for a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: u32,
    pub microcontroller: Option<String>,
    pub sensor_type: Option<String>,
    pub adc_bits: Option<String>,
    pub ble: Option<String>,
    pub battery: Option<String>,
}

/// Pipeline steps, used to tag failures and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Generate,
    Evaluate,
    Refine,
    Select,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::Generate => "generate",
            Step::Evaluate => "evaluate",
            Step::Refine => "refine",
            Step::Select => "select",
        };
        f.write_str(s)
    }
}

/// Outcome of the convergence gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    Refine,
    Select,
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Refine => write!(f, "refine"),
            GateDecision::Select => write!(f, "select"),
        }
    }
}

/// Everything a run produces, threaded through the driver loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub brief: DesignBrief,
    /// The generator's set, untouched by refinement.
    pub initial_candidates: Vec<Candidate>,
    pub candidates: Vec<Candidate>,
    pub evaluations: Vec<Evaluation>,
    /// Completed refinement rounds. Only the refiner advances it.
    pub iteration: u32,
    pub max_iterations: u32,
    pub top_pick: Option<Candidate>,
    pub justification: String,
    pub report: Option<String>,
    /// One line per completed step.
    pub notes: Vec<String>,
    pub usage: TokenUsage,
}

impl RunState {
    pub fn new(brief: DesignBrief, max_iterations: u32) -> Self {
        Self {
            brief,
            initial_candidates: Vec::new(),
            candidates: Vec::new(),
            evaluations: Vec::new(),
            iteration: 0,
            max_iterations,
            top_pick: None,
            justification: String::new(),
            report: None,
            notes: Vec::new(),
            usage: TokenUsage::default(),
        }
    }

    pub fn evaluation_for(&self, candidate_id: u32) -> Option<&Evaluation> {
        self.evaluations
            .iter()
            .find(|e| e.candidate_id == candidate_id)
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }
}

/// Knobs of the exploration loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationConfig {
    /// N: candidates requested from the generator.
    pub candidate_count: u32,
    /// K: candidates carried into each refinement round.
    pub top_k: u32,
    pub max_iterations: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self::from(&ExplorationSettings::default())
    }
}

impl From<&ExplorationSettings> for ExplorationConfig {
    fn from(cfg: &ExplorationSettings) -> Self {
        Self {
            candidate_count: cfg.candidate_count,
            top_k: cfg.top_k,
            max_iterations: cfg.max_iterations,
            temperature: None,
            max_tokens: Some(4096),
        }
    }
}

impl ExplorationConfig {
    pub fn validate(&self) -> Result<(), DesignError> {
        if self.candidate_count == 0 {
            return Err(DesignError::Config(
                "candidate_count must be at least 1".into(),
            ));
        }
        if self.top_k == 0 {
            return Err(DesignError::Config("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

/// Real-time progress from the driver loop.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    CandidatesGenerated {
        candidates: Vec<CandidateSummary>,
    },
    EvaluationStart {
        count: usize,
        /// 0 for the initial evaluation, then the refinement round.
        round: u32,
    },
    Scored {
        round: u32,
        scores: Vec<(u32, f64)>,
    },
    RefineStart {
        iteration: u32,
        selected: Vec<u32>,
    },
    Selected {
        candidate_id: Option<u32>,
    },
    Complete {
        iterations: u32,
        candidates: usize,
    },
}
