// src/evaluator/parser.rs — Parse backend evaluation responses into score records

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::core::extract::{extract_list, parse_id};
use crate::core::types::{Candidate, Evaluation, SCORE_MAX, SCORE_MIN};
use crate::util::json_text;

/// Parse an evaluator response against the candidates that were scored.
///
/// Records that lack a score, repeat an id, or cite an unknown candidate
/// are dropped. Never fails: unparseable text yields an empty list.
pub fn parse_evaluations(text: &str, candidates: &[Candidate]) -> Vec<Evaluation> {
    let Some(records) = extract_list(text, "evaluations") else {
        tracing::warn!("No evaluation list found in evaluator response");
        return Vec::new();
    };

    let known: HashSet<u32> = candidates.iter().map(|c| c.id).collect();
    let mut seen = HashSet::new();
    let mut evaluations = Vec::new();

    for record in &records {
        let Some(eval) = record.as_object().and_then(evaluation_from_json) else {
            tracing::warn!("Dropping malformed evaluation record");
            continue;
        };
        if !known.contains(&eval.candidate_id) {
            tracing::warn!(
                candidate_id = eval.candidate_id,
                "Dropping evaluation for unknown candidate"
            );
            continue;
        }
        if !seen.insert(eval.candidate_id) {
            tracing::warn!(
                candidate_id = eval.candidate_id,
                "Dropping duplicate evaluation"
            );
            continue;
        }
        evaluations.push(eval);
    }

    evaluations
}

/// Build one evaluation from a record. All five scores are required.
pub fn evaluation_from_json(obj: &Map<String, Value>) -> Option<Evaluation> {
    let candidate_id = obj
        .get("candidate_id")
        .or_else(|| obj.get("id"))
        .and_then(parse_id)?;

    let score = |key: &str| -> Option<f64> {
        let raw = obj.get(key).and_then(parse_score)?;
        Some(clamp_score(candidate_id, key, raw))
    };

    Some(Evaluation {
        candidate_id,
        accuracy_score: score("accuracy_score")?,
        power_score: score("power_score")?,
        cost_score: score("cost_score")?,
        reliability_score: score("reliability_score")?,
        overall_score: score("overall_score")?,
        feedback: obj.get("feedback").map(json_text).unwrap_or_default(),
    })
}

/// Read a score from a number, a numeric string, or an `"x/10"` string.
pub fn parse_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let head = s.split('/').next().unwrap_or("").trim();
            head.parse::<f64>().ok()?
        }
        _ => return None,
    };
    score.is_finite().then_some(score)
}

fn clamp_score(candidate_id: u32, key: &str, score: f64) -> f64 {
    let clamped = score.clamp(SCORE_MIN, SCORE_MAX);
    if clamped != score {
        tracing::warn!(candidate_id, field = key, score, "Score out of range, clamped");
    }
    // -0.0 becomes 0.0
    clamped + 0.0
}
