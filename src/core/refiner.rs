// src/core/refiner.rs — Improve the top-ranked candidates from their feedback

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::backend::StepClient;
use super::brief::DesignBrief;
use super::extract::extract_list;
use super::generator::collect_candidates;
use super::prompts;
use super::types::{Candidate, Evaluation, Step};
use crate::infra::errors::DesignError;

/// Evaluations ordered by overall score, highest first. Ties (including
/// `-0.0` against `0.0`) keep their original order.
pub fn rank(evaluations: &[Evaluation]) -> Vec<&Evaluation> {
    let mut ranked: Vec<&Evaluation> = evaluations.iter().collect();
    ranked.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// The candidates chosen for a refinement round, with their feedback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopK {
    /// In rank order.
    pub candidates: Vec<Candidate>,
    pub feedback: Vec<Evaluation>,
}

impl TopK {
    pub fn ids(&self) -> Vec<u32> {
        self.candidates.iter().map(|c| c.id).collect()
    }
}

/// Pick the `k` best candidates by overall score.
///
/// Without any evaluations the first `k` candidates are taken as they are.
pub fn select_top(candidates: &[Candidate], evaluations: &[Evaluation], k: usize) -> TopK {
    if evaluations.is_empty() {
        return TopK {
            candidates: candidates.iter().take(k).cloned().collect(),
            feedback: Vec::new(),
        };
    }

    let by_id: HashMap<u32, &Candidate> = candidates.iter().map(|c| (c.id, c)).collect();
    let mut top = TopK::default();
    for eval in rank(evaluations) {
        if top.candidates.len() == k {
            break;
        }
        if let Some(candidate) = by_id.get(&eval.candidate_id) {
            top.candidates.push((*candidate).clone());
            top.feedback.push(eval.clone());
        }
    }
    top
}

/// Result of one refinement round.
#[derive(Debug, Clone)]
pub struct Refined {
    pub candidates: Vec<Candidate>,
    /// The iteration counter after this round.
    pub iteration: u32,
    /// Ids kept unchanged because the backend returned nothing usable for them.
    pub unrefined: Vec<u32>,
}

/// Asks the backend for improved versions of the top candidates.
pub struct Refiner {
    client: Arc<StepClient>,
}

impl Refiner {
    pub fn new(client: Arc<StepClient>) -> Self {
        Self { client }
    }

    /// Run one refinement round over `top`.
    ///
    /// Always advances the iteration by one. Candidates the backend fails to
    /// return (or returns unparseable) are carried over unchanged, so the
    /// set never shrinks below `top`.
    pub async fn refine(
        &self,
        brief: &DesignBrief,
        top: &TopK,
        iteration: u32,
    ) -> Result<Refined, DesignError> {
        let next = iteration + 1;
        if top.candidates.is_empty() {
            tracing::warn!(iteration = next, "Nothing to refine");
            return Ok(Refined {
                candidates: Vec::new(),
                iteration: next,
                unrefined: Vec::new(),
            });
        }

        let prompt = prompts::refine(brief, &top.candidates, &top.feedback)?;
        let text = self
            .client
            .ask(Step::Refine, prompts::REFINER_SYSTEM, prompt)
            .await?;

        let (candidates, unrefined) = merge_refined(&text, &top.candidates);
        if !unrefined.is_empty() {
            tracing::warn!(?unrefined, "Keeping unrefined candidates");
        }
        tracing::info!(iteration = next, count = candidates.len(), "Refined candidates");

        Ok(Refined {
            candidates,
            iteration: next,
            unrefined,
        })
    }
}

/// Replace each top candidate by its refined record, matched by id.
/// Returns the new set (in the order of `top`) and the ids left unchanged.
pub fn merge_refined(text: &str, top: &[Candidate]) -> (Vec<Candidate>, Vec<u32>) {
    let wanted: HashSet<u32> = top.iter().map(|c| c.id).collect();
    let mut refined: HashMap<u32, Candidate> = match extract_list(text, "candidates") {
        Some(records) => collect_candidates(&records, u32::MAX)
            .into_iter()
            .filter(|c| wanted.contains(&c.id))
            .map(|c| (c.id, c))
            .collect(),
        None => {
            tracing::warn!("No candidate list found in refiner response");
            HashMap::new()
        }
    };

    let mut unrefined = Vec::new();
    let candidates: Vec<Candidate> = top
        .iter()
        .map(|original| {
            refined.remove(&original.id).unwrap_or_else(|| {
                unrefined.push(original.id);
                original.clone()
            })
        })
        .collect();
    (candidates, unrefined)
}
