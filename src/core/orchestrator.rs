// src/core/orchestrator.rs — Driver loop: Generate → Evaluate → [gate] → Refine … → Select → Render

use std::sync::Arc;

use super::backend::StepClient;
use super::brief::DesignBrief;
use super::gate::gate;
use super::generator::Generator;
use super::refiner::{select_top, Refiner};
use super::selector::Selector;
use super::types::*;
use crate::evaluator::Evaluator;
use crate::infra::errors::DesignError;
use crate::report;

/// Drives one exploration run from brief to rendered report.
///
/// Each step reads the state fields it needs and the driver writes back
/// what the step produced. Steps never touch the state directly.
pub struct Orchestrator {
    client: Arc<StepClient>,
    generator: Generator,
    evaluator: Evaluator,
    refiner: Refiner,
    selector: Selector,
    config: ExplorationConfig,
    /// Optional callback for real-time progress events.
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl Orchestrator {
    pub fn new(client: Arc<StepClient>, config: ExplorationConfig) -> Self {
        Self {
            generator: Generator::new(client.clone(), config.candidate_count),
            evaluator: Evaluator::new(client.clone()),
            refiner: Refiner::new(client.clone()),
            selector: Selector::new(client.clone()),
            client,
            config,
            on_progress: None,
        }
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run the whole pipeline.
    ///
    /// Configuration faults are returned before any backend call. A failed
    /// backend call ends the run with `DesignError::Step` naming the step.
    /// Unusable responses never fail the run; they degrade the state.
    pub async fn run(&self, brief: DesignBrief) -> Result<RunState, DesignError> {
        self.config.validate()?;
        brief.validate()?;

        let max_iterations = brief.max_iterations.unwrap_or(self.config.max_iterations);
        let mut state = RunState::new(brief, max_iterations);
        tracing::info!(
            candidates = self.config.candidate_count,
            top_k = self.config.top_k,
            max_iterations,
            "Starting design exploration"
        );

        // Generate
        let candidates = self
            .generator
            .generate(&state.brief)
            .await
            .map_err(|e| e.at(Step::Generate))?;
        state.note(format!("Generated {} initial candidates", candidates.len()));
        self.emit(ProgressEvent::CandidatesGenerated {
            candidates: candidates.iter().map(Candidate::summary).collect(),
        });
        state.initial_candidates = candidates.clone();
        state.candidates = candidates;

        self.evaluate_round(&mut state).await?;

        while gate(state.iteration, state.max_iterations) == GateDecision::Refine {
            let top = select_top(
                &state.candidates,
                &state.evaluations,
                self.config.top_k as usize,
            );
            self.emit(ProgressEvent::RefineStart {
                iteration: state.iteration + 1,
                selected: top.ids(),
            });

            let refined = self
                .refiner
                .refine(&state.brief, &top, state.iteration)
                .await
                .map_err(|e| e.at(Step::Refine))?;
            state.candidates = refined.candidates;
            state.iteration = refined.iteration;
            state.note(format!(
                "Refined to {} candidates (iteration {})",
                state.candidates.len(),
                state.iteration
            ));

            self.evaluate_round(&mut state).await?;
        }

        // Select
        let selection = self
            .selector
            .select(&state.brief, &state.candidates, &state.evaluations)
            .await
            .map_err(|e| e.at(Step::Select))?;
        self.emit(ProgressEvent::Selected {
            candidate_id: selection.top_pick.as_ref().map(|c| c.id),
        });
        state.top_pick = selection.top_pick;
        state.justification = selection.justification;
        state.note("Final selection complete");

        // Render
        state.usage = self.client.usage();
        state.report = Some(report::render(&state));

        self.emit(ProgressEvent::Complete {
            iterations: state.iteration,
            candidates: state.candidates.len(),
        });
        tracing::info!(
            iterations = state.iteration,
            tokens = state.usage.total(),
            "Design exploration complete"
        );
        Ok(state)
    }

    async fn evaluate_round(&self, state: &mut RunState) -> Result<(), DesignError> {
        let round = state.iteration;
        if !state.candidates.is_empty() {
            self.emit(ProgressEvent::EvaluationStart {
                count: state.candidates.len(),
                round,
            });
        }

        let evaluations = self
            .evaluator
            .evaluate(&state.brief, &state.candidates)
            .await
            .map_err(|e| e.at(Step::Evaluate))?;

        if evaluations.is_empty() && state.candidates.is_empty() {
            state.note("No candidates to evaluate");
        } else {
            state.note(format!("Evaluated {} candidates", evaluations.len()));
            self.emit(ProgressEvent::Scored {
                round,
                scores: evaluations
                    .iter()
                    .map(|e| (e.candidate_id, e.overall_score))
                    .collect(),
            });
        }
        state.evaluations = evaluations;
        Ok(())
    }
}
