// src/core/gate.rs — Convergence gate between evaluation and refinement

use super::types::GateDecision;

/// Decide whether another refinement round runs.
pub fn gate(iteration: u32, max_iterations: u32) -> GateDecision {
    if iteration >= max_iterations {
        GateDecision::Select
    } else {
        GateDecision::Refine
    }
}
