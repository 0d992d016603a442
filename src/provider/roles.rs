// src/provider/roles.rs — Role-based model assignment

use crate::infra::config::RolesConfig;

/// Assigns a model id to each backend-facing step of the exploration loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRoles {
    pub generator: String,
    pub evaluator: String,
    pub refiner: String,
    pub selector: String,
}

impl ModelRoles {
    /// Same model for every step.
    pub fn from_single(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            generator: model.clone(),
            evaluator: model.clone(),
            refiner: model.clone(),
            selector: model,
        }
    }

    /// Build from explicit config, filling gaps with the default model.
    pub fn from_config(default: &str, roles: &RolesConfig) -> Self {
        let pick = |role: &Option<String>| role.clone().unwrap_or_else(|| default.to_string());
        Self {
            generator: pick(&roles.generator),
            evaluator: pick(&roles.evaluator),
            refiner: pick(&roles.refiner),
            selector: pick(&roles.selector),
        }
    }
}
