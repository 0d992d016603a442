// src/infra/errors.rs — Error types for designloop

use thiserror::Error;

use crate::core::types::Step;

#[derive(Error, Debug)]
pub enum DesignError {
    // Provider errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // Configuration faults (fatal, raised before any backend call)
    #[error("No API key for provider '{provider}'. Set {env_var} or configure [model].api_key_env.")]
    NoProvider { provider: String, env_var: String },

    #[error("Design brief is missing its '{0}' table")]
    MissingInput(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid design brief: {0}")]
    InvalidBrief(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Run failures
    #[error("{step} step failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: Box<DesignError>,
    },

    #[error("Prompt template error: {0}")]
    Prompt(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DesignError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            DesignError::Provider {
                retriable: true,
                ..
            } | DesignError::RateLimited { .. }
        )
    }

    /// Faults that abort a run before the first backend call.
    pub fn is_config_fault(&self) -> bool {
        matches!(
            self,
            DesignError::NoProvider { .. }
                | DesignError::MissingInput(_)
                | DesignError::MissingFields(_)
                | DesignError::InvalidBrief(_)
                | DesignError::Config(_)
        )
    }

    /// Tag an error with the pipeline step it escaped from.
    pub fn at(self, step: Step) -> Self {
        match self {
            already @ DesignError::Step { .. } => already,
            other => DesignError::Step {
                step,
                source: Box::new(other),
            },
        }
    }

    /// The step a run failed in, if the error carries one.
    pub fn step(&self) -> Option<Step> {
        match self {
            DesignError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}
