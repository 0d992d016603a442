// src/provider/resolver.rs — Provider resolution from config and environment

use std::sync::Arc;

use super::openai_compat::OpenAICompatProvider;
use super::retry::{BackoffPolicy, RetryProvider};
use super::ModelProvider;
use crate::infra::config::{ModelConfig, RetrySettings};
use crate::infra::errors::DesignError;

/// An OpenAI-compatible endpoint we know how to reach out of the box.
#[derive(Debug, Clone, Copy)]
pub struct KnownProvider {
    pub id: &'static str,
    pub name: &'static str,
    pub env_var: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
}

pub const KNOWN_PROVIDERS: &[KnownProvider] = &[
    KnownProvider {
        id: "groq",
        name: "Groq",
        env_var: "GROQ_API_KEY",
        base_url: "https://api.groq.com/openai/v1",
        default_model: "llama-3.3-70b-versatile",
    },
    KnownProvider {
        id: "openai",
        name: "OpenAI",
        env_var: "OPENAI_API_KEY",
        base_url: "https://api.openai.com/v1",
        default_model: "gpt-4.1-mini",
    },
    KnownProvider {
        id: "openrouter",
        name: "OpenRouter",
        env_var: "OPENROUTER_API_KEY",
        base_url: "https://openrouter.ai/api/v1",
        default_model: "auto",
    },
    KnownProvider {
        id: "together",
        name: "Together",
        env_var: "TOGETHER_API_KEY",
        base_url: "https://api.together.xyz/v1",
        default_model: "meta-llama/Llama-3.3-70B-Instruct-Turbo",
    },
    KnownProvider {
        id: "deepseek",
        name: "DeepSeek",
        env_var: "DEEPSEEK_API_KEY",
        base_url: "https://api.deepseek.com/v1",
        default_model: "deepseek-chat",
    },
];

pub fn find_known(id: &str) -> Option<&'static KnownProvider> {
    KNOWN_PROVIDERS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Resolve the configured provider, reading API keys from the environment.
pub fn resolve_provider(
    model: &ModelConfig,
    retry: &RetrySettings,
) -> Result<Arc<dyn ModelProvider>, DesignError> {
    resolve_with(model, retry, |var| std::env::var(var).ok())
}

/// Resolve with an explicit key lookup. A missing key is a configuration
/// fault and no network traffic happens before it is reported.
pub fn resolve_with(
    model: &ModelConfig,
    retry: &RetrySettings,
    lookup_key: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn ModelProvider>, DesignError> {
    let known = find_known(&model.provider);

    let base_url = model
        .base_url
        .clone()
        .or_else(|| known.map(|k| k.base_url.to_string()))
        .ok_or_else(|| {
            DesignError::Config(format!(
                "Unknown provider '{}' and no [model].base_url configured",
                model.provider
            ))
        })?;

    let env_var = model
        .api_key_env
        .clone()
        .or_else(|| known.map(|k| k.env_var.to_string()))
        .unwrap_or_else(|| format!("{}_API_KEY", model.provider.to_uppercase()));

    let api_key = lookup_key(&env_var)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| DesignError::NoProvider {
            provider: model.provider.clone(),
            env_var: env_var.clone(),
        })?;

    let default_model = model
        .model
        .clone()
        .or_else(|| known.map(|k| k.default_model.to_string()))
        .ok_or_else(|| {
            DesignError::Config(format!(
                "No model configured for provider '{}'",
                model.provider
            ))
        })?;

    let name = known
        .map(|k| k.name.to_string())
        .unwrap_or_else(|| model.provider.clone());

    tracing::info!(
        provider = %model.provider,
        model = %default_model,
        base_url = %base_url,
        "Resolved provider",
    );

    let inner: Arc<dyn ModelProvider> = Arc::new(OpenAICompatProvider::new(
        model.provider.clone(),
        name,
        api_key,
        base_url,
        default_model,
    ));
    Ok(Arc::new(RetryProvider::new(
        inner,
        BackoffPolicy::from(retry),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_keys(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_find_known_case_insensitive() {
        assert_eq!(find_known("GROQ").map(|p| p.id), Some("groq"));
        assert!(find_known("nope").is_none());
    }

    #[test]
    fn test_missing_key_is_config_fault() {
        let err = resolve_with(&ModelConfig::default(), &RetrySettings::default(), no_keys)
            .err()
            .unwrap();
        assert!(err.is_config_fault());
        match err {
            DesignError::NoProvider { provider, env_var } => {
                assert_eq!(provider, "groq");
                assert_eq!(env_var, "GROQ_API_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = resolve_with(&ModelConfig::default(), &RetrySettings::default(), |_| {
            Some("   ".into())
        });
        assert!(matches!(result, Err(DesignError::NoProvider { .. })));
    }

    #[test]
    fn test_resolves_default_groq_model() {
        let provider = resolve_with(&ModelConfig::default(), &RetrySettings::default(), |var| {
            (var == "GROQ_API_KEY").then(|| "gsk-test".to_string())
        })
        .unwrap();
        assert_eq!(provider.id(), "groq");
        assert_eq!(provider.default_model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_custom_endpoint_needs_base_url() {
        let cfg = ModelConfig {
            provider: "lab".into(),
            model: Some("local".into()),
            ..Default::default()
        };
        let result = resolve_with(&cfg, &RetrySettings::default(), |_| Some("k".into()));
        assert!(matches!(result, Err(DesignError::Config(_))));
    }

    #[test]
    fn test_custom_endpoint_and_key_env() {
        let cfg = ModelConfig {
            provider: "lab".into(),
            model: Some("local-70b".into()),
            base_url: Some("http://localhost:8000/v1".into()),
            api_key_env: Some("LAB_TOKEN".into()),
            ..Default::default()
        };
        let provider = resolve_with(&cfg, &RetrySettings::default(), |var| {
            (var == "LAB_TOKEN").then(|| "t".to_string())
        })
        .unwrap();
        assert_eq!(provider.id(), "lab");
        assert_eq!(provider.default_model(), "local-70b");
    }
}
