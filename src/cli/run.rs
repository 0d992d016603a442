// src/cli/run.rs — Default command: run one design exploration

use std::sync::Arc;

use super::export::RunExport;
use super::{Cli, OutputFormat};
use crate::core::backend::StepClient;
use crate::core::brief::DesignBrief;
use crate::core::orchestrator::Orchestrator;
use crate::core::types::ExplorationConfig;
use crate::infra::config::{Config, ModelConfig};
use crate::provider::resolver;
use crate::provider::roles::ModelRoles;
use crate::provider::ModelRef;

/// Apply `-m`: `provider/model` switches provider, a bare id only the model.
pub fn apply_model_flag(model: &mut ModelConfig, flag: Option<&str>) {
    let Some(flag) = flag else { return };
    match ModelRef::parse(flag) {
        Some(r) if resolver::find_known(&r.provider).is_some() || model.base_url.is_some() => {
            if !r.provider.eq_ignore_ascii_case(&model.provider) {
                // A different provider's key variable and endpoint apply.
                model.api_key_env = None;
                model.base_url = None;
            }
            model.provider = r.provider;
            model.model = Some(r.model);
        }
        // Model ids such as "meta-llama/Llama-3.3-70B" belong to the configured provider.
        _ => model.model = Some(flag.to_string()),
    }
}

/// Exploration knobs from config, overridden by CLI flags.
pub fn exploration_config(cli: &Cli, config: &Config) -> ExplorationConfig {
    let mut exploration = ExplorationConfig::from(&config.exploration);
    if let Some(n) = cli.candidates {
        exploration.candidate_count = n;
    }
    if let Some(k) = cli.top_k {
        exploration.top_k = k;
    }
    exploration.temperature = config.model.temperature;
    exploration.max_tokens = config.model.max_tokens;
    exploration
}

/// Load the brief (or the sample) and apply `-i`, which outranks the brief.
pub fn load_brief(cli: &Cli) -> anyhow::Result<DesignBrief> {
    let mut brief = match &cli.brief {
        Some(path) => DesignBrief::load(path)
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?,
        None => DesignBrief::sample(),
    };
    if let Some(i) = cli.iterate {
        brief.max_iterations = Some(i);
    }
    Ok(brief)
}

/// Run the pipeline and print the report (or the JSON export).
pub async fn run_exploration(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let brief = load_brief(cli)?;
    let exploration = exploration_config(cli, config);
    exploration.validate()?;

    let mut model_config = config.model.clone();
    apply_model_flag(&mut model_config, cli.model.as_deref());

    // A missing key fails here, before any backend traffic.
    let provider = resolver::resolve_provider(&model_config, &config.retry)?;
    let roles = ModelRoles::from_config(provider.default_model(), &config.roles);
    let provider_label = format!("{}/{}", provider.id(), provider.default_model());

    let client = Arc::new(
        StepClient::new(provider, roles)
            .with_sampling(exploration.temperature, exploration.max_tokens),
    );

    let mut orchestrator = Orchestrator::new(client, exploration);
    if !cli.quiet {
        eprintln!(
            "[designloop] {} | model: {} | max iterations: {}",
            brief.title,
            provider_label,
            brief
                .max_iterations
                .unwrap_or(config.exploration.max_iterations),
        );
        orchestrator = orchestrator.with_progress(super::progress::terminal_progress());
    }

    let started_at = chrono::Utc::now();
    let state = orchestrator.run(brief).await?;
    let finished_at = chrono::Utc::now();

    let report = state.report.clone().unwrap_or_default();
    let export = RunExport::new(state, provider_label, started_at, finished_at);

    if let Some(path) = &cli.json_out {
        export.write(path)?;
        if !cli.quiet {
            eprintln!("[export] wrote {}", path.display());
        }
    }

    match cli.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", export.to_json()?),
    }
    Ok(())
}

/// `designloop brief`: write the sample brief.
pub fn run_brief(output: Option<&std::path::Path>) -> anyhow::Result<()> {
    let text = crate::core::brief::SAMPLE_BRIEF_TOML;
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Wrote sample brief to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
