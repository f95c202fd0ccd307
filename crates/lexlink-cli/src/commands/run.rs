//! Run command implementation.

use crate::cli::{ProviderKind, RunArgs};
use crate::config::{load_pipeline_config, ProviderSettings, API_KEY_VAR};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lexlink_domain::{CaseParagraphInput, LlmProvider};
use lexlink_llm::{OllamaProvider, OpenAiProvider};
use lexlink_pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Execute the run command.
///
/// Ctrl-C cancels the run; whatever was extracted so far is still
/// validated and exported.
pub async fn execute_run(args: RunArgs, formatter: &Formatter) -> Result<()> {
    let mut config = load_pipeline_config(&args)?;
    let paragraphs = read_paragraphs(&args.input)?;
    info!(
        input = %args.input.display(),
        paragraphs = paragraphs.len(),
        "Loaded paragraphs"
    );

    let settings = ProviderSettings::from_env(&args);
    if config.enable_llm && settings.kind == ProviderKind::Openai && settings.api_key.is_none() {
        warn!("{} is not set, running without the LLM-assisted phase", API_KEY_VAR);
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} not set; LLM-assisted extraction disabled",
                API_KEY_VAR
            ))
        );
        config.enable_llm = false;
        config.validate().map_err(CliError::Config)?;
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let outcome = if config.enable_llm {
        match settings.kind {
            ProviderKind::Openai => {
                let mut provider =
                    OpenAiProvider::new(settings.api_key.clone().unwrap_or_default(), &settings.model)?;
                if let Some(url) = &settings.base_url {
                    provider = provider.with_base_url(url);
                }
                run_with(config, Some(provider), &paragraphs, &cancel).await?
            }
            ProviderKind::Ollama => {
                let provider = match &settings.base_url {
                    Some(url) => OllamaProvider::new(url, &settings.model)?,
                    None => OllamaProvider::default_endpoint(&settings.model)?,
                };
                run_with(config, Some(provider), &paragraphs, &cancel).await?
            }
        }
    } else {
        run_with::<OpenAiProvider>(config, None, &paragraphs, &cancel).await?
    };
    watcher.abort();

    println!("{}", formatter.format_links(&outcome.links)?);
    eprintln!();
    eprintln!("{}", outcome.statistics.summary());
    eprintln!();
    eprintln!("{}", formatter.format_exports(&outcome.exports));
    if outcome.statistics.cancelled {
        eprintln!("{}", formatter.warning("Run was cancelled; results are partial"));
    }

    if !outcome.exports.all_written() {
        return Err(CliError::Config(format!(
            "{} artifact(s) could not be written",
            outcome.exports.failures().len()
        )));
    }
    Ok(())
}

async fn run_with<P: LlmProvider>(
    config: PipelineConfig,
    provider: Option<P>,
    paragraphs: &[CaseParagraphInput],
    cancel: &CancellationToken,
) -> Result<PipelineOutcome> {
    let pipeline = Pipeline::new(config)?;
    Ok(match provider {
        Some(provider) => pipeline.with_provider(provider).run(paragraphs, cancel).await,
        None => pipeline.run(paragraphs, cancel).await,
    })
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => {
                    info!("Shutdown signal received, cancelling run");
                    cancel.cancel();
                }
                Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
            }
        }
        _ = cancel.cancelled() => {}
    }
}

/// Read a JSON array of paragraphs.
pub fn read_paragraphs(path: &Path) -> Result<Vec<CaseParagraphInput>> {
    let contents = std::fs::read_to_string(path)?;
    let paragraphs: Vec<CaseParagraphInput> = serde_json::from_str(&contents)?;
    if paragraphs.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} contains no paragraphs",
            path.display()
        )));
    }
    Ok(paragraphs)
}
