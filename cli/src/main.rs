//! CLI entrypoint for bizeval
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use bizeval_application::{
    EvaluationPipeline, ModelClient, NoProgress, NoResultSink, PipelineProgress, ResultSink,
};
use bizeval_domain::{EvaluatorRegistry, Scenario};
use bizeval_infrastructure::{
    ConfigLoader, FileConfig, FileModelConfig, FileOutputFormat, FileProviderKind,
    JsonlResultSink, OpenAiCompatClient, OpenAiCompatSettings, ScenarioCatalog,
    ScriptedModelClient, SimulatedTools,
};
use bizeval_presentation::{
    Cli, ConsoleFormatter, JsonFormatter, OutputFormat, ProgressReporter, ReportFormatter,
    SimpleProgress, disable_color,
};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DRY_RUN_MODEL: &str = "scripted";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        println!("Configuration sources (in priority order):");
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("  {}", line);
        }
        return Ok(());
    }

    info!("Starting bizeval");

    let mut config = ConfigLoader::load(cli.config.as_deref())
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;
    apply_overrides(&mut config, &cli);
    if cli.no_color || !config.output.color {
        disable_color();
    }

    // === Scenarios ===
    let mut catalog = if config.scenarios.include_builtin {
        ScenarioCatalog::builtin()?
    } else {
        ScenarioCatalog::new()
    };
    if let Some(dir) = &config.scenarios.directory {
        catalog = catalog.with_directory(dir)?;
    }

    if cli.list_scenarios {
        print_scenarios(&catalog);
        return Ok(());
    }

    let mut scenarios = catalog.select(&config.scenarios.select)?;
    if let Some(prompt) = &config.evaluation.system_prompt {
        for scenario in scenarios.iter_mut().filter(|s| s.system_prompt.is_none()) {
            scenario.system_prompt = Some(prompt.clone());
        }
    }

    // === Dependency Injection ===
    let evaluation = config.to_evaluation_config()?;
    let registry = EvaluatorRegistry::standard_with_thresholds(config.performance.to_thresholds()?);
    let tools = Arc::new(SimulatedTools::standard()?);
    let models = if cli.dry_run {
        let client: Arc<dyn ModelClient> =
            Arc::new(ScriptedModelClient::new(DRY_RUN_MODEL).with_playbook(&scenarios));
        vec![client]
    } else {
        build_models(&config.models, &cli.model, &scenarios)?
    };

    let pipeline = EvaluationPipeline::new(models, scenarios, tools, registry, evaluation)
        .context("Invalid evaluation configuration")?;

    let sink: Box<dyn ResultSink> = match &config.output.results_path {
        Some(path) => Box::new(
            JsonlResultSink::new(path)
                .with_context(|| format!("Could not create {}", path.display()))?,
        ),
        None => Box::new(NoResultSink),
    };
    let progress: Box<dyn PipelineProgress> = if cli.quiet || !config.output.progress {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, cancelling (press Ctrl+C again to exit immediately)");
            signal_token.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    let output = pipeline
        .run(progress.as_ref(), sink.as_ref(), cancel)
        .await;

    let formatter: Box<dyn ReportFormatter> = match config.output.format {
        FileOutputFormat::Text => Box::new(ConsoleFormatter),
        FileOutputFormat::Json => Box::new(JsonFormatter),
    };
    println!("{}", formatter.format(&output.report));

    if output.cancelled {
        warn!("Evaluation was cancelled; the report is partial");
    }
    Ok(())
}

/// Initialize logging based on verbosity level, optionally into a file
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// Command-line flags take precedence over every configuration source
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(runs) = cli.runs {
        config.evaluation.runs = runs;
    }
    if let Some(concurrency) = cli.concurrency {
        config.evaluation.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.evaluation.timeout_seconds = timeout;
    }
    if let Some(seed) = cli.seed {
        config.tools.seed = seed;
    }
    for (tool, rate) in &cli.error_rate {
        config.tools.error_rates.insert(tool.clone(), *rate);
    }
    if !cli.scenario.is_empty() {
        config.scenarios.select = cli.scenario.clone();
    }
    if let Some(dir) = &cli.scenario_dir {
        config.scenarios.directory = Some(dir.clone());
    }
    if let Some(path) = &cli.output {
        config.output.results_path = Some(path.clone());
    }
    if let Some(format) = cli.format {
        config.output.format = match format {
            OutputFormat::Text => FileOutputFormat::Text,
            OutputFormat::Json => FileOutputFormat::Json,
        };
    }
}

/// Instantiate the configured models, keeping only `selected` when given
fn build_models(
    configured: &[FileModelConfig],
    selected: &[String],
    scenarios: &[Scenario],
) -> Result<Vec<Arc<dyn ModelClient>>> {
    if configured.is_empty() {
        bail!("No models configured. Add [[models]] to bizeval.toml or use --dry-run.");
    }
    if let Some(unknown) = selected
        .iter()
        .find(|id| !configured.iter().any(|m| &m.id == *id))
    {
        bail!("Model '{}' is not configured", unknown);
    }

    configured
        .iter()
        .filter(|m| selected.is_empty() || selected.contains(&m.id))
        .map(|m| -> Result<Arc<dyn ModelClient>> {
            match m.provider {
                FileProviderKind::Scripted => Ok(Arc::new(
                    ScriptedModelClient::new(&m.id).with_playbook(scenarios),
                )),
                FileProviderKind::OpenaiCompat => {
                    Ok(Arc::new(OpenAiCompatClient::new(openai_settings(m))?))
                }
            }
        })
        .collect()
}

fn openai_settings(model: &FileModelConfig) -> OpenAiCompatSettings {
    let mut settings = OpenAiCompatSettings::new(&model.id, model.model_name());
    if let Some(url) = &model.base_url {
        settings = settings.with_base_url(url);
    }
    if let Some(var) = &model.api_key_env {
        match std::env::var(var) {
            Ok(key) => settings = settings.with_api_key(key),
            Err(_) => warn!("{} is not set; calling {} without an API key", var, model.id),
        }
    }
    if let Some(temperature) = model.temperature {
        settings.temperature = temperature;
    }
    if let Some(max_tokens) = model.max_tokens {
        settings.max_tokens = max_tokens;
    }
    if let Some(secs) = model.request_timeout_seconds {
        settings.request_timeout = Duration::from_secs(secs);
    }
    settings
}

fn print_scenarios(catalog: &ScenarioCatalog) {
    for scenario in catalog.all() {
        let tools: Vec<&str> = scenario.offered_tool_ids().into_iter().collect();
        println!(
            "{:<28} {:<8} {} turns  [{}]",
            scenario.id,
            scenario.complexity.as_str(),
            scenario.turns.len(),
            tools.join(", ")
        );
        println!("    {}", scenario.name);
    }
}
