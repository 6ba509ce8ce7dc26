use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use novelist::core::{StaticRetriever, StaticSummarizer, Value};
use novelist::llm::{OllamaClient, OpenAiCompatibleClient};
use novelist::{
    CancellationToken, ExecutionMode, FileCheckpointer, GenerationBackend, Orchestrator,
    OrchestratorConfig, ProcessRequest, RetryingBackend, RunParameters,
};

#[derive(Parser, Debug)]
#[command(name = "novelist", version, about = "Resumable LLM fiction generation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one instruction through the pipeline and print the result.
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Ollama,
    Openai,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Instruction for this run. May be empty when resuming.
    #[arg(default_value = "")]
    instruction: String,

    #[arg(long, env = "NOVELIST_BACKEND", value_enum, default_value = "ollama")]
    backend: Backend,

    #[arg(long, env = "NOVELIST_BASE_URL", default_value = "http://localhost:11434")]
    base_url: String,

    #[arg(long, env = "NOVELIST_MODEL", default_value = "qwen2.5")]
    model: String,

    #[arg(long, env = "NOVELIST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "NOVELIST_CHECKPOINT_DIR", default_value = "./data/checkpoints")]
    checkpoint_dir: PathBuf,

    /// Locked setting as `key=value`; repeatable.
    #[arg(long = "lock", value_parser = parse_key_value)]
    locks: Vec<(String, String)>,

    /// File with one core-knowledge snippet per line.
    #[arg(long)]
    knowledge: Option<PathBuf>,

    /// File with one prior-chapter summary per line, most recent first.
    #[arg(long)]
    summaries: Option<PathBuf>,

    /// Prose to continue from.
    #[arg(long)]
    existing: Option<PathBuf>,

    #[arg(long)]
    task_id: Option<String>,

    #[arg(long)]
    resume_from: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    max_tokens: Option<u32>,

    #[arg(long, default_value_t = 2)]
    max_refinements: u32,

    /// Extra attempts after a transient backend failure (0 disables retrying).
    #[arg(long, default_value_t = 2)]
    retries: usize,

    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Use the sequential driver instead of the graph engine.
    #[arg(long)]
    sequential: bool,

    /// Print the stage graph as Graphviz DOT and exit.
    #[arg(long)]
    print_graph: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn backend(args: &GenerateArgs) -> Result<Arc<dyn GenerationBackend>> {
    let timeout = Duration::from_secs(args.timeout_secs);
    let backend: Arc<dyn GenerationBackend> = match args.backend {
        Backend::Ollama => Arc::new(RetryingBackend::with_retries(
            OllamaClient::with_timeout(args.base_url.clone(), args.model.clone(), timeout)?,
            args.retries,
        )),
        Backend::Openai => {
            let mut builder = OpenAiCompatibleClient::builder()
                .base_url(&args.base_url)?
                .default_model(args.model.clone())
                .timeout(timeout);
            if let Some(key) = &args.api_key {
                builder = builder.api_key(key.clone());
            }
            Arc::new(RetryingBackend::with_retries(builder.build()?, args.retries))
        }
    };
    Ok(backend)
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config = OrchestratorConfig {
        max_refinements: args.max_refinements,
        execution: if args.sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Graph
        },
        ..OrchestratorConfig::default()
    };

    let mut builder = Orchestrator::builder()
        .backend(backend(&args)?)
        .checkpointer(FileCheckpointer::new(&args.checkpoint_dir))
        .config(config);
    if let Some(path) = &args.knowledge {
        builder = builder.retriever(StaticRetriever::new(read_lines(path)?));
    }
    if let Some(path) = &args.summaries {
        builder = builder.summarizer(StaticSummarizer::new(read_lines(path)?));
    }
    let orchestrator = builder.build()?;

    if args.print_graph {
        match orchestrator.graph_program() {
            Some(program) => println!("{}", program.to_dot()),
            None => bail!("graph engine is disabled"),
        }
        return Ok(());
    }

    if args.instruction.is_empty() && args.resume_from.is_none() {
        bail!("an instruction is required unless --resume-from is given");
    }

    let mut params = RunParameters::default();
    for (key, value) in &args.locks {
        params
            .locked_settings
            .insert(key.clone(), Value::String(value.clone()));
    }
    if let Some(path) = &args.existing {
        let existing = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        params.existing_content = Some(existing);
    }
    params.task_id = args.task_id.clone();
    params.temperature = args.temperature;
    params.max_tokens = args.max_tokens;

    let mut request = ProcessRequest::new(args.instruction.clone()).with_params(params);
    request.resume_from = args.resume_from.clone();

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let state = orchestrator
        .process_with_cancellation(request, token)
        .await
        .context("run interrupted; resume from the last checkpoint")?;

    info!(task_id = state.task_id().unwrap_or_default(), "run complete");
    println!("{}", state.output);
    println!();
    println!("task_id: {}", state.task_id().unwrap_or_default());
    println!("task_type: {}", state.task_type);
    println!("refine_count: {}", state.refine_count());
    if let Some(verdict) = &state.validation_result {
        println!("validation: {}", serde_json::to_string(verdict)?);
    }
    for message in &state.messages {
        println!("  - {message}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Generate(args) => generate(args).await,
    }
}
