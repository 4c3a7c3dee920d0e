//! trawl - autonomous quiz-solving agent CLI

mod config;
mod prompt;
mod tools;
mod utils;

use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use trawl_agent::{AdmissionGate, Agent, AgentConfig, AgentEvent, ProviderTransport};
use trawl_ai::{Message, Model, Role};

/// trawl - follows a chain of quiz pages, solving and submitting each one
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Starting quiz URL
    #[arg(required_unless_present = "init_config")]
    url: Option<String>,

    /// Reasoning iterations before giving up (default: 5000)
    #[arg(short = 'n', long)]
    max_iterations: Option<u32>,

    /// Model to use (default: openai/gpt-4.1-nano)
    #[arg(short, long)]
    model: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Pick up API_KEY / EMAIL / SECRET from a .env file if present
    dotenv::dotenv().ok();

    let filter = if args.verbose {
        EnvFilter::new("trawl=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = args.config.clone().unwrap_or_else(config::Config::config_path);

    // Initialize config and exit
    if args.init_config {
        let path = config::Config::init(&config_path)
            .with_context(|| format!("Error creating config at {}", config_path.display()))?;
        println!("Config file created at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    let cfg = config::Config::load_from(&config_path);
    let url = args.url.context("a starting URL is required")?;

    let Some(api_key) = cfg.api_key() else {
        eprintln!("Error: No API key found");
        eprintln!();
        eprintln!("Set your API key with: export API_KEY=your-key");
        eprintln!("Or add it to a .env file, or to the config file: trawl --init-config");
        std::process::exit(1);
    };
    let submitter = prompt::Submitter {
        email: cfg.email().context("EMAIL is not set (environment, .env or config)")?,
        secret: cfg.secret().context("SECRET is not set (environment, .env or config)")?,
    };

    // Merge config with CLI args (CLI takes precedence)
    let base_url = args.base_url.unwrap_or_else(|| cfg.base_url().to_string());
    let model_id = args.model.unwrap_or_else(|| cfg.model().to_string());
    let model = Model::new(model_id).with_base_url(&base_url);

    let mut agent_config = AgentConfig::new(model.clone());
    if let Some(limit) = args.max_iterations.or(cfg.max_iterations) {
        agent_config.max_iterations = limit;
    }
    if let Some(retries) = cfg.model_retries {
        agent_config.model_retries = retries;
    }

    let transport = Arc::new(ProviderTransport::with_api_key(api_key.clone()));
    // One gate for the whole process
    let gate = Arc::new(AdmissionGate::new(cfg.admission()));
    let mut agent = Agent::new(agent_config, transport, gate);

    let settings = tools::ToolSettings {
        http: tools::http_client().context("Failed to build HTTP client")?,
        work_dir: cfg.work_dir(),
        renderer: cfg.renderer(),
        installer: cfg.installer(),
        timeout: cfg.run_timeout(),
        base_url,
        api_key,
    };
    for tool in tools::build_all(&settings) {
        agent.add_tool(tool);
    }

    let tool_names = agent.tool_names();
    let system_prompt = prompt::build_system_prompt(&submitter, &tool_names);
    agent.set_system_prompt(system_prompt);

    tracing::info!(model = %model.id, base_url = %model.base_url, work_dir = %settings.work_dir.display(), "configured");

    run_command(agent, &url).await
}

async fn run_command(agent: Agent, url: &str) -> anyhow::Result<()> {
    println!("trawl> {}", url);
    println!();

    let receiver = agent.subscribe();
    let printer = tokio::spawn(print_events(receiver));

    let result = agent.run(url).await;

    // Dropping the agent closes the channel so the printer drains and exits
    drop(agent);
    if let Err(e) = printer.await {
        tracing::debug!("event printer stopped: {}", e);
    }

    let outcome = result?;
    println!(
        "\nTasks completed successfully after {} iterations ({} messages)",
        outcome.iterations,
        outcome.transcript.len()
    );
    Ok(())
}

async fn print_events(mut receiver: broadcast::Receiver<AgentEvent>) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("event printer lagged, skipped {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            AgentEvent::MessageAppended { message } => print_message(&message),
            AgentEvent::ToolExecutionStart { tool_name, .. } => {
                println!("[Running {}...]", tool_name);
            }
            AgentEvent::ToolExecutionEnd {
                tool_name,
                result,
                is_error,
                ..
            } => {
                if is_error {
                    println!("[{} failed: {}]", tool_name, utils::truncate_chars(&result, 500));
                } else {
                    println!("[{}: {}]", tool_name, utils::truncate_chars(&result, 200));
                }
            }
            AgentEvent::RetryScheduled {
                attempt,
                delay_ms,
                error,
            } => {
                println!("[Model unavailable ({}), retry {} in {}ms]", error, attempt, delay_ms);
            }
            AgentEvent::RunEnd { usage, .. } => {
                println!("\n[Tokens: {} in, {} out]", usage.input, usage.output);
            }
            // Run failures are reported once, by main's error return
            AgentEvent::RunStart { .. }
            | AgentEvent::IterationStart { .. }
            | AgentEvent::Error { .. } => {}
        }
    }
}

fn print_message(message: &Message) {
    if message.role() != Role::Assistant {
        return;
    }
    let text = message.text();
    if !text.trim().is_empty() {
        println!("{}", text);
    }
}
