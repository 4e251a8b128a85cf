//! Replay a scripted session without a host.
//!
//! Each directive the session issues is printed to stdout in its slash
//! command form; notices and diagnostics go to stderr through `tracing`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use lorekeys_core::config::{load_config, LoggingConfig};
use lorekeys_core::error::ConfigError;
use lorekeys_core::store::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore};
use lorekeys_engine::error::EngineError;
use lorekeys_engine::replay::{run_script_with, Script, ScriptError};
use lorekeys_engine::session::Session;
use lorekeys_gateway::directive::Directive;
use lorekeys_gateway::error::GatewayError;
use lorekeys_gateway::gateway::CommandGateway;
use lorekeys_gateway::interpreter::CommandInterpreter;
use lorekeys_gateway::notice::TracingNoticeSink;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lorekeys-replay", about = "Run a lorekeys session script and print the directives it issues")]
struct Args {
    /// Config file; defaults to the standard config location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON settings file holding snippets and chains. Without one the
    /// built-in defaults are used and nothing is written.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// YAML script to run.
    script: PathBuf,
}

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Interpreter that prints every directive and accepts it.
struct PrintInterpreter;

#[async_trait]
impl CommandInterpreter for PrintInterpreter {
    async fn execute(&self, directive: &Directive) -> Result<(), GatewayError> {
        println!("{}", directive.render());
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lorekeys-replay: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), ReplayError> {
    let (config, config_path) = load_config(args.config.as_deref())?;
    init_logging(&config.logging);
    if let Some(path) = &config_path {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let script = Script::load(&args.script)?;

    let store: Arc<dyn SettingsStore> = match args.settings.or_else(|| config.settings.path.clone()) {
        Some(path) => Arc::new(JsonFileSettingsStore::new(path)),
        None => Arc::new(MemorySettingsStore::new()),
    };
    let gateway = CommandGateway::new(Arc::new(PrintInterpreter), Arc::new(TracingNoticeSink));
    let mut session = Session::create(store, gateway, &config)?;

    let reports = run_script_with(&mut session, &script, |report| {
        if let Some(status) = &report.status {
            println!("# step {}: status", report.index);
            print!("{status}");
        }
    })
    .await;
    let failed = reports.iter().filter(|report| report.error.is_some()).count();
    println!("# final status");
    print!("{}", session.status());
    tracing::info!(steps = reports.len(), failed, "replay finished");

    session.dispose();
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
