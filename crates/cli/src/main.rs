mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use pd_buddy_api::error::ApiError;
use pd_buddy_api::{PagerDutyClient, DEFAULT_BASE_URL};
use pd_buddy_config::Config;
use pd_buddy_output::{OutputFormat, OutputRenderer};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pd-buddy", version, about = "PagerDuty tools", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ~/.pd.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: PdCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum PdCommand {
    /// Incident commands
    Incident(commands::incident::IncidentArgs),
    /// On-call schedule commands
    Schedule(commands::schedule::ScheduleArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            if let Some(hint) = suggestion(&err) {
                eprintln!("\nHint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.debug)?;

    let config = Config::load(cli.config.as_ref())?;
    let client = build_client(&config)?;
    let renderer = OutputRenderer::new(cli.output);

    match cli.command {
        PdCommand::Incident(args) => {
            commands::incident::execute(
                args,
                commands::incident::IncidentContext {
                    client,
                    renderer: &renderer,
                },
            )
            .await
        }
        PdCommand::Schedule(args) => {
            commands::schedule::execute(
                args,
                commands::schedule::ScheduleContext {
                    client,
                    renderer: &renderer,
                },
            )
            .await
        }
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,pd_buddy=debug,pd_buddy_api=debug,pd_buddy_bulk=debug,pd_buddy_config=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

fn build_client(config: &Config) -> Result<PagerDutyClient> {
    let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    Ok(PagerDutyClient::new(base_url, config.authtoken.clone())?)
}

/// First hint offered by an API error anywhere in the chain.
fn suggestion(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .find_map(ApiError::suggestion)
}
