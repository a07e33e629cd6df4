use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::future::try_join_all;
use scp_provider::config::ProviderConfig;
use scp_provider::context::Context;
use scp_provider::provider::Provider;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Samsung Cloud Platform provider
#[derive(Parser, Debug)]
#[command(name = "scp-provider", version = scp_provider::VERSION, about, long_about = None)]
struct Args {
    /// Config file (YAML or JSON); defaults to <config_dir>/scp-provider/config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the schema of every resource type and data source as JSON
    Schema,
    /// Configure the provider and verify access to the project
    Check,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// File logging; stdout stays reserved for the host
fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG directives refine the chosen level per target
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("scp-provider {} started with log level: {:?}", scp_provider::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("scp-provider").join("scp-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".scp-provider").join("scp-provider.log");
    }
    PathBuf::from("scp-provider.log")
}

fn print_schema(provider: &Provider) -> Result<()> {
    let catalog = provider.schema();
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

async fn check(provider: &mut Provider, config: &ProviderConfig) -> Result<()> {
    let diags = provider.configure(config);
    if diags.has_errors() {
        bail!("configuration rejected: {}", diags);
    }
    let client = provider.client()?;

    let ctx = Context::new();
    let info = client
        .project()
        .info(&ctx)
        .await
        .context("Failed to fetch project info")?;

    let products = client.product();
    let groups = try_join_all(
        info.service_zones
            .iter()
            .map(|zone| products.list_groups(&ctx, &zone.service_zone_id, None, None)),
    )
    .await
    .context("Failed to list product groups")?;

    println!(
        "project {} ({}) state {}",
        info.project_name, info.project_id, info.project_state
    );
    for (zone, groups) in info.service_zones.iter().zip(&groups) {
        println!(
            "  {:<20} {:<24} {:<20} {} product groups",
            zone.service_zone_location,
            zone.service_zone_name,
            zone.service_zone_id,
            groups.contents.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut provider = Provider::new();
    match args.command {
        Command::Schema => print_schema(&provider),
        Command::Check => {
            let config = ProviderConfig::load(args.config.as_deref())?;
            check(&mut provider, &config).await
        }
    }
}
