//! trapcheck - snmptrapd traphandle entry point
//!
//! Reads one notification from stdin, converts it to a Sensu Go event and
//! posts it to the local agent. Meant to be run by snmptrapd:
//!
//! ```text
//! traphandle default /usr/local/bin/trapcheck --config /etc/trapcheck.json
//! ```

use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use trapcheck::{build_event, parse_notification, validate_hostname, Config, SensuClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = Command::new("trapcheck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert snmptrapd notifications into Sensu Go check events")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("trapcheck.json"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Override the configured log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the event instead of posting it to the Sensu agent")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a default configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("trapcheck.json"));

    if matches.get_flag("generate-config") {
        return generate_default_config(&config_path).await;
    }

    let mut config = load_configuration(&config_path).await?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    initialise_logging(&config)?;
    info!("Configuration loaded from: {}", config_path.display());

    config.validate().context("Configuration validation failed")?;

    run(&config, matches.get_flag("dry-run")).await
}

/// Generate a default configuration file
async fn generate_default_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        anyhow::bail!("Configuration file already exists: {}", config_path.display());
    }

    Config::default()
        .save_to_file(config_path)
        .await
        .context("Failed to save default configuration")?;

    println!("Default configuration generated: {}", config_path.display());
    Ok(())
}

/// Load configuration, falling back to built-in defaults if the file is missing
async fn load_configuration(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        // Logging is not initialised yet.
        eprintln!(
            "Configuration file not found: {}, using built-in defaults",
            config_path.display()
        );
        return Ok(Config::default());
    }

    Config::load_from_file(config_path)
        .await
        .with_context(|| format!("Failed to load configuration file {}", config_path.display()))
}

/// Initialise logging. The console layer writes to stderr so stdout only
/// carries the agent response.
fn initialise_logging(config: &Config) -> Result<()> {
    let level = match config.logging.level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let mut layers = Vec::new();

    if config.logging.console_output {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false);
        layers.push(console_layer.boxed());
    }

    if let Some(ref log_file_path) = config.logging.file_output {
        let log_path = Path::new(log_file_path);
        let log_dir = log_path.parent().unwrap_or(Path::new("."));
        let log_filename = log_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("trapcheck.log");

        std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;

        // Each trap is a separate short-lived process, so append to a single
        // file and write synchronously.
        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);

        layers.push(file_layer.boxed());
    }

    if layers.is_empty() {
        // Errors must still reach snmptrapd's stderr
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);
        layers.push(stderr_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();

    Ok(())
}

/// Parse stdin, build the event and deliver it
async fn run(config: &Config, dry_run: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut notification =
        parse_notification(stdin.lock()).context("Failed to parse snmptrapd notification")?;

    validate_hostname(&mut notification, &config.snmptrapd.defaults.device);

    let event = build_event(&notification, config).context("Failed to build Sensu event")?;
    let pretty = event.to_json_pretty().context("Failed to serialise Sensu event")?;
    info!("Sensu Event JSON output:\n{}", pretty);

    if dry_run {
        warn!("Dry run, not posting event to {}", config.events_url());
        println!("{}", pretty);
        return Ok(());
    }

    let client = SensuClient::new(&config.sensu.agent.api).context("Failed to create Sensu client")?;
    let body = client
        .send_event(&event)
        .await
        .with_context(|| format!("Failed to deliver event to {}", client.url()))?;

    println!("{}", body);
    Ok(())
}
