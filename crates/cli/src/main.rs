mod config_commands;
mod forward_commands;
mod input;
mod signature_commands;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    hookrelay_config::HookrelayConfig,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "hookrelay", about = "hookrelay: signed webhook forwarding for gateway events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./hookrelay.toml, then ~/.config/hookrelay/).
    #[arg(long, global = true, env = "HOOKRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward events (one JSON object or JSON lines) to the webhooks.
    Forward(forward_commands::ForwardArgs),
    /// Print the X-Hub-Signature-256 header for a body.
    Sign(signature_commands::SignArgs),
    /// Check a body against an X-Hub-Signature-256 header.
    Verify(signature_commands::VerifyArgs),
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays usable for command output.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Explicit `--config` must load; discovery falls back to defaults.
/// `HOOKRELAY_*` overrides apply either way.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<HookrelayConfig> {
    let mut config = match path {
        Some(path) => hookrelay_config::load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => hookrelay_config::discover_and_load(),
    };
    hookrelay_config::apply_env_overrides(&mut config);
    debug!(
        urls = config.webhook.urls.len(),
        media = %config.media.path.display(),
        "config loaded"
    );
    Ok(config)
}

#[cfg(feature = "metrics")]
fn init_metrics(config: &HookrelayConfig) -> anyhow::Result<hookrelay_metrics::MetricsHandle> {
    Ok(hookrelay_metrics::init_metrics(
        hookrelay_metrics::MetricsRecorderConfig {
            enabled: config.metrics.enabled,
            global_labels: vec![
                ("service".into(), "hookrelay".into()),
                ("version".into(), env!("CARGO_PKG_VERSION").into()),
            ],
        },
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "hookrelay starting");

    let config = match (&cli.command, load_config(cli.config.as_deref())) {
        (_, Ok(config)) => config,
        // `config check` reports the broken file itself.
        (Commands::Config { .. }, Err(e)) => {
            debug!(error = %e, "config failed to load");
            HookrelayConfig::default()
        },
        (_, Err(e)) => return Err(e),
    };

    match cli.command {
        Commands::Forward(args) => {
            #[cfg(feature = "metrics")]
            let metrics = init_metrics(&config)?;

            let result = forward_commands::handle_forward(args, config).await;

            #[cfg(feature = "metrics")]
            {
                let rendered = metrics.render();
                if !rendered.is_empty() {
                    tracing::info!("metrics snapshot:\n{rendered}");
                }
            }
            result
        },
        Commands::Sign(args) => signature_commands::handle_sign(args, &config).await,
        Commands::Verify(args) => signature_commands::handle_verify(args, &config).await,
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref(), &config)
        },
    }
}
