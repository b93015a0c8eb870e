use std::path::Path;

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    hookrelay_config::{
        HookrelayConfig,
        validate::{self, Severity},
    },
    secrecy::Secret,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML (secret redacted).
    Show,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(
    action: ConfigAction,
    path: Option<&Path>,
    config: &HookrelayConfig,
) -> Result<()> {
    match action {
        ConfigAction::Show => show(config),
        ConfigAction::Check { verbose } => check(path, config, verbose),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn redacted(config: &HookrelayConfig) -> HookrelayConfig {
    let mut config = config.clone();
    if config.webhook.has_secret() {
        config.webhook.secret = Secret::new("[REDACTED]".into());
    }
    config
}

fn show(config: &HookrelayConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

fn check(path: Option<&Path>, effective: &HookrelayConfig, verbose: bool) -> Result<()> {
    let mut result = validate::validate(path);

    // Environment overrides can fill in what the file leaves out.
    if !result.has_errors() {
        result.diagnostics = validate::validate_config(effective).diagnostics;
    }

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults and environment.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}
