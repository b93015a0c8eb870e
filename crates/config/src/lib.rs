//! Configuration loading, validation and env substitution.
//!
//! Config files: `hookrelay.toml`, `hookrelay.yaml`, or `hookrelay.json`,
//! searched in `./` then `~/.config/hookrelay/`.
//!
//! Supports `${ENV_VAR}` substitution in raw file text and `HOOKRELAY_*`
//! environment overrides.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{FanoutPolicy, HookrelayConfig, MediaConfig, MetricsConfig, StatusPolicy, WebhookConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_config, validate_toml_str},
};
