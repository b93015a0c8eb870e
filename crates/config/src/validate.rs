//! Configuration validation engine.
//!
//! Validates TOML configuration text against the known schema, detects
//! unknown/misspelled fields, and reports delivery and security problems.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {secrecy::ExposeSecret, url::Url};

use crate::schema::HookrelayConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "endpoint",
    /// "security", "retry", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "webhook.urls[1]"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        (
            "webhook",
            Struct(HashMap::from([
                ("urls", Leaf),
                ("secret", Leaf),
                ("timeout_secs", Leaf),
                ("max_attempts", Leaf),
                ("initial_backoff_ms", Leaf),
                ("status_policy", Leaf),
                ("fanout", Leaf),
            ])),
        ),
        ("media", Struct(HashMap::from([("path", Leaf)]))),
        ("metrics", Struct(HashMap::from([("enabled", Leaf)]))),
    ]))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered default
/// location when `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let result = match std::fs::read_to_string(&actual_path) {
        Ok(_) if !is_toml => match crate::loader::load_config(&actual_path) {
            Ok(cfg) => validate_config(&cfg),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    e.to_string(),
                )],
                config_path: None,
            },
        },
        Ok(content) => validate_toml_str(&crate::env_subst::substitute_env(&content)),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };

    ValidationResult {
        config_path: Some(actual_path),
        ..result
    }
}

/// Validate TOML text without file-system side effects.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    // 3. Types, then semantics on the parsed config
    match toml::from_str::<HookrelayConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Semantic checks on an already-loaded config (e.g. after env overrides).
#[must_use]
pub fn validate_config(config: &HookrelayConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_semantics(config, &mut diagnostics);
    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => {
                check_unknown_fields(child_value, child_schema, &path, diagnostics);
            },
            None => {
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    path,
                    message,
                ));
            },
        }
    }
}

fn check_semantics(config: &HookrelayConfig, diagnostics: &mut Vec<Diagnostic>) {
    let webhook = &config.webhook;

    if webhook.urls.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "endpoint",
            "webhook.urls",
            "no webhook urls configured; events will not be forwarded",
        ));
    }

    for (i, raw) in webhook.urls.iter().enumerate() {
        let path = format!("webhook.urls[{i}]");
        match Url::parse(raw) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "endpoint",
                    path,
                    format!("unsupported scheme \"{}\"", url.scheme()),
                ));
            },
            Ok(url) if url.scheme() == "http" && !is_loopback(&url) => {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "security",
                    path,
                    "plain http to a non-local host exposes payloads in transit",
                ));
            },
            Ok(_) => {},
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "endpoint",
                    path,
                    format!("invalid url: {e}"),
                ));
            },
        }
    }

    if !webhook.urls.is_empty() && webhook.secret.expose_secret().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "security",
            "webhook.secret",
            "a signing secret is required when webhook urls are configured",
        ));
    }

    if webhook.max_attempts == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "retry",
            "webhook.max_attempts",
            "must be at least 1",
        ));
    }

    if webhook.timeout_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "retry",
            "webhook.timeout_secs",
            "must be at least 1",
        ));
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
