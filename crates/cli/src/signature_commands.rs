use std::path::PathBuf;

use {
    anyhow::{Result, bail},
    clap::Args,
    hookrelay_config::HookrelayConfig,
    hookrelay_webhook::{signature_header, verify},
    secrecy::ExposeSecret,
};

use crate::input::read_input;

#[derive(Args)]
pub struct SignArgs {
    /// Body to sign (stdin when omitted).
    #[arg(long)]
    file: Option<PathBuf>,

    /// Shared secret; defaults to `webhook.secret` from the config.
    #[arg(long)]
    secret: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Header value, e.g. `sha256=3b1f...`.
    #[arg(long)]
    signature: String,

    /// Body to check (stdin when omitted).
    #[arg(long)]
    file: Option<PathBuf>,

    /// Shared secret; defaults to `webhook.secret` from the config.
    #[arg(long)]
    secret: Option<String>,
}

fn resolve_secret(flag: Option<String>, config: &HookrelayConfig) -> Result<String> {
    let secret = flag.unwrap_or_else(|| config.webhook.secret.expose_secret().clone());
    if secret.is_empty() {
        bail!("no secret: pass --secret or set webhook.secret / HOOKRELAY_WEBHOOK_SECRET");
    }
    Ok(secret)
}

pub async fn handle_sign(args: SignArgs, config: &HookrelayConfig) -> Result<()> {
    let secret = resolve_secret(args.secret, config)?;
    let body = read_input(args.file.as_deref()).await?;
    println!("{}", signature_header(&body, secret.as_bytes())?);
    Ok(())
}

pub async fn handle_verify(args: VerifyArgs, config: &HookrelayConfig) -> Result<()> {
    let secret = resolve_secret(args.secret, config)?;
    let body = read_input(args.file.as_deref()).await?;
    if !verify(&body, &args.signature, secret.as_bytes()) {
        bail!("signature mismatch");
    }
    println!("signature valid");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use secrecy::Secret;

    use super::*;

    #[test]
    fn flag_wins_over_config() {
        let mut config = HookrelayConfig::default();
        config.webhook.secret = Secret::new("from-config".into());
        assert_eq!(resolve_secret(Some("flag".into()), &config).unwrap(), "flag");
        assert_eq!(resolve_secret(None, &config).unwrap(), "from-config");
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(resolve_secret(None, &HookrelayConfig::default()).is_err());
    }

    #[tokio::test]
    async fn sign_then_verify_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, br#"{"event_type":"presence"}"#).unwrap();

        let body = read_input(Some(path.as_path())).await.unwrap();
        let header = signature_header(&body, b"k").unwrap();

        let args = VerifyArgs {
            signature: header,
            file: Some(path),
            secret: Some("k".into()),
        };
        handle_verify(args, &HookrelayConfig::default()).await.unwrap();
    }
}
