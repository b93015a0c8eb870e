use std::path::PathBuf;

use {
    anyhow::{Context, Result, bail},
    clap::Args,
    hookrelay_config::HookrelayConfig,
    hookrelay_protocol::InboundEvent,
    hookrelay_webhook::{Error, Forwarder},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::input::read_input;

#[derive(Args)]
pub struct ForwardArgs {
    /// Read events from this file instead of stdin.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Endpoint to notify; repeat for several. Replaces configured urls.
    #[arg(long = "url")]
    urls: Vec<String>,
}

/// Parse one JSON event or a stream of whitespace/newline separated events.
pub fn parse_events(input: &[u8]) -> Result<Vec<InboundEvent>> {
    serde_json::Deserializer::from_slice(input)
        .into_iter::<InboundEvent>()
        .enumerate()
        .map(|(i, event)| event.with_context(|| format!("parsing event #{}", i + 1)))
        .collect()
}

pub async fn handle_forward(args: ForwardArgs, mut config: HookrelayConfig) -> Result<()> {
    if !args.urls.is_empty() {
        config.webhook.urls = args.urls;
    }
    if config.webhook.urls.is_empty() {
        warn!("no webhook urls configured; events will be parsed but not delivered");
    }

    let events = parse_events(&read_input(args.file.as_deref()).await?)?;
    let forwarder = Forwarder::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, abandoning pending deliveries");
            on_signal.cancel();
        }
    });

    let total = events.len();
    let mut failed = 0;
    for event in &events {
        let kind = event.kind();
        match forwarder.forward_with_cancel(event, &cancel).await {
            Ok(report) => {
                info!(kind, endpoints = report.delivered.len(), "event forwarded");
            },
            Err(e @ Error::Cancelled { .. }) => {
                error!(kind, error = %e, "forwarding cancelled");
                bail!("cancelled after {failed} failure(s)");
            },
            Err(e) => {
                error!(kind, error = %e, "failed to forward event");
                failed += 1;
            },
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} event(s) could not be forwarded");
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_object() {
        let events = parse_events(br#"{"type":"connected"}"#).unwrap();
        assert_eq!(events, [InboundEvent::Connected]);
    }

    #[test]
    fn parses_json_lines() {
        let input = br#"{"type":"connected"}
{"type":"presence","from":"1@s","unavailable":true}

{"type":"disconnected"}
"#;
        let kinds: Vec<_> = parse_events(input)
            .unwrap()
            .iter()
            .map(InboundEvent::kind)
            .collect();
        assert_eq!(kinds, ["connected", "presence", "disconnected"]);
    }

    #[test]
    fn reports_the_broken_event() {
        let err = parse_events(b"{\"type\":\"connected\"}\n{\"type\":\"nope\"}").unwrap_err();
        assert!(err.to_string().contains("#2"), "{err}");
    }

    #[test]
    fn empty_input_has_no_events() {
        assert!(parse_events(b"  \n").unwrap().is_empty());
    }
}
