//! Event routing: one inbound event in, one notification payload out.

use std::{path::PathBuf, sync::Arc};

use {
    chrono::Utc,
    hookrelay_config::HookrelayConfig,
    hookrelay_media::{FsMediaStore, MediaExtractor},
    hookrelay_protocol::InboundEvent,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    message::build_message_payload,
    payload::NotificationPayload,
    presence::build_presence_payload,
    receipt::build_receipt_payload,
};

/// Turns inbound events into notification payloads.
#[derive(Clone)]
pub struct EventDispatcher {
    extractor: Arc<dyn MediaExtractor>,
    media_root: PathBuf,
}

impl EventDispatcher {
    pub fn new(extractor: Arc<dyn MediaExtractor>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            media_root: media_root.into(),
        }
    }

    /// Dispatcher writing media to the configured path on the local disk.
    #[must_use]
    pub fn from_config(config: &HookrelayConfig) -> Self {
        Self::new(Arc::new(FsMediaStore::new()), config.media.path.clone())
    }

    /// Build the payload for `event`.
    ///
    /// Kinds without a webhook representation fail with
    /// [`Error::UnsupportedEvent`]; new kinds must be added here explicitly.
    pub async fn dispatch(&self, event: &InboundEvent) -> Result<NotificationPayload> {
        let payload = match event {
            InboundEvent::Message(message) => NotificationPayload::Message(
                build_message_payload(message, self.extractor.as_ref(), &self.media_root).await?,
            ),
            InboundEvent::Receipt(receipt) => {
                NotificationPayload::Receipt(build_receipt_payload(receipt))
            },
            InboundEvent::Presence(presence) => {
                NotificationPayload::Presence(build_presence_payload(presence, Utc::now()))
            },
            InboundEvent::Connected
            | InboundEvent::Disconnected
            | InboundEvent::LoggedOut { .. }
            | InboundEvent::ChatPresence(_)
            | InboundEvent::CallOffer(_) => return Err(unsupported(event)),
        };

        let event_type = payload.event_type();
        debug!(event_type, "event dispatched");

        #[cfg(feature = "metrics")]
        hookrelay_metrics::counter!(
            hookrelay_metrics::dispatch::EVENTS_DISPATCHED_TOTAL,
            hookrelay_metrics::labels::EVENT_TYPE => event_type
        )
        .increment(1);

        Ok(payload)
    }
}

/// Fail with [`Error::UnsupportedEvent`] unless `event` has a webhook
/// representation. Never touches the media store.
pub fn ensure_supported(event: &InboundEvent) -> Result<()> {
    match event {
        InboundEvent::Message(_) | InboundEvent::Receipt(_) | InboundEvent::Presence(_) => Ok(()),
        InboundEvent::Connected
        | InboundEvent::Disconnected
        | InboundEvent::LoggedOut { .. }
        | InboundEvent::ChatPresence(_)
        | InboundEvent::CallOffer(_) => Err(unsupported(event)),
    }
}

fn unsupported(event: &InboundEvent) -> Error {
    let kind = event.kind();
    warn!(kind, "unsupported event type, not forwarding");

    #[cfg(feature = "metrics")]
    hookrelay_metrics::counter!(
        hookrelay_metrics::dispatch::EVENTS_UNSUPPORTED_TOTAL,
        hookrelay_metrics::labels::EVENT_TYPE => kind
    )
    .increment(1);

    Error::UnsupportedEvent { kind }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        chrono::TimeZone,
        hookrelay_protocol::{
            CallOfferEvent, ChatPresenceEvent, MediaAttachment, MessageContent, MessageEvent,
            PresenceEvent, ReceiptEvent, ReceiptType,
        },
    };

    use super::*;

    fn dispatcher(root: &std::path::Path) -> EventDispatcher {
        EventDispatcher::new(Arc::new(FsMediaStore::new()), root)
    }

    #[tokio::test]
    async fn routes_each_supported_kind() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let message = InboundEvent::Message(MessageEvent::default());
        assert_eq!(d.dispatch(&message).await.unwrap().event_type(), "message");

        let receipt = InboundEvent::Receipt(ReceiptEvent {
            source: Default::default(),
            message_ids: vec!["X".into()],
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            receipt_type: ReceiptType::Read,
        });
        assert_eq!(d.dispatch(&receipt).await.unwrap().event_type(), "receipt");

        let presence = InboundEvent::Presence(PresenceEvent::default());
        assert_eq!(d.dispatch(&presence).await.unwrap().event_type(), "presence");
    }

    #[tokio::test]
    async fn unsupported_kinds_fail_with_their_name() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let cases = [
            (InboundEvent::Connected, "connected"),
            (InboundEvent::Disconnected, "disconnected"),
            (
                InboundEvent::LoggedOut {
                    reason: "device removed".into(),
                },
                "logged_out",
            ),
            (
                InboundEvent::ChatPresence(ChatPresenceEvent::default()),
                "chat_presence",
            ),
            (InboundEvent::CallOffer(CallOfferEvent::default()), "call_offer"),
        ];
        for (event, name) in cases {
            match d.dispatch(&event).await {
                Err(Error::UnsupportedEvent { kind }) => assert_eq!(kind, name),
                other => panic!("expected unsupported for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn ensure_supported_matches_dispatch() {
        assert!(ensure_supported(&InboundEvent::Message(MessageEvent::default())).is_ok());
        assert!(ensure_supported(&InboundEvent::Presence(PresenceEvent::default())).is_ok());
        assert!(matches!(
            ensure_supported(&InboundEvent::CallOffer(CallOfferEvent::default())),
            Err(Error::UnsupportedEvent { kind: "call_offer" })
        ));
        assert!(matches!(
            ensure_supported(&InboundEvent::Connected),
            Err(Error::UnsupportedEvent { kind: "connected" })
        ));
    }

    #[tokio::test]
    async fn media_lands_under_the_media_root() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let event = InboundEvent::Message(MessageEvent {
            message: MessageContent {
                image: Some(MediaAttachment {
                    mime_type: "image/png".into(),
                    data: vec![0x89, b'P', b'N', b'G'],
                    ..MediaAttachment::default()
                }),
                ..MessageContent::default()
            },
            ..MessageEvent::default()
        });

        let NotificationPayload::Message(payload) = d.dispatch(&event).await.unwrap() else {
            panic!("expected a message payload");
        };
        let path = PathBuf::from(payload.image.unwrap());
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), [0x89, b'P', b'N', b'G']);
    }
}
