//! Message event → `message` payload.

use std::path::Path;

use {
    hookrelay_media::MediaExtractor,
    hookrelay_protocol::{ContextInfo, MediaKind, MessageContent, MessageEvent},
    tracing::error,
};

use crate::{
    error::{Error, Result},
    payload::{MessagePayload, MessageText, Reaction, format_timestamp, non_empty},
};

/// Build the payload for a message, storing every attached medium under
/// `media_root`.
///
/// A single failed extraction fails the whole payload.
pub async fn build_message_payload(
    event: &MessageEvent,
    extractor: &dyn MediaExtractor,
    media_root: &Path,
) -> Result<MessagePayload> {
    let content = &event.message;
    let from = event.info.source.source_string();

    let mut payload = MessagePayload {
        from: non_empty(&from),
        message: message_text(event),
        pushname: non_empty(&event.info.push_name),
        reaction: reaction(content),
        view_once: event.is_view_once,
        forwarded: is_forwarded(content),
        timestamp: event.info.timestamp.as_ref().map(format_timestamp),
        contact: content.contact.clone(),
        list: content.list.clone(),
        live_location: content.live_location.clone(),
        location: content.location.clone(),
        order: content.order.clone(),
        ..MessagePayload::default()
    };

    for &kind in MediaKind::ALL {
        let Some(media) = content.media(kind) else {
            continue;
        };
        let path = extractor
            .extract(media_root, kind, media)
            .await
            .map_err(|source| {
                error!(from = %from, %kind, error = %source, "failed to extract media");
                Error::MediaExtraction { kind, source }
            })?;
        payload.set_media_path(kind, path.display().to_string());

        #[cfg(feature = "metrics")]
        hookrelay_metrics::counter!(
            hookrelay_metrics::dispatch::MEDIA_EXTRACTED_TOTAL,
            hookrelay_metrics::labels::MEDIA_KIND => kind.as_str()
        )
        .increment(1);
    }

    Ok(payload)
}

/// Text precedence: extended text, plain conversation, then the caption of
/// an image, video or document.
fn message_text(event: &MessageEvent) -> Option<MessageText> {
    let content = &event.message;

    let extended = content
        .extended_text
        .as_ref()
        .filter(|ext| !ext.text.is_empty());

    let (text, context) = match extended {
        Some(ext) => (ext.text.as_str(), ext.context_info.as_ref()),
        None => (plain_text(content)?, None),
    };

    Some(MessageText {
        text: text.to_string(),
        id: event.info.id.clone(),
        replied_id: context
            .and_then(|c| c.stanza_id.as_deref())
            .and_then(non_empty),
        quoted_message: context
            .and_then(|c| c.quoted_conversation.as_deref())
            .and_then(non_empty),
    })
}

fn plain_text(content: &MessageContent) -> Option<&str> {
    let captions = [MediaKind::Image, MediaKind::Video, MediaKind::Document]
        .into_iter()
        .filter_map(|kind| content.media(kind)?.caption.as_deref());

    content
        .conversation
        .as_deref()
        .into_iter()
        .chain(captions)
        .find(|text| !text.is_empty())
}

fn reaction(content: &MessageContent) -> Option<Reaction> {
    let reaction = content.reaction.as_ref()?;
    Some(Reaction {
        message: non_empty(&reaction.text)?,
        id: reaction.key_id.clone(),
    })
}

fn is_forwarded(content: &MessageContent) -> bool {
    let forwarded = |c: &MessageContent| {
        c.extended_text
            .as_ref()
            .and_then(|ext| ext.context_info.as_ref())
            .is_some_and(|ctx: &ContextInfo| ctx.is_forwarded)
    };

    forwarded(content)
        || content
            .protocol
            .as_ref()
            .and_then(|p| p.edited.as_deref())
            .is_some_and(forwarded)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Mutex};

    use {
        async_trait::async_trait,
        chrono::{TimeZone, Utc},
        hookrelay_protocol::{
            ContactMessage, ExtendedTextMessage, LocationMessage, MediaAttachment,
            MessageInfo, MessageSource, ProtocolMessage, ReactionMessage,
        },
        serde_json::{Value, json},
    };

    use {super::*, crate::payload::NotificationPayload};

    /// Returns `<root>/<kind>.bin` and remembers every call.
    #[derive(Default)]
    struct FakeExtractor {
        calls: Mutex<Vec<MediaKind>>,
        fail_on: Option<MediaKind>,
    }

    #[async_trait]
    impl MediaExtractor for FakeExtractor {
        async fn extract(
            &self,
            root: &Path,
            kind: MediaKind,
            _media: &MediaAttachment,
        ) -> hookrelay_media::Result<PathBuf> {
            self.calls.lock().unwrap().push(kind);
            if self.fail_on == Some(kind) {
                return Err(hookrelay_media::Error::EmptyData { kind });
            }
            Ok(root.join(format!("{kind}.bin")))
        }
    }

    fn source(chat: &str, sender: &str) -> MessageSource {
        MessageSource {
            chat: chat.parse().unwrap(),
            sender: sender.parse().unwrap(),
            ..MessageSource::default()
        }
    }

    fn event(content: MessageContent) -> MessageEvent {
        MessageEvent {
            info: MessageInfo {
                source: source("123@s.whatsapp.net", "123@s.whatsapp.net"),
                id: "MSG1".into(),
                push_name: "Alice".into(),
                timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()),
            },
            message: content,
            is_view_once: false,
        }
    }

    fn attachment(caption: Option<&str>) -> MediaAttachment {
        MediaAttachment {
            mime_type: "image/jpeg".into(),
            caption: caption.map(String::from),
            data: vec![1, 2, 3],
            ..MediaAttachment::default()
        }
    }

    async fn build(event: &MessageEvent) -> MessagePayload {
        build_message_payload(event, &FakeExtractor::default(), Path::new("/media"))
            .await
            .unwrap()
    }

    fn to_json(payload: MessagePayload) -> Value {
        serde_json::to_value(NotificationPayload::Message(payload)).unwrap()
    }

    #[tokio::test]
    async fn plain_event_has_no_optional_keys() {
        let mut ev = event(MessageContent::default());
        ev.info.timestamp = None;
        ev.info.push_name.clear();
        ev.info.source = MessageSource::default();

        let json = to_json(build(&ev).await);
        assert_eq!(json, json!({ "event_type": "message" }));
    }

    #[tokio::test]
    async fn only_present_fields_are_emitted() {
        let ev = event(MessageContent::default());
        let json = to_json(build(&ev).await);
        assert_eq!(
            json,
            json!({
                "event_type": "message",
                "from": "123@s.whatsapp.net",
                "pushname": "Alice",
                "timestamp": "2024-05-06T07:08:09Z",
            })
        );
    }

    #[tokio::test]
    async fn conversation_text_becomes_message_object() {
        let ev = event(MessageContent {
            conversation: Some("hello".into()),
            ..MessageContent::default()
        });
        let payload = build(&ev).await;
        assert_eq!(
            payload.message,
            Some(MessageText {
                text: "hello".into(),
                id: "MSG1".into(),
                replied_id: None,
                quoted_message: None,
            })
        );
    }

    #[tokio::test]
    async fn empty_conversation_is_omitted() {
        let ev = event(MessageContent {
            conversation: Some(String::new()),
            ..MessageContent::default()
        });
        assert!(build(&ev).await.message.is_none());
    }

    #[tokio::test]
    async fn extended_text_carries_reply_context() {
        let ev = event(MessageContent {
            conversation: Some("ignored".into()),
            extended_text: Some(ExtendedTextMessage {
                text: "sure".into(),
                context_info: Some(ContextInfo {
                    stanza_id: Some("ORIG".into()),
                    quoted_conversation: Some("lunch?".into()),
                    is_forwarded: false,
                }),
            }),
            ..MessageContent::default()
        });
        let text = build(&ev).await.message.unwrap();
        assert_eq!(text.text, "sure");
        assert_eq!(text.replied_id.as_deref(), Some("ORIG"));
        assert_eq!(text.quoted_message.as_deref(), Some("lunch?"));
    }

    #[tokio::test]
    async fn caption_is_used_when_no_text() {
        let ev = event(MessageContent {
            image: Some(attachment(Some("look"))),
            ..MessageContent::default()
        });
        assert_eq!(build(&ev).await.message.unwrap().text, "look");
    }

    #[tokio::test]
    async fn group_sender_is_qualified_by_chat() {
        let mut ev = event(MessageContent::default());
        ev.info.source = source("999@g.us", "123@s.whatsapp.net");
        assert_eq!(
            build(&ev).await.from.as_deref(),
            Some("123@s.whatsapp.net in 999@g.us")
        );
    }

    #[tokio::test]
    async fn reaction_requires_emoji() {
        let mut ev = event(MessageContent {
            reaction: Some(ReactionMessage {
                key_id: "TARGET".into(),
                text: "👍".into(),
            }),
            ..MessageContent::default()
        });
        assert_eq!(
            build(&ev).await.reaction,
            Some(Reaction {
                message: "👍".into(),
                id: "TARGET".into(),
            })
        );

        // An empty emoji removes a reaction; nothing to report.
        if let Some(r) = ev.message.reaction.as_mut() {
            r.text.clear();
        }
        assert!(build(&ev).await.reaction.is_none());
    }

    #[tokio::test]
    async fn view_once_and_forwarded_only_when_true() {
        let mut ev = event(MessageContent {
            extended_text: Some(ExtendedTextMessage {
                text: "fwd".into(),
                context_info: Some(ContextInfo {
                    is_forwarded: true,
                    ..ContextInfo::default()
                }),
            }),
            ..MessageContent::default()
        });
        ev.is_view_once = true;
        let json = to_json(build(&ev).await);
        assert_eq!(json["view_once"], json!(true));
        assert_eq!(json["forwarded"], json!(true));

        let json = to_json(build(&event(MessageContent::default())).await);
        assert!(json.get("view_once").is_none());
        assert!(json.get("forwarded").is_none());
    }

    #[tokio::test]
    async fn forwarded_edit_is_detected() {
        let edited = MessageContent {
            extended_text: Some(ExtendedTextMessage {
                text: "edited".into(),
                context_info: Some(ContextInfo {
                    is_forwarded: true,
                    ..ContextInfo::default()
                }),
            }),
            ..MessageContent::default()
        };
        let ev = event(MessageContent {
            protocol: Some(ProtocolMessage {
                edited: Some(Box::new(edited)),
            }),
            ..MessageContent::default()
        });
        assert!(build(&ev).await.forwarded);
    }

    #[tokio::test]
    async fn single_image_populates_only_image_key() {
        let extractor = FakeExtractor::default();
        let ev = event(MessageContent {
            image: Some(attachment(None)),
            ..MessageContent::default()
        });
        let payload = build_message_payload(&ev, &extractor, Path::new("/media"))
            .await
            .unwrap();

        assert_eq!(payload.image.as_deref(), Some("/media/image.bin"));
        for kind in [
            MediaKind::Audio,
            MediaKind::Document,
            MediaKind::Sticker,
            MediaKind::Video,
        ] {
            assert!(payload.media_path(kind).is_none(), "{kind}");
        }
        assert_eq!(*extractor.calls.lock().unwrap(), vec![MediaKind::Image]);
    }

    #[tokio::test]
    async fn several_media_share_one_payload() {
        let ev = event(MessageContent {
            audio: Some(attachment(None)),
            video: Some(attachment(None)),
            sticker: Some(attachment(None)),
            ..MessageContent::default()
        });
        let payload = build(&ev).await;
        assert_eq!(payload.audio.as_deref(), Some("/media/audio.bin"));
        assert_eq!(payload.video.as_deref(), Some("/media/video.bin"));
        assert_eq!(payload.sticker.as_deref(), Some("/media/sticker.bin"));
    }

    #[tokio::test]
    async fn failed_media_fails_the_payload() {
        let extractor = FakeExtractor {
            fail_on: Some(MediaKind::Document),
            ..FakeExtractor::default()
        };
        let ev = event(MessageContent {
            conversation: Some("see attached".into()),
            document: Some(attachment(None)),
            image: Some(attachment(None)),
            ..MessageContent::default()
        });
        let err = build_message_payload(&ev, &extractor, Path::new("/media"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MediaExtraction {
                kind: MediaKind::Document,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn structured_messages_pass_through() {
        let ev = event(MessageContent {
            contact: Some(ContactMessage {
                display_name: Some("Bob".into()),
                vcard: Some("BEGIN:VCARD".into()),
            }),
            location: Some(LocationMessage {
                degrees_latitude: 52.5,
                degrees_longitude: 13.4,
                ..LocationMessage::default()
            }),
            ..MessageContent::default()
        });
        let json = to_json(build(&ev).await);
        assert_eq!(
            json["contact"],
            json!({ "display_name": "Bob", "vcard": "BEGIN:VCARD" })
        );
        assert_eq!(json["location"]["degrees_latitude"], json!(52.5));
        assert!(json.get("list").is_none());
    }

    #[tokio::test]
    async fn building_twice_is_byte_identical() {
        let ev = event(MessageContent {
            conversation: Some("hello".into()),
            image: Some(attachment(None)),
            ..MessageContent::default()
        });
        let a = serde_json::to_vec(&NotificationPayload::Message(build(&ev).await)).unwrap();
        let b = serde_json::to_vec(&NotificationPayload::Message(build(&ev).await)).unwrap();
        assert_eq!(a, b);
    }
}
