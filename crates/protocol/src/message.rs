//! Message events and their content.

use std::fmt;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::jid::Jid;

/// Where a message came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSource {
    pub chat: Jid,
    pub sender: Jid,
    pub is_from_me: bool,
    pub is_group: bool,
}

impl MessageSource {
    /// Human-readable origin: `"<sender> in <chat>"` when the sender differs
    /// from the chat (groups, broadcasts), otherwise just the chat address.
    #[must_use]
    pub fn source_string(&self) -> String {
        if self.sender != self.chat {
            format!("{} in {}", self.sender, self.chat)
        } else {
            self.chat.to_string()
        }
    }
}

/// Envelope metadata for a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageInfo {
    #[serde(flatten)]
    pub source: MessageSource,
    pub id: String,
    pub push_name: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A received chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageEvent {
    pub info: MessageInfo,
    pub message: MessageContent,
    pub is_view_once: bool,
}

/// The content of a message. Any combination of parts may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageContent {
    pub conversation: Option<String>,
    pub extended_text: Option<ExtendedTextMessage>,
    pub image: Option<MediaAttachment>,
    pub video: Option<MediaAttachment>,
    pub audio: Option<MediaAttachment>,
    pub document: Option<MediaAttachment>,
    pub sticker: Option<MediaAttachment>,
    pub contact: Option<ContactMessage>,
    pub location: Option<LocationMessage>,
    pub live_location: Option<LiveLocationMessage>,
    pub list: Option<ListMessage>,
    pub order: Option<OrderMessage>,
    pub reaction: Option<ReactionMessage>,
    pub protocol: Option<ProtocolMessage>,
}

impl MessageContent {
    /// The attachment of the given kind, if present.
    #[must_use]
    pub fn media(&self, kind: MediaKind) -> Option<&MediaAttachment> {
        match kind {
            MediaKind::Audio => self.audio.as_ref(),
            MediaKind::Document => self.document.as_ref(),
            MediaKind::Image => self.image.as_ref(),
            MediaKind::Sticker => self.sticker.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedTextMessage {
    pub text: String,
    pub context_info: Option<ContextInfo>,
}

/// Reply/forward context attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextInfo {
    /// Id of the message being replied to.
    pub stanza_id: Option<String>,
    /// Plain text of the quoted message.
    pub quoted_conversation: Option<String>,
    pub is_forwarded: bool,
}

/// Wraps edits and revocations. Only the edited content is modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolMessage {
    pub edited: Option<Box<MessageContent>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionMessage {
    /// Id of the message reacted to.
    pub key_id: String,
    /// The emoji. Empty means the reaction was removed.
    pub text: String,
}

/// Kinds of binary media that get extracted to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Document,
    Image,
    Sticker,
    Video,
}

impl MediaKind {
    /// All variants, in payload key order.
    pub const ALL: &'static [MediaKind] = &[
        Self::Audio,
        Self::Document,
        Self::Image,
        Self::Sticker,
        Self::Video,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Image => "image",
            Self::Sticker => "sticker",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media attachment as delivered by the protocol client, already decrypted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaAttachment {
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Hex-encoded SHA-256 of `data`, when the sender supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_sha256: Option<String>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl fmt::Debug for MediaAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAttachment")
            .field("mime_type", &self.mime_type)
            .field("caption", &self.caption)
            .field("file_name", &self.file_name)
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

mod base64_bytes {
    use {
        base64::{Engine, engine::general_purpose::STANDARD},
        serde::{Deserialize, Deserializer, Serializer},
    };

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

// ── Structured (non-media) parts, passed through to subscribers as-is ──────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcard: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationMessage {
    pub degrees_latitude: f64,
    pub degrees_longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveLocationMessage {
    pub degrees_latitude: f64,
    pub degrees_longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_in_meters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_in_mps: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ListSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRow {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub row_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderMessage {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_title: Option<String>,
    pub item_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_jid: Option<Jid>,
    /// Order total in thousandths of the currency unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount_1000: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_currency_code: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_string_for_direct_chat() {
        let chat = Jid::new("123", "s.whatsapp.net");
        let source = MessageSource {
            chat: chat.clone(),
            sender: chat,
            ..Default::default()
        };
        assert_eq!(source.source_string(), "123@s.whatsapp.net");
    }

    #[test]
    fn source_string_for_group() {
        let source = MessageSource {
            chat: Jid::new("999", "g.us"),
            sender: Jid::new("123", "s.whatsapp.net"),
            is_group: true,
            ..Default::default()
        };
        assert_eq!(source.source_string(), "123@s.whatsapp.net in 999@g.us");
    }

    #[test]
    fn source_string_empty() {
        assert_eq!(MessageSource::default().source_string(), "");
    }

    #[test]
    fn media_lookup_by_kind() {
        let content = MessageContent {
            sticker: Some(MediaAttachment {
                mime_type: "image/webp".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(content.media(MediaKind::Sticker).is_some());
        assert!(content.media(MediaKind::Image).is_none());
    }

    #[test]
    fn attachment_data_is_base64_in_json() {
        let json = r#"{"mime_type":"audio/ogg","data":"aGVsbG8="}"#;
        let media: MediaAttachment = serde_json::from_str(json).unwrap();
        assert_eq!(media.data, b"hello");
        assert_eq!(serde_json::to_string(&media).unwrap(), json);
    }

    #[test]
    fn attachment_debug_hides_bytes() {
        let media = MediaAttachment {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
            ..Default::default()
        };
        let debug = format!("{media:?}");
        assert!(debug.contains("len: 3"));
        assert!(!debug.contains("[1, 2, 3]"));
    }

    #[test]
    fn media_kind_names() {
        let names: Vec<_> = MediaKind::ALL.iter().map(MediaKind::as_str).collect();
        assert_eq!(names, ["audio", "document", "image", "sticker", "video"]);
    }
}
