//! Notification payloads posted to subscribers.
//!
//! Every optional field is omitted from the JSON when it carries no data;
//! `null` never appears on the wire.

use {
    chrono::{DateTime, SecondsFormat, Utc},
    hookrelay_protocol::{
        ContactMessage, ListMessage, LiveLocationMessage, LocationMessage, MediaKind,
        OrderMessage,
    },
    serde::{Deserialize, Serialize},
};

/// One notification, discriminated by `event_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum NotificationPayload {
    Message(MessagePayload),
    Receipt(ReceiptPayload),
    Presence(PresencePayload),
}

impl NotificationPayload {
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Receipt(_) => "receipt",
            Self::Presence(_) => "presence",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Reaction>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub view_once: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forwarded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    // Paths returned by the media store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,

    // Structured sub-messages, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_location: Option<LiveLocationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderMessage>,
}

impl MessagePayload {
    /// Stored media path for `kind`, if the message carried one.
    #[must_use]
    pub fn media_path(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Audio => self.audio.as_deref(),
            MediaKind::Document => self.document.as_deref(),
            MediaKind::Image => self.image.as_deref(),
            MediaKind::Sticker => self.sticker.as_deref(),
            MediaKind::Video => self.video.as_deref(),
        }
    }

    pub(crate) fn set_media_path(&mut self, kind: MediaKind, path: String) {
        *self.media_slot_mut(kind) = Some(path);
    }

    fn media_slot_mut(&mut self, kind: MediaKind) -> &mut Option<String> {
        match kind {
            MediaKind::Audio => &mut self.audio,
            MediaKind::Document => &mut self.document,
            MediaKind::Image => &mut self.image,
            MediaKind::Sticker => &mut self.sticker,
            MediaKind::Video => &mut self.video,
        }
    }
}

/// Text (or caption) of a message plus what it replies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText {
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// The emoji.
    pub message: String,
    /// Id of the message reacted to.
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPayload {
    pub from: String,
    pub timestamp: String,
    pub message_ids: Vec<String>,
    pub receipt_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    #[default]
    Online,
    Offline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub from: String,
    pub timestamp: String,
    pub status: PresenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

/// RFC 3339 at second precision with a `Z` suffix.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
