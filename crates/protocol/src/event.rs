use serde::{Deserialize, Serialize};

use crate::{
    jid::Jid, message::MessageEvent, presence::PresenceEvent, receipt::ReceiptEvent,
};

/// Every event the protocol client can hand over.
///
/// Only `Message`, `Receipt` and `Presence` are forwarded to webhooks; the
/// rest are modelled so that consumers must decide about them explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Message(MessageEvent),
    Receipt(ReceiptEvent),
    Presence(PresenceEvent),
    Connected,
    Disconnected,
    LoggedOut {
        #[serde(default)]
        reason: String,
    },
    ChatPresence(ChatPresenceEvent),
    CallOffer(CallOfferEvent),
}

impl InboundEvent {
    /// Stable kind name, identical to the serde tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Receipt(_) => "receipt",
            Self::Presence(_) => "presence",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::LoggedOut { .. } => "logged_out",
            Self::ChatPresence(_) => "chat_presence",
            Self::CallOffer(_) => "call_offer",
        }
    }
}

/// Typing/recording indicator inside a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPresenceEvent {
    pub chat: Jid,
    pub sender: Jid,
    /// `composing` or `paused`.
    pub state: String,
    /// `audio` while recording a voice note.
    pub media: String,
}

/// Incoming voice/video call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOfferEvent {
    pub from: Jid,
    pub call_id: String,
}
