//! Inbound messaging-protocol events consumed by the webhook forwarder.
//!
//! The protocol client produces these values; everything downstream treats
//! them as read-only. All types round-trip through JSON so events can be
//! replayed from files.

pub mod event;
pub mod jid;
pub mod message;
pub mod presence;
pub mod receipt;

pub use {
    event::{CallOfferEvent, ChatPresenceEvent, InboundEvent},
    jid::Jid,
    message::{
        ContactMessage, ContextInfo, ExtendedTextMessage, ListMessage, ListRow, ListSection,
        LiveLocationMessage, LocationMessage, MediaAttachment, MediaKind, MessageContent,
        MessageEvent, MessageInfo, MessageSource, OrderMessage, ProtocolMessage, ReactionMessage,
    },
    presence::PresenceEvent,
    receipt::{ReceiptEvent, ReceiptType},
};
