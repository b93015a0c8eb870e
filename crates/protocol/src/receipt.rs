use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::message::MessageSource;

/// Kind of acknowledgement carried by a receipt.
///
/// The serde names are the protocol's wire values; a plain delivery receipt
/// has an empty type on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    #[default]
    #[serde(rename = "", alias = "delivered")]
    Delivered,
    #[serde(rename = "sender")]
    Sender,
    #[serde(rename = "retry")]
    Retry,
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "read-self")]
    ReadSelf,
    #[serde(rename = "played")]
    Played,
    #[serde(rename = "played-self")]
    PlayedSelf,
    #[serde(rename = "server-error")]
    ServerError,
    #[serde(rename = "inactive")]
    Inactive,
    #[serde(rename = "peer_msg")]
    PeerMsg,
    #[serde(rename = "hist_sync")]
    HistorySync,
}

impl ReceiptType {
    /// The native wire representation (empty for `Delivered`).
    #[must_use]
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Delivered => "",
            Self::Sender => "sender",
            Self::Retry => "retry",
            Self::Read => "read",
            Self::ReadSelf => "read-self",
            Self::Played => "played",
            Self::PlayedSelf => "played-self",
            Self::ServerError => "server-error",
            Self::Inactive => "inactive",
            Self::PeerMsg => "peer_msg",
            Self::HistorySync => "hist_sync",
        }
    }
}

/// Delivery/read acknowledgement for one or more messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    #[serde(flatten)]
    pub source: MessageSource,
    #[serde(default)]
    pub message_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub receipt_type: ReceiptType,
}
