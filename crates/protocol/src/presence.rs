use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::jid::Jid;

/// Online/offline status change for a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceEvent {
    pub from: Jid,
    pub unavailable: bool,
    /// Only meaningful when `unavailable`; `None` when the contact hides it.
    pub last_seen: Option<DateTime<Utc>>,
}
