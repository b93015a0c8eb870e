//! Presence event → `presence` payload.

use {
    chrono::{DateTime, Utc},
    hookrelay_protocol::PresenceEvent,
};

use crate::payload::{PresencePayload, PresenceStatus, format_timestamp};

/// `now` becomes the payload timestamp. `last_seen` is reported only for an
/// unavailable subject with a recorded last-seen time.
#[must_use]
pub fn build_presence_payload(event: &PresenceEvent, now: DateTime<Utc>) -> PresencePayload {
    let (status, last_seen) = if event.unavailable {
        let last_seen = event
            .last_seen
            .filter(|ts| ts.timestamp() != 0)
            .map(|ts| format_timestamp(&ts));
        (PresenceStatus::Offline, last_seen)
    } else {
        (PresenceStatus::Online, None)
    };

    PresencePayload {
        from: event.from.to_string(),
        timestamp: format_timestamp(&now),
        status,
        last_seen,
    }
}
