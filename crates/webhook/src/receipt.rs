//! Receipt event → `receipt` payload.

use hookrelay_protocol::{ReceiptEvent, ReceiptType};

use crate::payload::{ReceiptPayload, format_timestamp};

/// Every field is always present; a plain delivery receipt is reported as
/// `"delivered"` instead of its empty wire value.
#[must_use]
pub fn build_receipt_payload(event: &ReceiptEvent) -> ReceiptPayload {
    let receipt_type = match event.receipt_type {
        ReceiptType::Delivered => "delivered",
        other => other.as_wire_str(),
    };

    ReceiptPayload {
        from: event.source.source_string(),
        timestamp: format_timestamp(&event.timestamp),
        message_ids: event.message_ids.clone(),
        receipt_type: receipt_type.to_string(),
    }
}
