//! Metric name and label definitions.
//!
//! All metric names emitted by hookrelay live here so the exported surface
//! is documented in one place.

/// Event dispatch metrics
pub mod dispatch {
    /// Inbound events turned into a notification payload
    pub const EVENTS_DISPATCHED_TOTAL: &str = "hookrelay_events_dispatched_total";
    /// Inbound events of a kind that has no notification payload
    pub const EVENTS_UNSUPPORTED_TOTAL: &str = "hookrelay_events_unsupported_total";
    /// Media attachments written to the media store
    pub const MEDIA_EXTRACTED_TOTAL: &str = "hookrelay_media_extracted_total";
}

/// Webhook delivery metrics
pub mod webhook {
    /// Individual HTTP POST attempts, successful or not
    pub const DELIVERY_ATTEMPTS_TOTAL: &str = "hookrelay_webhook_delivery_attempts_total";
    /// Deliveries that an endpoint accepted
    pub const DELIVERIES_SUCCEEDED_TOTAL: &str = "hookrelay_webhook_deliveries_succeeded_total";
    /// Deliveries that used up every attempt
    pub const DELIVERIES_EXHAUSTED_TOTAL: &str = "hookrelay_webhook_deliveries_exhausted_total";
    /// Deliveries abandoned because of shutdown
    pub const DELIVERIES_CANCELLED_TOTAL: &str = "hookrelay_webhook_deliveries_cancelled_total";
    /// Wall time from first attempt to final outcome, in seconds
    pub const DELIVERY_DURATION_SECONDS: &str = "hookrelay_webhook_delivery_duration_seconds";
}

/// Common label keys
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const EVENT_TYPE: &str = "event_type";
    pub const OUTCOME: &str = "outcome";
    pub const MEDIA_KIND: &str = "media_kind";
}

/// Histogram buckets
pub mod buckets {
    /// Delivery durations, from 10ms up to the worst case of five timed-out
    /// attempts plus backoff.
    pub const DELIVERY_DURATION: &[f64] = &[
        0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0,
    ];
}
