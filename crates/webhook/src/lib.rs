//! Webhook forwarding of gateway events.
//!
//! An [`InboundEvent`](hookrelay_protocol::InboundEvent) goes through the
//! [`EventDispatcher`], which builds one [`NotificationPayload`]; the
//! [`Forwarder`] then hands that payload to the [`DeliveryEngine`] once per
//! configured endpoint. Every request carries an `X-Hub-Signature-256`
//! HMAC of its body so subscribers can [`verify`] it.

pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod message;
pub mod payload;
pub mod presence;
pub mod receipt;
pub mod signer;
pub mod transport;

pub use {
    delivery::{DeliveryEngine, RetryPolicy},
    dispatch::{EventDispatcher, ensure_supported},
    error::{EndpointFailure, Error, Result},
    fanout::{FanoutReport, Forwarder},
    payload::{
        MessagePayload, MessageText, NotificationPayload, PresencePayload, PresenceStatus,
        Reaction, ReceiptPayload,
    },
    signer::{SIGNATURE_HEADER, sign, signature_header, verify},
    transport::{ReqwestTransport, TransportError, WebhookRequest, WebhookTransport},
};
