//! Fan-out of one event to every configured endpoint, in order.

use {
    hookrelay_config::{FanoutPolicy, HookrelayConfig},
    hookrelay_protocol::InboundEvent,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    delivery::DeliveryEngine,
    dispatch::{EventDispatcher, ensure_supported},
    error::{EndpointFailure, Error, Result},
    payload::NotificationPayload,
};

/// Endpoints that accepted the notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: Vec<String>,
}

/// Dispatches an event once and delivers the payload to each endpoint.
#[derive(Clone)]
pub struct Forwarder {
    dispatcher: EventDispatcher,
    engine: DeliveryEngine,
    endpoints: Vec<String>,
    policy: FanoutPolicy,
}

impl Forwarder {
    pub fn new(dispatcher: EventDispatcher, engine: DeliveryEngine, endpoints: Vec<String>) -> Self {
        Self {
            dispatcher,
            engine,
            endpoints,
            policy: FanoutPolicy::default(),
        }
    }

    /// Production wiring: filesystem media store, reqwest transport.
    pub fn from_config(config: &HookrelayConfig) -> Result<Self> {
        Ok(Self::new(
            EventDispatcher::from_config(config),
            DeliveryEngine::from_config(&config.webhook)?,
            config.webhook.urls.clone(),
        )
        .with_policy(config.webhook.fanout))
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FanoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn forward(&self, event: &InboundEvent) -> Result<FanoutReport> {
        self.forward_with_cancel(event, &CancellationToken::new())
            .await
    }

    /// Forward `event`. Unsupported kinds always fail; with no endpoints
    /// configured a supported event is not dispatched.
    pub async fn forward_with_cancel(
        &self,
        event: &InboundEvent,
        cancel: &CancellationToken,
    ) -> Result<FanoutReport> {
        if self.endpoints.is_empty() {
            ensure_supported(event)?;
            debug!(kind = event.kind(), "no webhook endpoints configured, skipping");
            return Ok(FanoutReport::default());
        }

        let payload = self.dispatcher.dispatch(event).await?;
        self.deliver_payload(&payload, cancel).await
    }

    /// Deliver an already built payload to every endpoint under the
    /// configured policy.
    pub async fn deliver_payload(
        &self,
        payload: &NotificationPayload,
        cancel: &CancellationToken,
    ) -> Result<FanoutReport> {
        let event_type = payload.event_type();
        let mut delivered = Vec::with_capacity(self.endpoints.len());
        let mut failures = Vec::new();

        for endpoint in &self.endpoints {
            match self.engine.deliver_with_cancel(payload, endpoint, cancel).await {
                Ok(()) => delivered.push(endpoint.clone()),
                Err(error @ Error::Cancelled { .. }) => return Err(error),
                Err(error) => match self.policy {
                    FanoutPolicy::StopOnFirstFailure => {
                        warn!(
                            endpoint = endpoint.as_str(),
                            event_type,
                            delivered = delivered.len(),
                            skipped = self.endpoints.len() - delivered.len() - 1,
                            "stopping fan-out after failed delivery"
                        );
                        return Err(error);
                    },
                    FanoutPolicy::AttemptAll => failures.push(EndpointFailure {
                        endpoint: endpoint.clone(),
                        error,
                    }),
                },
            }
        }

        if !failures.is_empty() {
            warn!(
                event_type,
                delivered = delivered.len(),
                failed = failures.len(),
                "fan-out finished with failures"
            );
            return Err(Error::PartialDelivery {
                delivered,
                failures,
            });
        }

        info!(event_type, endpoints = delivered.len(), "event forwarded to webhooks");
        Ok(FanoutReport { delivered })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use {
        async_trait::async_trait,
        hookrelay_media::FsMediaStore,
        hookrelay_protocol::{MessageContent, MessageEvent},
        secrecy::Secret,
    };

    use {
        super::*,
        crate::{
            delivery::RetryPolicy,
            transport::{TransportError, WebhookRequest, WebhookTransport},
        },
    };

    /// Succeeds for every URL except those whose host is `down`.
    #[derive(Default)]
    struct HostTransport {
        calls: Mutex<HashMap<String, usize>>,
    }

    impl HostTransport {
        fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl WebhookTransport for HostTransport {
        async fn post(&self, request: &WebhookRequest) -> std::result::Result<u16, TransportError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(request.url.to_string())
                .or_default() += 1;
            if request.url.host_str() == Some("down") {
                return Err(TransportError::Connect("refused".into()));
            }
            Ok(204)
        }
    }

    const UP_A: &str = "http://up-a/hook";
    const DOWN: &str = "http://down/hook";
    const UP_B: &str = "http://up-b/hook";

    fn forwarder(transport: Arc<HostTransport>, endpoints: &[&str]) -> Forwarder {
        let dir = std::env::temp_dir();
        let engine = DeliveryEngine::new(transport, Secret::new("s".into())).with_retry_policy(
            RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
                ..RetryPolicy::default()
            },
        );
        Forwarder::new(
            EventDispatcher::new(Arc::new(FsMediaStore::new()), dir),
            engine,
            endpoints.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn hello() -> InboundEvent {
        InboundEvent::Message(MessageEvent {
            message: MessageContent {
                conversation: Some("hello".into()),
                ..MessageContent::default()
            },
            ..MessageEvent::default()
        })
    }

    #[tokio::test]
    async fn delivers_to_all_endpoints_in_order() {
        let transport = Arc::new(HostTransport::default());
        let report = forwarder(transport.clone(), &[UP_A, UP_B])
            .forward(&hello())
            .await
            .unwrap();
        assert_eq!(report.delivered, [UP_A, UP_B]);
        assert_eq!(transport.calls(UP_A), 1);
        assert_eq!(transport.calls(UP_B), 1);
    }

    #[tokio::test]
    async fn stops_on_first_failure_by_default() {
        let transport = Arc::new(HostTransport::default());
        let err = forwarder(transport.clone(), &[UP_A, DOWN, UP_B])
            .forward(&hello())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DeliveryExhausted { attempts: 2, .. }));
        assert_eq!(err.endpoint(), Some(DOWN));
        assert_eq!(transport.calls(UP_A), 1);
        assert_eq!(transport.calls(DOWN), 2);
        assert_eq!(transport.calls(UP_B), 0);
    }

    #[tokio::test]
    async fn attempt_all_aggregates_failures() {
        let transport = Arc::new(HostTransport::default());
        let err = forwarder(transport.clone(), &[DOWN, UP_A, UP_B])
            .with_policy(FanoutPolicy::AttemptAll)
            .forward(&hello())
            .await
            .unwrap_err();

        let Error::PartialDelivery {
            delivered,
            failures,
        } = err
        else {
            panic!("expected partial delivery");
        };
        assert_eq!(delivered, [UP_A, UP_B]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].endpoint, DOWN);
        assert_eq!(transport.calls(UP_B), 1);
    }

    #[tokio::test]
    async fn no_endpoints_skips_supported_events() {
        let transport = Arc::new(HostTransport::default());
        let report = forwarder(transport.clone(), &[])
            .forward(&hello())
            .await
            .unwrap();
        assert!(report.delivered.is_empty());
    }

    #[tokio::test]
    async fn no_endpoints_still_rejects_unsupported_events() {
        let transport = Arc::new(HostTransport::default());
        let f = forwarder(transport, &[]);

        let err = f.forward(&InboundEvent::Connected).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedEvent { kind: "connected" }));

        let err = f
            .forward(&InboundEvent::CallOffer(Default::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedEvent { kind: "call_offer" }));
    }

    #[tokio::test]
    async fn unsupported_event_sends_nothing() {
        let transport = Arc::new(HostTransport::default());
        let err = forwarder(transport.clone(), &[UP_A])
            .forward(&InboundEvent::Disconnected)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedEvent { kind: "disconnected" }));
        assert_eq!(transport.calls(UP_A), 0);
    }

    #[tokio::test]
    async fn cancellation_stops_fanout() {
        let transport = Arc::new(HostTransport::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = forwarder(transport.clone(), &[UP_A, UP_B])
            .with_policy(FanoutPolicy::AttemptAll)
            .forward_with_cancel(&hello(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(err.endpoint(), Some(UP_A));
        assert_eq!(transport.calls(UP_B), 0);
    }
}
