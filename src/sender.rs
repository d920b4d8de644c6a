use std::sync::Arc;

use serde_json::{Map, Value};

use crate::aggregator::aggregate;
use crate::config::{GatewayConfig, DEFAULT_ENDPOINT};
use crate::dispatcher::Dispatcher;
use crate::error::{GcmError, Result};
use crate::gateway::{GatewayTransport, HttpTransport};
use crate::message::Message;
use crate::metrics::GatewayMetrics;
use crate::planner::plan;
use crate::response::Response;

/// Sends messages of any size to the gateway.
///
/// Configuration is fixed at construction; the sender is cheap to clone and
/// safe to share between concurrent sends.
#[derive(Clone)]
pub struct Sender {
    dispatcher: Dispatcher,
}

impl Sender {
    /// Create a sender for `api_key`, optionally overriding the gateway endpoint
    pub fn new(api_key: impl Into<String>, endpoint: Option<String>) -> Result<Self> {
        let transport = HttpTransport::new(None)
            .map_err(|e| GcmError::UnknownError(e.to_string()))?;
        Ok(Self::with_transport(
            Arc::new(transport),
            endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
        ))
    }

    /// Create a sender from loaded settings. A missing key is only reported
    /// when sending.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())
            .map_err(|e| GcmError::UnknownError(e.to_string()))?;
        Ok(Self::with_transport(
            Arc::new(transport),
            config.endpoint.clone(),
            config.api_key.clone().unwrap_or_default(),
        ))
    }

    /// Create a sender over a custom transport
    pub fn with_transport(
        transport: Arc<dyn GatewayTransport>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport, endpoint, api_key),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.dispatcher.endpoint()
    }

    /// Send a message, splitting it into as many gateway requests as needed.
    ///
    /// Either every chunk succeeds and one merged [`Response`] is returned, or
    /// the first failure is returned unchanged.
    #[tracing::instrument(
        name = "sender.send",
        skip(self, message),
        fields(recipients = message.registration_ids().len())
    )]
    pub async fn send(&self, message: Message) -> Result<Response> {
        let result = self.send_inner(message).await;
        GatewayMetrics::record_send(&result);

        match &result {
            Ok(response) => tracing::debug!(
                multicast_id = response.multicast_id(),
                success = response.success_count(),
                failure = response.failure_count(),
                canonical_ids = response.canonical_ids().len(),
                "Message sent"
            ),
            Err(e) => tracing::warn!(code = e.code(), error = %e, "Message send failed"),
        }

        result
    }

    async fn send_inner(&self, message: Message) -> Result<Response> {
        self.dispatcher.ensure_api_key()?;

        let chunks = plan(&message)?;
        let raw = self.dispatcher.dispatch(&chunks).await?;
        let aggregated = aggregate(&raw)?;

        Ok(Response::new(message, aggregated))
    }

    /// Build a message from its most common attributes and send it
    pub async fn send_message<I, S>(
        &self,
        registration_ids: I,
        data: Option<Map<String, Value>>,
        collapse_key: Option<String>,
    ) -> Result<Response>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Message::builder(registration_ids);
        if let Some(data) = data {
            builder = builder.data(data);
        }
        if let Some(key) = collapse_key {
            builder = builder.collapse_key(key);
        }
        self.send(builder.build()?).await
    }
}
