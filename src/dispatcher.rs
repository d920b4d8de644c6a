use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::error::{GcmError, Result};
use crate::gateway::{GatewayTransport, RawChunkResult, TransportError};
use crate::metrics::GatewayMetrics;
use crate::planner::RequestChunk;

/// Fans chunk requests out to the gateway and classifies the responses.
///
/// Holds only immutable configuration, so one dispatcher can serve any number
/// of concurrent sends.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn GatewayTransport>,
    endpoint: String,
    api_key: String,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fail with [`GcmError::IllegalApiKey`] when no key is configured.
    /// A whitespace-only key counts as missing and is never sent.
    pub fn ensure_api_key(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(GcmError::IllegalApiKey);
        }
        Ok(())
    }

    /// Send every chunk concurrently and wait for all of them.
    ///
    /// Results come back in chunk order. Classification happens only after
    /// every request has finished, walking the chunks in order; the first
    /// failing chunk decides the error.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, chunks),
        fields(endpoint = %self.endpoint, chunk_count = chunks.len())
    )]
    pub async fn dispatch(&self, chunks: &[RequestChunk]) -> Result<Vec<RawChunkResult>> {
        self.ensure_api_key()?;

        let requests = chunks.iter().map(|chunk| async move {
            GatewayMetrics::record_recipients(chunk.registration_ids().len());
            let started = Instant::now();
            let outcome = self
                .transport
                .post(&self.endpoint, &self.api_key, chunk)
                .await;
            let elapsed = started.elapsed().as_secs_f64();

            match &outcome {
                Ok(raw) => GatewayMetrics::record_chunk_status(raw.status, elapsed),
                Err(_) => GatewayMetrics::record_chunk_transport_error(elapsed),
            }
            outcome
        });

        let outcomes = join_all(requests).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let raw = outcome
                .map_err(|e| {
                    tracing::warn!(chunk = index, error = %e, "Gateway request failed");
                    transport_error(e)
                })?
                .with_recipients(chunks[index].registration_ids().len());

            if let Err(e) = classify_status(&raw) {
                tracing::warn!(
                    chunk = index,
                    status = raw.status,
                    code = e.code(),
                    "Gateway rejected chunk"
                );
                return Err(e);
            }

            tracing::debug!(
                chunk = index,
                recipients = chunks[index].registration_ids().len(),
                "Chunk accepted"
            );
            results.push(raw);
        }

        Ok(results)
    }
}

/// Map one HTTP outcome onto the error taxonomy
pub fn classify_status(raw: &RawChunkResult) -> Result<()> {
    match raw.status {
        200 => Ok(()),
        400 => Err(GcmError::MalformedRequest(raw.body.clone())),
        401 => Err(GcmError::AuthenticationError(raw.body.clone())),
        // TODO: surface 503 + Retry-After as a retryable kind
        status => Err(GcmError::UnknownError(format!("HTTP {}: {}", status, raw.body))),
    }
}

fn transport_error(err: TransportError) -> GcmError {
    match err {
        TransportError::Encode(detail) => GcmError::MalformedRequest(detail),
        other => GcmError::UnknownError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::message::Message;
    use crate::planner::plan_with_batch_size;

    /// Replies with a scripted status per chunk, keyed by the chunk's first id
    struct ScriptedTransport {
        replies: Vec<(String, std::result::Result<RawChunkResult, String>)>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GatewayTransport for ScriptedTransport {
        async fn post(
            &self,
            _endpoint: &str,
            _api_key: &str,
            chunk: &RequestChunk,
        ) -> std::result::Result<RawChunkResult, TransportError> {
            let first = chunk.registration_ids()[0].clone();
            self.calls.lock().unwrap().push(first.clone());
            let (_, reply) = self
                .replies
                .iter()
                .find(|(id, _)| *id == first)
                .expect("scripted reply");
            reply.clone().map_err(TransportError::Request)
        }
    }

    fn scripted(
        replies: Vec<(&str, std::result::Result<RawChunkResult, String>)>,
    ) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport {
            replies: replies
                .into_iter()
                .map(|(id, reply)| (id.to_string(), reply))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn chunks(ids: &[&str]) -> Vec<RequestChunk> {
        let message = Message::builder(ids.iter().copied()).build().unwrap();
        plan_with_batch_size(&message, 1).unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(&RawChunkResult::new(200, "{}")).is_ok());
        assert_eq!(
            classify_status(&RawChunkResult::new(400, "bad")),
            Err(GcmError::MalformedRequest("bad".to_string()))
        );
        assert_eq!(
            classify_status(&RawChunkResult::new(401, "denied")),
            Err(GcmError::AuthenticationError("denied".to_string()))
        );
        let err = classify_status(&RawChunkResult::new(503, "busy")).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_ERROR");
        assert!(err.detail().contains("busy"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let transport = scripted(vec![]);
        let dispatcher = Dispatcher::new(transport.clone(), "http://gateway", "");

        let err = dispatcher.dispatch(&chunks(&["a"])).await.unwrap_err();
        assert_eq!(err, GcmError::IllegalApiKey);
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_key_treated_as_missing() {
        let transport = scripted(vec![("a", Ok(RawChunkResult::new(401, "denied")))]);

        for key in [" ", "\t", "  \n "] {
            let dispatcher = Dispatcher::new(transport.clone(), "http://gateway", key);
            assert_eq!(dispatcher.ensure_api_key(), Err(GcmError::IllegalApiKey));

            let err = dispatcher.dispatch(&chunks(&["a"])).await.unwrap_err();
            assert_eq!(err, GcmError::IllegalApiKey);
        }
        assert!(transport.calls.lock().unwrap().is_empty());

        // surrounding whitespace on a real key is still sent as configured
        let dispatcher = Dispatcher::new(transport.clone(), "http://gateway", " key ");
        assert!(dispatcher.ensure_api_key().is_ok());
    }

    #[tokio::test]
    async fn test_results_carry_chunk_sizes() {
        let transport = scripted(vec![
            ("a", Ok(RawChunkResult::new(200, "first"))),
            ("c", Ok(RawChunkResult::new(200, "second"))),
        ]);
        let dispatcher = Dispatcher::new(transport, "http://gateway", "key");
        let message = Message::builder(["a", "b", "c"]).build().unwrap();
        let chunks = plan_with_batch_size(&message, 2).unwrap();

        let results = dispatcher.dispatch(&chunks).await.unwrap();
        let sizes: Vec<_> = results.iter().map(|r| r.recipients).collect();
        assert_eq!(sizes, [2, 1]);
    }

    #[tokio::test]
    async fn test_results_in_chunk_order() {
        let transport = scripted(vec![
            ("a", Ok(RawChunkResult::new(200, "first"))),
            ("b", Ok(RawChunkResult::new(200, "second"))),
        ]);
        let dispatcher = Dispatcher::new(transport.clone(), "http://gateway", "key");

        let results = dispatcher.dispatch(&chunks(&["a", "b"])).await.unwrap();
        let bodies: Vec<_> = results.iter().map(|r| r.body.as_str()).collect();
        assert_eq!(bodies, ["first", "second"]);
        assert_eq!(transport.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_first_failing_chunk_wins() {
        let transport = scripted(vec![
            ("a", Ok(RawChunkResult::new(200, "ok"))),
            ("b", Ok(RawChunkResult::new(401, "auth"))),
            ("c", Ok(RawChunkResult::new(400, "bad"))),
        ]);
        let dispatcher = Dispatcher::new(transport.clone(), "http://gateway", "key");

        let err = dispatcher.dispatch(&chunks(&["a", "b", "c"])).await.unwrap_err();
        assert_eq!(err, GcmError::AuthenticationError("auth".to_string()));
        // every request still ran to completion
        assert_eq!(transport.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_is_unknown_error() {
        let transport = scripted(vec![
            ("a", Ok(RawChunkResult::new(200, "ok"))),
            ("b", Err("connection refused".to_string())),
        ]);
        let dispatcher = Dispatcher::new(transport, "http://gateway", "key");

        let err = dispatcher.dispatch(&chunks(&["a", "b"])).await.unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_ERROR");
        assert!(err.detail().contains("connection refused"));
    }
}
