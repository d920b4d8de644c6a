//! Overlap of chunk requests within one send, observed through a recording
//! transport.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;

use gcm_sender::gateway::{GatewayTransport, RawChunkResult, TransportError};
use gcm_sender::planner::{plan, RequestChunk, MAX_BATCH_SIZE};
use gcm_sender::{GcmError, Message, Sender};

#[derive(Default)]
struct RecordingTransport {
    spans: Mutex<Vec<(Instant, Instant)>>,
    chunk_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl GatewayTransport for RecordingTransport {
    async fn post(
        &self,
        _endpoint: &str,
        api_key: &str,
        chunk: &RequestChunk,
    ) -> Result<RawChunkResult, TransportError> {
        assert_eq!(api_key, "key");
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let finished = Instant::now();

        self.spans.lock().unwrap().push((started, finished));
        self.chunk_sizes
            .lock()
            .unwrap()
            .push(chunk.registration_ids().len());

        Ok(RawChunkResult::new(
            200,
            json!({"multicast_id": 42, "success": 1, "failure": 0, "canonical_ids": []})
                .to_string(),
        ))
    }
}

fn message_with(count: usize) -> Message {
    Message::builder((0..count).map(|i| format!("reg-{i}")))
        .build()
        .unwrap()
}

#[tokio::test]
async fn all_chunk_requests_are_in_flight_together() {
    let transport = Arc::new(RecordingTransport::default());
    let sender = Sender::with_transport(transport.clone(), "http://gateway/send", "key");

    let message = message_with(MAX_BATCH_SIZE * 3 + 1);
    assert_eq!(plan(&message).unwrap().len(), 4);

    let response = sender.send(message).await.expect("send");
    assert_eq!(response.success_count(), 4);

    let spans = transport.spans.lock().unwrap();
    assert_eq!(spans.len(), 4);
    let last_start = spans.iter().map(|(start, _)| *start).max().unwrap();
    let first_end = spans.iter().map(|(_, end)| *end).min().unwrap();
    assert!(
        last_start < first_end,
        "a chunk request started only after another had finished"
    );

    let mut sizes = transport.chunk_sizes.lock().unwrap().clone();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, MAX_BATCH_SIZE, MAX_BATCH_SIZE, MAX_BATCH_SIZE]);
}

#[tokio::test]
async fn concurrent_sends_share_one_sender() {
    let transport = Arc::new(RecordingTransport::default());
    let sender = Sender::with_transport(transport.clone(), "http://gateway/send", "key");

    let (a, b) = tokio::join!(
        sender.send(message_with(10)),
        sender.send(message_with(MAX_BATCH_SIZE + 10)),
    );

    assert_eq!(a.expect("first send").success_count(), 1);
    assert_eq!(b.expect("second send").success_count(), 2);
    assert_eq!(transport.spans.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn empty_key_never_reaches_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let sender = Sender::with_transport(transport.clone(), "http://gateway/send", "");

    let err = sender.send(message_with(3)).await.unwrap_err();

    assert_eq!(err, GcmError::IllegalApiKey);
    assert!(transport.spans.lock().unwrap().is_empty());
}
