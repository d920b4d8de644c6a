//! Merges per-chunk gateway responses into one logical result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GcmError, Result};
use crate::gateway::RawChunkResult;

/// Body of a successful gateway response for one chunk
#[derive(Debug, Clone, Deserialize)]
struct ChunkResponseBody {
    multicast_id: i64,
    success: u64,
    failure: u64,
    #[serde(default)]
    canonical_ids: Option<Vec<String>>,
    #[serde(default)]
    results: Option<Vec<RecipientResult>>,
}

/// Gateway verdict for a single recipient
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Canonical registration id replacing the one that was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One logical response for a whole batched send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedResult {
    /// Multicast id reported by the last chunk processed
    pub multicast_id: i64,
    pub success_count: u64,
    pub failure_count: u64,
    pub canonical_ids: Vec<String>,
    /// Per-recipient results, index-aligned with the message's registration
    /// ids. Empty when no chunk reported results; chunks that omitted them
    /// contribute one empty entry per recipient.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<RecipientResult>,
}

/// Merge raw chunk bodies in chunk order.
///
/// Counters are summed and canonical ids concatenated. The multicast id is
/// overwritten by each chunk in turn, so the last one wins even if chunks
/// disagree.
///
/// Each chunk's `results` are padded or cut to that chunk's recipient count
/// so later chunks never shift onto earlier registration ids.
pub fn aggregate(results: &[RawChunkResult]) -> Result<AggregatedResult> {
    let mut aggregated = AggregatedResult::default();
    let mut any_results = false;

    for raw in results {
        let body: ChunkResponseBody = serde_json::from_str(&raw.body)
            .map_err(|_| GcmError::MalformedResponse(raw.body.clone()))?;

        aggregated.multicast_id = body.multicast_id;
        aggregated.success_count += body.success;
        aggregated.failure_count += body.failure;
        aggregated
            .canonical_ids
            .extend(body.canonical_ids.unwrap_or_default());

        let mut chunk_results = match body.results {
            Some(list) => {
                any_results = true;
                list
            }
            None => Vec::new(),
        };
        if chunk_results.len() != raw.recipients {
            tracing::debug!(
                reported = chunk_results.len(),
                recipients = raw.recipients,
                "Aligning per-recipient results to chunk size"
            );
            chunk_results.resize(raw.recipients, RecipientResult::default());
        }
        aggregated.results.extend(chunk_results);
    }

    if !any_results {
        aggregated.results.clear();
    }

    Ok(aggregated)
}

impl AggregatedResult {
    /// Render in the gateway's own response shape
    pub fn to_gateway_json(&self) -> Value {
        serde_json::json!({
            "multicast_id": self.multicast_id,
            "success": self.success_count,
            "failure": self.failure_count,
            "canonical_ids": self.canonical_ids,
            "results": self.results,
        })
    }
}
