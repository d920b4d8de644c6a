//! Batch planning.
//!
//! Splits a message's recipients into gateway-sized chunks and projects the
//! message's optional attributes onto each chunk's JSON payload.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GcmError, Result};
use crate::message::Message;

/// Maximum number of registration ids the gateway accepts per request
pub const MAX_BATCH_SIZE: usize = 1000;

/// Maximum serialized size of the `data` payload in bytes
pub const MAX_DATA_BYTES: usize = 4096;

type FieldExtractor = fn(&Message) -> Option<Value>;

/// Optional payload fields in wire order. A field is emitted only when its
/// extractor yields a value; absent fields are omitted rather than sent as null.
const OPTIONAL_FIELDS: [(&str, FieldExtractor); 6] = [
    ("collapse_key", collapse_key_field),
    ("data", data_field),
    ("delay_while_idle", delay_while_idle_field),
    ("time_to_live", time_to_live_field),
    ("restricted_package_name", restricted_package_name_field),
    ("dry_run", dry_run_field),
];

fn non_empty_str(value: Option<&str>) -> Option<Value> {
    value.filter(|s| !s.is_empty()).map(Value::from)
}

fn collapse_key_field(message: &Message) -> Option<Value> {
    non_empty_str(message.collapse_key())
}

fn data_field(message: &Message) -> Option<Value> {
    message
        .data()
        .filter(|data| !data.is_empty())
        .map(|data| Value::Object(data.clone()))
}

// Explicit `false` and a TTL of 0 ("deliver now or never") are caller
// choices and are sent; only unset values are omitted.
fn delay_while_idle_field(message: &Message) -> Option<Value> {
    message.delay_while_idle().map(Value::from)
}

fn time_to_live_field(message: &Message) -> Option<Value> {
    message.time_to_live().map(Value::from)
}

fn restricted_package_name_field(message: &Message) -> Option<Value> {
    non_empty_str(message.restricted_package_name())
}

fn dry_run_field(message: &Message) -> Option<Value> {
    message.dry_run().map(Value::from)
}

/// One gateway request: a slice of the recipients plus the shared attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestChunk {
    registration_ids: Vec<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl RequestChunk {
    pub fn registration_ids(&self) -> &[String] {
        &self.registration_ids
    }

    /// Optional attribute copied from the owning message, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Serialize the chunk into the JSON request body
    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GcmError::MalformedRequest(e.to_string()))
    }
}

/// Partition a message into chunks of at most [`MAX_BATCH_SIZE`] recipients.
pub fn plan(message: &Message) -> Result<Vec<RequestChunk>> {
    plan_with_batch_size(message, MAX_BATCH_SIZE)
}

/// Partition a message into chunks of at most `batch_size` recipients.
///
/// Fails with [`GcmError::MalformedRequest`] when the data payload is too
/// large; no chunk is produced in that case.
pub fn plan_with_batch_size(message: &Message, batch_size: usize) -> Result<Vec<RequestChunk>> {
    if let Some(data) = message.data() {
        let size = serde_json::to_vec(data)
            .map_err(|e| GcmError::MalformedRequest(e.to_string()))?
            .len();
        if size > MAX_DATA_BYTES {
            return Err(GcmError::MalformedRequest(format!(
                "Data payload is too big ({} bytes, max {} bytes)",
                size, MAX_DATA_BYTES
            )));
        }
    }

    let mut fields = Map::new();
    for (name, extract) in OPTIONAL_FIELDS {
        if let Some(value) = extract(message) {
            fields.insert(name.to_string(), value);
        }
    }

    Ok(message
        .registration_ids()
        .chunks(batch_size.max(1))
        .map(|ids| RequestChunk {
            registration_ids: ids.to_vec(),
            fields: fields.clone(),
        })
        .collect())
}
