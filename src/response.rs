use crate::aggregator::{AggregatedResult, RecipientResult};
use crate::message::Message;

/// Result of a successful batched send
#[derive(Debug, Clone)]
pub struct Response {
    message: Message,
    result: AggregatedResult,
}

impl Response {
    pub fn new(message: Message, result: AggregatedResult) -> Self {
        Self { message, result }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    pub fn multicast_id(&self) -> i64 {
        self.result.multicast_id
    }

    pub fn success_count(&self) -> u64 {
        self.result.success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.result.failure_count
    }

    pub fn canonical_ids(&self) -> &[String] {
        &self.result.canonical_ids
    }

    /// Pair each registration id with the gateway's per-recipient result.
    ///
    /// Yields nothing beyond the shorter of the two lists; gateways that omit
    /// `results` produce an empty iterator.
    pub fn recipient_results(&self) -> impl Iterator<Item = (&str, &RecipientResult)> {
        self.message
            .registration_ids()
            .iter()
            .map(String::as_str)
            .zip(self.result.results.iter())
    }

    /// Registration ids the gateway reported an error for, with the error
    pub fn failed_registration_ids(&self) -> Vec<(&str, &str)> {
        self.recipient_results()
            .filter_map(|(id, result)| result.error.as_deref().map(|error| (id, error)))
            .collect()
    }

    /// Registration ids that should be replaced by a canonical id
    pub fn canonical_replacements(&self) -> Vec<(&str, &str)> {
        self.recipient_results()
            .filter_map(|(id, result)| {
                result
                    .registration_id
                    .as_deref()
                    .map(|canonical| (id, canonical))
            })
            .collect()
    }
}
