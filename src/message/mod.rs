//! Push message value object.
//!
//! A [`Message`] holds the full recipient list plus the optional delivery
//! attributes understood by the gateway. It is built once through
//! [`MessageBuilder`] and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GcmError, Result};

/// Immutable push message addressed to one or more registration ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageBuilder")]
pub struct Message {
    registration_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collapse_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay_while_idle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_to_live: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restricted_package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
}

impl Message {
    /// Create a builder for a message addressed to the given registration ids
    pub fn builder<I, S>(registration_ids: I) -> MessageBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MessageBuilder::new(registration_ids)
    }

    pub fn registration_ids(&self) -> &[String] {
        &self.registration_ids
    }

    pub fn collapse_key(&self) -> Option<&str> {
        self.collapse_key.as_deref()
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    pub fn delay_while_idle(&self) -> Option<bool> {
        self.delay_while_idle
    }

    /// Time-to-live in seconds
    pub fn time_to_live(&self) -> Option<u32> {
        self.time_to_live
    }

    pub fn restricted_package_name(&self) -> Option<&str> {
        self.restricted_package_name.as_deref()
    }

    pub fn dry_run(&self) -> Option<bool> {
        self.dry_run
    }
}

/// Builder for [`Message`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageBuilder {
    registration_ids: Vec<String>,
    collapse_key: Option<String>,
    data: Option<Map<String, Value>>,
    delay_while_idle: Option<bool>,
    time_to_live: Option<u32>,
    restricted_package_name: Option<String>,
    dry_run: Option<bool>,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new<I, S>(registration_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registration_ids: registration_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Append a single registration id
    pub fn registration_id(mut self, id: impl Into<String>) -> Self {
        self.registration_ids.push(id.into());
        self
    }

    /// Set the collapse key
    pub fn collapse_key(mut self, key: impl Into<String>) -> Self {
        self.collapse_key = Some(key.into());
        self
    }

    /// Replace the whole data payload
    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Insert one key into the data payload
    pub fn data_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn delay_while_idle(mut self, delay: bool) -> Self {
        self.delay_while_idle = Some(delay);
        self
    }

    /// Set time-to-live in seconds
    pub fn time_to_live(mut self, seconds: u32) -> Self {
        self.time_to_live = Some(seconds);
        self
    }

    pub fn restricted_package_name(mut self, name: impl Into<String>) -> Self {
        self.restricted_package_name = Some(name.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    /// Build the message. Fails when no registration id was given.
    pub fn build(self) -> Result<Message> {
        if self.registration_ids.is_empty() {
            return Err(GcmError::MalformedRequest(
                "Message has no registration ids".to_string(),
            ));
        }

        Ok(Message {
            registration_ids: self.registration_ids,
            collapse_key: self.collapse_key,
            data: self.data,
            delay_while_idle: self.delay_while_idle,
            time_to_live: self.time_to_live,
            restricted_package_name: self.restricted_package_name,
            dry_run: self.dry_run,
        })
    }
}

impl TryFrom<MessageBuilder> for Message {
    type Error = GcmError;

    fn try_from(builder: MessageBuilder) -> Result<Self> {
        builder.build()
    }
}
