// Supporting infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Message model
pub mod message;
pub mod response;

// Send pipeline: plan -> dispatch -> aggregate
pub mod aggregator;
pub mod dispatcher;
pub mod gateway;
pub mod planner;
pub mod sender;

pub use aggregator::{AggregatedResult, RecipientResult};
pub use error::{GcmError, Result};
pub use message::{Message, MessageBuilder};
pub use response::Response;
pub use sender::Sender;
