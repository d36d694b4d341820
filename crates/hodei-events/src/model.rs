//! Subscription and delivery-payload types (spec §4.8).

use chrono::{DateTime, Utc};
use hodei_core::ExecutionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMethod {
    PushStream,
    Webhook,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub execution_id: ExecutionId,
    pub sequence: u64,
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub execution_id: ExecutionId,
    pub sequence: u64,
    pub stream: LogStream,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// What a subscription actually receives (spec §4.8 "Publishes
/// `ExecutionUpdate` variants").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionUpdate {
    EventUpdate(ExecutionEvent),
    LogUpdate(LogLine),
}

impl ExecutionUpdate {
    pub fn execution_id(&self) -> &ExecutionId {
        match self {
            ExecutionUpdate::EventUpdate(e) => &e.execution_id,
            ExecutionUpdate::LogUpdate(l) => &l.execution_id,
        }
    }

    fn is_event(&self) -> bool {
        matches!(self, ExecutionUpdate::EventUpdate(_))
    }

    fn is_log(&self) -> bool {
        matches!(self, ExecutionUpdate::LogUpdate(_))
    }
}

/// One registered listener for an execution's events/logs (spec §4.8).
#[derive(Debug, Clone)]
pub struct Subscription {
    pub subscriber_id: hodei_core::SubscriberId,
    pub execution_id: ExecutionId,
    pub delivery_method: DeliveryMethod,
    pub include_events: bool,
    pub include_logs: bool,
    pub webhook_url: Option<String>,
}

impl Subscription {
    /// Whether this subscription wants to see `update` at all, independent
    /// of delivery mechanics.
    pub fn matches(&self, update: &ExecutionUpdate) -> bool {
        if &self.execution_id != update.execution_id() {
            return false;
        }
        (update.is_event() && self.include_events) || (update.is_log() && self.include_logs)
    }
}
