//! `EventRegistry`: register/notify/unregister/cleanupExecution over
//! per-execution subscriptions (spec §4.8).

use std::collections::HashMap;

use hodei_core::{ExecutionId, SubscriberId};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use crate::config::EventsConfig;
use crate::model::{DeliveryMethod, ExecutionUpdate, Subscription};

/// A PUSH_STREAM subscriber's inbox exceeded the configured ceiling; the
/// subscription is closed as a side effect of returning this (spec §5
/// "Backpressure... exceeding it closes the subscription").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("subscription {subscriber_id} on execution {execution_id} overflowed its inbox")]
pub struct OverflowError {
    pub subscriber_id: SubscriberId,
    pub execution_id: ExecutionId,
}

struct Registered {
    subscription: Subscription,
    inbox: Option<mpsc::UnboundedSender<ExecutionUpdate>>,
}

pub struct EventRegistry {
    config: EventsConfig,
    subscriptions: Mutex<HashMap<String, Vec<Registered>>>,
    http: reqwest::Client,
}

impl EventRegistry {
    pub fn new(config: EventsConfig) -> Self {
        Self {
            config,
            subscriptions: Mutex::new(HashMap::new()),
            http: reqwest::Client::new(),
        }
    }

    /// Register a subscription. Returns the inbox receiver for PUSH_STREAM
    /// subscriptions, `None` for WEBHOOK ones (spec §4.8 "if PUSH_STREAM,
    /// create an unbounded inbox; if WEBHOOK, no inbox").
    pub async fn register(&self, subscription: Subscription) -> Option<mpsc::UnboundedReceiver<ExecutionUpdate>> {
        let key = subscription.execution_id.as_str().to_string();
        let (inbox, rx) = match subscription.delivery_method {
            DeliveryMethod::PushStream => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Some(tx), Some(rx))
            }
            DeliveryMethod::Webhook => (None, None),
        };

        let mut subs = self.subscriptions.lock().await;
        subs.entry(key).or_default().push(Registered { subscription, inbox });
        rx
    }

    pub async fn unregister(&self, execution_id: &ExecutionId, subscriber_id: &SubscriberId) {
        let mut subs = self.subscriptions.lock().await;
        if let Some(list) = subs.get_mut(execution_id.as_str()) {
            list.retain(|r| &r.subscription.subscriber_id != subscriber_id);
        }
    }

    /// Removes every subscription for an execution, dropping inbox senders
    /// so their receivers observe a closed channel.
    pub async fn cleanup_execution(&self, execution_id: &ExecutionId) {
        self.subscriptions.lock().await.remove(execution_id.as_str());
    }

    /// Fan out one update to every matching subscription. PUSH_STREAM
    /// deliveries that would exceed the inbox ceiling are dropped and the
    /// subscription removed; the caller gets back the resulting overflows.
    /// WEBHOOK deliveries are spawned fire-and-forget with retry.
    pub async fn notify(&self, update: ExecutionUpdate) -> Vec<OverflowError> {
        let key = update.execution_id().as_str().to_string();
        let mut overflowed = Vec::new();

        let mut subs = self.subscriptions.lock().await;
        let Some(list) = subs.get_mut(&key) else {
            return overflowed;
        };

        list.retain(|registered| {
            if !registered.subscription.matches(&update) {
                return true;
            }
            match &registered.inbox {
                Some(tx) => {
                    if tx.len() >= self.config.inbox_ceiling {
                        overflowed.push(OverflowError {
                            subscriber_id: registered.subscription.subscriber_id.clone(),
                            execution_id: registered.subscription.execution_id.clone(),
                        });
                        warn!(
                            subscriber_id = %registered.subscription.subscriber_id,
                            execution_id = %registered.subscription.execution_id,
                            "push-stream inbox overflowed, closing subscription"
                        );
                        return false;
                    }
                    let _ = tx.send(update.clone());
                    true
                }
                None => {
                    if let Some(url) = registered.subscription.webhook_url.clone() {
                        let client = self.http.clone();
                        let config = self.config;
                        let payload = update.clone();
                        tokio::spawn(async move {
                            crate::webhook::deliver(client, url, payload, config).await;
                        });
                    }
                    true
                }
            }
        });

        overflowed
    }
}
