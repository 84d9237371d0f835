//! Events that stores publish for each other.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Store-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The gateway accepted a transaction.
    TransactionSubmitted {
        from_address: String,
        blockchain: String,
        network: String,
        tx_hash: String,
    },
    /// A new address was generated.
    AddressCreated {
        address: String,
        blockchain: String,
        network: String,
    },
    /// The user logged out; cached account data is no longer theirs.
    LoggedOut,
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &StoreEvent);
}

/// Async fan-out event bus.
///
/// `emit` awaits every listener in subscription order before returning, so
/// a caller that emits after a mutation also observes the reactions.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub async fn emit(&self, event: &StoreEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for listener in listeners {
            listener.on_event(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventListener for Recorder {
        async fn on_event(&self, event: &StoreEvent) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{event:?}", self.tag));
        }
    }

    #[tokio::test]
    async fn emit_calls_all_listeners_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();
        bus.subscribe(Arc::new(Recorder {
            tag: "first",
            seen: Arc::clone(&seen),
        }));
        bus.subscribe(Arc::new(Recorder {
            tag: "second",
            seen: Arc::clone(&seen),
        }));

        bus.emit(&StoreEvent::LoggedOut).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:LoggedOut".to_string(), "second:LoggedOut".to_string()]
        );
        assert_eq!(bus.listener_count(), 2);
    }

    #[tokio::test]
    async fn emit_with_no_listeners_is_noop() {
        EventBus::new().emit(&StoreEvent::LoggedOut).await;
    }
}
