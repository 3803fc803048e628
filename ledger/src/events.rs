//! Events emitted during block processing for subscribers.

use agora_types::{Block, CycleResult, Phase};

/// State-machine events observers can subscribe to via the [`EventBus`].
///
/// Per block the order is: `NewBlockHeight`, `EmptyBlockAdded`,
/// `ParseBlockComplete`, then at most one `PhaseChanged` and at most one
/// `CycleComplete`.
#[derive(Clone, Debug)]
pub enum DaoEvent {
    /// A connecting block arrived; its height is now the chain height.
    NewBlockHeight(u32),
    /// The block envelope was accepted, txs not yet parsed.
    EmptyBlockAdded(Block),
    /// All txs of the block are parsed and committed.
    ParseBlockComplete(Block),
    /// The governance phase changed with this block.
    PhaseChanged { height: u32, phase: Phase },
    /// A cycle's votes were tallied.
    CycleComplete(CycleResult),
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the ingest task in registration order;
/// they observe committed state only and must not mutate the ledger.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&DaoEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DaoEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &DaoEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn emit_calls_all_listeners_in_order() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let l1 = Arc::clone(&log);
        bus.subscribe(Box::new(move |_| l1.lock().unwrap().push(1)));
        let l2 = Arc::clone(&log);
        bus.subscribe(Box::new(move |_| l2.lock().unwrap().push(2)));

        bus.emit(&DaoEvent::NewBlockHeight(7));
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&DaoEvent::NewBlockHeight(1));
    }

    #[test]
    fn listener_sees_event_payload() {
        let heights = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();
        let h = Arc::clone(&heights);
        bus.subscribe(Box::new(move |event| {
            if let DaoEvent::NewBlockHeight(height) = event {
                h.store(*height as usize, Ordering::SeqCst);
            }
        }));
        bus.emit(&DaoEvent::NewBlockHeight(123));
        assert_eq!(heights.load(Ordering::SeqCst), 123);
    }
}
