//! Change notifications for observers of a model system.
//!
//! Commands describe what they changed as a list of [`ChangeEvent`]s. The
//! session publishes them after every committed edit, undo or redo, to every
//! subscriber's channel.

use crate::core::error::{BoundaryId, LinkId, NodeId};
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

/// A node attribute that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    Name,
    Description,
    Location,
    Disabled,
    Parameter,
    Type,
}

/// A change applied to a model system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A node was placed in a boundary.
    NodeAdded { boundary: BoundaryId, node: NodeId },
    /// A node was removed from a boundary.
    NodeRemoved { boundary: BoundaryId, node: NodeId },
    /// One of a node's attributes changed.
    NodeChanged { node: NodeId, property: NodeProperty },
    /// A link was added.
    LinkAdded { link: LinkId },
    /// A link was removed.
    LinkRemoved { link: LinkId },
    /// A nested boundary was added.
    BoundaryAdded { parent: BoundaryId, boundary: BoundaryId },
    /// A nested boundary was removed with everything in it.
    BoundaryRemoved { parent: BoundaryId, boundary: BoundaryId },
}

/// Subscribers to a session's change events.
#[derive(Default)]
pub struct EventRegistry {
    subscribers: Mutex<Vec<Sender<ChangeEvent>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer and return its receiving end.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Send events to every live subscriber. Dropped receivers are forgotten.
    pub fn publish(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sender| events.iter().all(|event| sender.send(event.clone()).is_ok()));
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let registry = EventRegistry::new();
        let first = registry.subscribe();
        let second = registry.subscribe();

        let event = ChangeEvent::LinkAdded { link: LinkId(4) };
        registry.publish(std::slice::from_ref(&event));

        assert_eq!(first.try_recv(), Ok(event.clone()));
        assert_eq!(second.try_recv(), Ok(event));
        assert!(first.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let registry = EventRegistry::new();
        let kept = registry.subscribe();
        drop(registry.subscribe());
        assert_eq!(registry.subscriber_count(), 2);

        registry.publish(&[ChangeEvent::NodeChanged {
            node: NodeId(1),
            property: NodeProperty::Name,
        }]);
        assert_eq!(registry.subscriber_count(), 1);
        assert_eq!(kept.len(), 1);
    }
}
