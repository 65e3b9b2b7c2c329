//! Link types for the graph.

use crate::core::error::{LinkId, NodeId};
use serde::{Deserialize, Serialize};

/// The origin of a link (node + hook).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// The node ID.
    pub node_id: NodeId,
    /// The hook name on that node.
    pub hook_name: String,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(node_id: NodeId, hook_name: impl Into<String>) -> Self {
        Self {
            node_id,
            hook_name: hook_name.into(),
        }
    }
}

/// A directed edge from a node's hook to a destination node.
///
/// Links live in the boundary that owns their origin node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier for this link.
    pub id: LinkId,
    /// Origin node and hook.
    pub origin: Endpoint,
    /// Destination node.
    pub destination: NodeId,
}

impl Link {
    /// Create a new link.
    pub fn new(id: LinkId, origin: Endpoint, destination: NodeId) -> Self {
        Self {
            id,
            origin,
            destination,
        }
    }

    /// Check whether the link starts or ends at the given node.
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.origin.node_id == node_id || self.destination == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_touches() {
        let link = Link::new(LinkId(0), Endpoint::new(NodeId(1), "ToExecute"), NodeId(2));

        assert!(link.touches(NodeId(1)));
        assert!(link.touches(NodeId(2)));
        assert!(!link.touches(NodeId(3)));
        assert_eq!(link.origin.hook_name, "ToExecute");
    }
}
