//! Group hierarchy edge model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed nesting edge in the group graph.
///
/// A group may have multiple parents and multiple children (the graph
/// is a DAG, not a tree); the graph as a whole must stay acyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupHierarchyEdge {
    pub parent_group_id: Uuid,
    pub child_group_id: Uuid,
}
