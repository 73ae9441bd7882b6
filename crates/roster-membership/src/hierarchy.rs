//! Group-hierarchy closure engine.
//!
//! Pure functions over the current edge list. Callers fetch the edges
//! fresh from the store on every operation, so no graph state survives
//! between calls.

use std::collections::{HashMap, HashSet};

use roster_core::models::hierarchy::GroupHierarchyEdge;
use uuid::Uuid;

/// Maximum number of transitive descendants a group may already have
/// when a new child edge is proposed.
pub const SUBGROUP_LIMIT: usize = 5;

/// Maximum number of groups a single user may belong to.
pub const USER_GROUP_LIMIT: usize = 5;

/// Why a proposed set of child edges cannot be attached.
///
/// [`check_attach`] reports the first violation found, checked in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachViolation {
    /// A proposed child id equals the parent id.
    SelfReference { group_id: Uuid },
    /// The parent is already reachable from a proposed child, so the
    /// new edge would close a cycle.
    Cycle { child_id: Uuid },
    /// The parent's distinct descendant count is already at the limit.
    SubtreeLimitReached { descendants: usize },
    /// A proposed child is already directly nested under the parent.
    AlreadyChild { child_id: Uuid },
}

/// Parent -> direct children index over the raw edge list.
pub fn adjacency_map(edges: &[GroupHierarchyEdge]) -> HashMap<Uuid, Vec<Uuid>> {
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.parent_group_id)
            .or_default()
            .push(edge.child_group_id);
    }
    adjacency
}

/// Every group transitively reachable from `group_id` by following
/// child edges. The result never contains `group_id` itself, and a
/// descendant reachable via several paths appears once.
pub fn descendants(edges: &[GroupHierarchyEdge], group_id: Uuid) -> HashSet<Uuid> {
    let adjacency = adjacency_map(edges);

    let mut visited = HashSet::new();
    let mut stack: Vec<Uuid> = adjacency.get(&group_id).cloned().unwrap_or_default();
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if let Some(children) = adjacency.get(&current) {
            stack.extend(children.iter().copied());
        }
    }

    visited.remove(&group_id);
    visited
}

/// Every group from which `group_id` is reachable via child edges.
pub fn ancestors(edges: &[GroupHierarchyEdge], group_id: Uuid) -> HashSet<Uuid> {
    let reversed: Vec<GroupHierarchyEdge> = edges
        .iter()
        .map(|edge| GroupHierarchyEdge {
            parent_group_id: edge.child_group_id,
            child_group_id: edge.parent_group_id,
        })
        .collect();
    descendants(&reversed, group_id)
}

/// Groups directly nested under `parent_id`.
pub fn direct_children(edges: &[GroupHierarchyEdge], parent_id: Uuid) -> HashSet<Uuid> {
    edges
        .iter()
        .filter(|edge| edge.parent_group_id == parent_id)
        .map(|edge| edge.child_group_id)
        .collect()
}

/// Validate a batch of proposed child edges under `parent_id` against
/// the edge set as it exists before the batch.
pub fn check_attach(
    edges: &[GroupHierarchyEdge],
    parent_id: Uuid,
    child_ids: &[Uuid],
) -> Result<(), AttachViolation> {
    if child_ids.contains(&parent_id) {
        return Err(AttachViolation::SelfReference {
            group_id: parent_id,
        });
    }

    // A new parent -> child edge closes a cycle exactly when the parent
    // is already in the child's descendant closure.
    for child_id in child_ids {
        if descendants(edges, *child_id).contains(&parent_id) {
            return Err(AttachViolation::Cycle {
                child_id: *child_id,
            });
        }
    }

    let current = descendants(edges, parent_id);
    if current.len() >= SUBGROUP_LIMIT {
        return Err(AttachViolation::SubtreeLimitReached {
            descendants: current.len(),
        });
    }

    let children = direct_children(edges, parent_id);
    if let Some(child_id) = child_ids.iter().find(|id| children.contains(id)) {
        return Err(AttachViolation::AlreadyChild {
            child_id: *child_id,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn edge(parent: u128, child: u128) -> GroupHierarchyEdge {
        GroupHierarchyEdge {
            parent_group_id: id(parent),
            child_group_id: id(child),
        }
    }

    #[test]
    fn descendants_of_chain() {
        let edges = [edge(1, 2), edge(2, 3), edge(3, 4)];
        let result = descendants(&edges, id(1));
        assert_eq!(result, HashSet::from([id(2), id(3), id(4)]));
    }

    #[test]
    fn descendants_never_contains_root() {
        // Even with a cycle already present in the edge set.
        let edges = [edge(1, 2), edge(2, 1)];
        let result = descendants(&edges, id(1));
        assert_eq!(result, HashSet::from([id(2)]));
    }

    #[test]
    fn descendants_of_leaf_is_empty() {
        let edges = [edge(1, 2)];
        assert!(descendants(&edges, id(2)).is_empty());
    }

    #[test]
    fn diamond_counts_shared_descendant_once() {
        // 1 -> 2, 1 -> 3, 2 -> 4, 3 -> 4: node 4 is reachable twice but
        // counts once toward the limit.
        let edges = [edge(1, 2), edge(1, 3), edge(2, 4), edge(3, 4)];
        let result = descendants(&edges, id(1));
        assert_eq!(result.len(), 3);
        assert_eq!(result, HashSet::from([id(2), id(3), id(4)]));
    }

    #[test]
    fn ancestors_walks_parent_edges() {
        let edges = [edge(1, 2), edge(2, 3), edge(4, 3)];
        let result = ancestors(&edges, id(3));
        assert_eq!(result, HashSet::from([id(1), id(2), id(4)]));
    }

    #[test]
    fn attach_rejects_self_reference() {
        let err = check_attach(&[], id(1), &[id(2), id(1)]).unwrap_err();
        assert_eq!(err, AttachViolation::SelfReference { group_id: id(1) });
    }

    #[test]
    fn attach_rejects_cycle_through_ancestor() {
        // 1 -> 2 -> 3; attaching 1 under 3 would close the loop.
        let edges = [edge(1, 2), edge(2, 3)];
        let err = check_attach(&edges, id(3), &[id(1)]).unwrap_err();
        assert_eq!(err, AttachViolation::Cycle { child_id: id(1) });
    }

    #[test]
    fn attach_rejects_subtree_at_limit() {
        // Five descendants under 1, counted before the batch.
        let edges = [edge(1, 2), edge(1, 3), edge(3, 4), edge(4, 5), edge(5, 6)];
        let err = check_attach(&edges, id(1), &[id(7)]).unwrap_err();
        assert_eq!(err, AttachViolation::SubtreeLimitReached { descendants: 5 });
    }

    #[test]
    fn attach_rejects_existing_direct_child() {
        let edges = [edge(1, 2)];
        let err = check_attach(&edges, id(1), &[id(2)]).unwrap_err();
        assert_eq!(err, AttachViolation::AlreadyChild { child_id: id(2) });
    }

    #[test]
    fn attach_allows_shared_child_between_parents() {
        // 1 -> 3 and 2 -> 3 both exist; nesting 2 under 1 is fine.
        let edges = [edge(1, 3), edge(2, 3)];
        assert!(check_attach(&edges, id(1), &[id(2)]).is_ok());
    }

    #[test]
    fn self_reference_takes_priority_over_limit() {
        let edges = [edge(1, 2), edge(1, 3), edge(3, 4), edge(4, 5), edge(5, 6)];
        let err = check_attach(&edges, id(1), &[id(1)]).unwrap_err();
        assert_eq!(err, AttachViolation::SelfReference { group_id: id(1) });
    }
}
