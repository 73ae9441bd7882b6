//! Project roster aggregation — flattens a project's effective members
//! across the group hierarchy.

use std::collections::{BTreeSet, HashSet};

use roster_core::error::RosterResult;
use roster_core::models::user::User;
use roster_core::repository::{GroupRepository, ProjectRepository};
use serde::Serialize;
use uuid::Uuid;

use crate::hierarchy;

/// One flattened member row: the user plus the deduplicated names of
/// every group that applies to them, directly or via ancestor groups.
#[derive(Debug, Clone, Serialize)]
pub struct RosterMember {
    pub id: Uuid,
    pub name: String,
    pub groups: Vec<String>,
}

/// A project together with its flattened member list.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRoster {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<RosterMember>,
}

/// Read-side aggregation over injected repositories.
pub struct RosterQuery<G, P> {
    groups: G,
    projects: P,
}

impl<G, P> RosterQuery<G, P>
where
    G: GroupRepository,
    P: ProjectRepository,
{
    pub fn new(groups: G, projects: P) -> Self {
        Self { groups, projects }
    }

    /// List every user associated with a project — directly, through a
    /// linked group, or through a nested sub-group of a linked group —
    /// each with the names of all their groups and ancestor groups.
    ///
    /// Group names are deduplicated and sorted; ordering beyond "all
    /// applicable groups present, no duplicates" is not contractual.
    pub async fn list_project_members(&self, project_id: Uuid) -> RosterResult<ProjectRoster> {
        let project = self.projects.get_by_id(project_id).await?;

        let edges = self.groups.list_hierarchy_edges().await?;

        // Effective member set: direct users, then members of every
        // linked group and of every descendant of a linked group.
        let mut members: Vec<User> = self.projects.get_members(project_id).await?;
        let mut seen: HashSet<Uuid> = members.iter().map(|user| user.id).collect();

        let mut reachable_groups: Vec<Uuid> = Vec::new();
        let mut reachable_seen: HashSet<Uuid> = HashSet::new();
        for group in self.projects.get_groups(project_id).await? {
            if reachable_seen.insert(group.id) {
                reachable_groups.push(group.id);
            }
            for descendant in hierarchy::descendants(&edges, group.id) {
                if reachable_seen.insert(descendant) {
                    reachable_groups.push(descendant);
                }
            }
        }
        for group_id in reachable_groups {
            for user in self.groups.get_members(group_id).await? {
                if seen.insert(user.id) {
                    members.push(user);
                }
            }
        }

        let mut rows = Vec::with_capacity(members.len());
        for user in members {
            let direct = self.groups.get_user_groups(user.id).await?;

            // Ancestors of the user's direct groups, minus any the user
            // already belongs to directly.
            let mut ancestor_ids: HashSet<Uuid> = HashSet::new();
            for group in &direct {
                ancestor_ids.extend(hierarchy::ancestors(&edges, group.id));
            }
            ancestor_ids.retain(|id| !direct.iter().any(|group| group.id == *id));
            let ancestor_ids: Vec<Uuid> = ancestor_ids.into_iter().collect();
            let ancestor_groups = self.groups.get_by_ids(&ancestor_ids).await?;

            let names: BTreeSet<String> = direct
                .iter()
                .map(|group| group.name.clone())
                .chain(ancestor_groups.into_iter().map(|group| group.name))
                .collect();

            rows.push(RosterMember {
                id: user.id,
                name: user.full_name(),
                groups: names.into_iter().collect(),
            });
        }

        Ok(ProjectRoster {
            id: project.id,
            name: project.name,
            members: rows,
        })
    }
}
