//! Membership service — add/remove orchestration for groups and
//! projects.
//!
//! Every operation follows the same shape: fetch the container,
//! validate the batch, validate the business rules, then mutate the
//! store in a single call. Nothing is written until validation has
//! fully passed, so a rejected request leaves the store untouched.

use roster_core::error::{RosterError, RosterResult};
use roster_core::models::member::{GroupMembership, MemberRecord, ProjectMembership};
use roster_core::repository::{GroupRepository, ProjectRepository, UserRepository};
use uuid::Uuid;

use crate::hierarchy::{self, AttachViolation, SUBGROUP_LIMIT, USER_GROUP_LIMIT};

/// Membership orchestration over injected repositories.
///
/// Generic over the repository traits so the service layer has no
/// dependency on the database crate.
pub struct MembershipService<U, G, P> {
    users: U,
    groups: G,
    projects: P,
}

impl<U, G, P> MembershipService<U, G, P>
where
    U: UserRepository,
    G: GroupRepository,
    P: ProjectRepository,
{
    pub fn new(users: U, groups: G, projects: P) -> Self {
        Self {
            users,
            groups,
            projects,
        }
    }

    /// Add a batch of users as direct members of a group.
    ///
    /// Returns the added users' public projections in the order the
    /// store resolved them, which is not necessarily the input order.
    pub async fn add_users_to_group(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
    ) -> RosterResult<Vec<MemberRecord>> {
        // 1. Container must exist before any batch validation.
        self.groups.get_by_id(group_id).await?;

        // 2. Resolve the batch; a count mismatch means an unknown id.
        let users = self.users.get_by_ids(user_ids).await?;
        if users.len() != user_ids.len() {
            return Err(RosterError::InvalidBatch {
                entity: "user".into(),
            });
        }
        if users.is_empty() {
            return Ok(Vec::new());
        }

        // 3. Business rules: duplicate membership, then the per-user cap.
        let mut memberships = Vec::with_capacity(users.len());
        for user in &users {
            memberships.push(self.groups.get_user_groups(user.id).await?);
        }

        if memberships
            .iter()
            .any(|groups| groups.iter().any(|group| group.id == group_id))
        {
            return Err(RosterError::AlreadyMember {
                entity: "user".into(),
                container: "group".into(),
            });
        }

        if let Some((user, _)) = users
            .iter()
            .zip(&memberships)
            .find(|(_, groups)| groups.len() >= USER_GROUP_LIMIT)
        {
            return Err(RosterError::LimitExceeded {
                id: user.id.to_string(),
                limit: USER_GROUP_LIMIT,
            });
        }

        // 4. Write the whole batch as one store call.
        self.groups.add_members(group_id, user_ids).await?;

        Ok(users.iter().map(MemberRecord::from).collect())
    }

    /// Nest a batch of groups under a parent group.
    ///
    /// Echoes the input id list on success.
    pub async fn add_groups_to_group(
        &self,
        parent_id: Uuid,
        child_ids: &[Uuid],
    ) -> RosterResult<Vec<Uuid>> {
        self.groups.get_by_id(parent_id).await?;

        let resolved = self.groups.get_by_ids(child_ids).await?;
        if resolved.len() != child_ids.len() {
            return Err(RosterError::InvalidBatch {
                entity: "group".into(),
            });
        }
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        // Structural rules run against the closure as it exists before
        // this batch.
        let edges = self.groups.list_hierarchy_edges().await?;
        hierarchy::check_attach(&edges, parent_id, child_ids).map_err(|violation| {
            match violation {
                AttachViolation::SelfReference { group_id } => RosterError::SelfReference {
                    id: group_id.to_string(),
                },
                // The taxonomy has no separate cycle kind: a cycle means
                // the child would transitively contain itself.
                AttachViolation::Cycle { child_id } => RosterError::SelfReference {
                    id: child_id.to_string(),
                },
                AttachViolation::SubtreeLimitReached { descendants } => {
                    RosterError::DepthExceeded {
                        id: parent_id.to_string(),
                        descendants,
                        limit: SUBGROUP_LIMIT,
                    }
                }
                AttachViolation::AlreadyChild { .. } => RosterError::AlreadyMember {
                    entity: "group".into(),
                    container: "group".into(),
                },
            }
        })?;

        self.groups.add_children(parent_id, child_ids).await?;

        Ok(child_ids.to_vec())
    }

    /// Remove a user from a group, echoing the deleted edge.
    pub async fn remove_user_from_group(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> RosterResult<GroupMembership> {
        self.groups.get_by_id(group_id).await?;
        self.users.get_by_id(user_id).await?;

        let is_member = self
            .groups
            .get_user_groups(user_id)
            .await?
            .iter()
            .any(|group| group.id == group_id);
        if !is_member {
            return Err(RosterError::NotMember {
                entity: "user".into(),
                id: user_id.to_string(),
                container: "group".into(),
                container_id: group_id.to_string(),
            });
        }

        self.groups.remove_member(group_id, user_id).await?;

        Ok(GroupMembership { group_id, user_id })
    }

    /// Add a batch of users as direct members of a project.
    ///
    /// Same shape as the group variant, minus the per-user group cap.
    pub async fn add_users_to_project(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> RosterResult<Vec<MemberRecord>> {
        self.projects.get_by_id(project_id).await?;

        let users = self.users.get_by_ids(user_ids).await?;
        if users.len() != user_ids.len() {
            return Err(RosterError::InvalidBatch {
                entity: "user".into(),
            });
        }
        if users.is_empty() {
            return Ok(Vec::new());
        }

        for user in &users {
            let projects = self.projects.get_user_projects(user.id).await?;
            if projects.iter().any(|project| project.id == project_id) {
                return Err(RosterError::AlreadyMember {
                    entity: "user".into(),
                    container: "project".into(),
                });
            }
        }

        self.projects.add_members(project_id, user_ids).await?;

        Ok(users.iter().map(MemberRecord::from).collect())
    }

    /// Link a batch of groups to a project, echoing the input id list.
    pub async fn add_groups_to_project(
        &self,
        project_id: Uuid,
        group_ids: &[Uuid],
    ) -> RosterResult<Vec<Uuid>> {
        self.projects.get_by_id(project_id).await?;

        let resolved = self.groups.get_by_ids(group_ids).await?;
        if resolved.len() != group_ids.len() {
            return Err(RosterError::InvalidBatch {
                entity: "group".into(),
            });
        }
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        let linked = self.projects.get_groups(project_id).await?;
        if group_ids
            .iter()
            .any(|id| linked.iter().any(|group| group.id == *id))
        {
            return Err(RosterError::AlreadyMember {
                entity: "group".into(),
                container: "project".into(),
            });
        }

        self.projects.add_groups(project_id, group_ids).await?;

        Ok(group_ids.to_vec())
    }

    /// Remove a user from a project, echoing the deleted edge.
    pub async fn remove_user_from_project(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> RosterResult<ProjectMembership> {
        self.projects.get_by_id(project_id).await?;
        self.users.get_by_id(user_id).await?;

        let is_member = self
            .projects
            .get_user_projects(user_id)
            .await?
            .iter()
            .any(|project| project.id == project_id);
        if !is_member {
            return Err(RosterError::NotMember {
                entity: "user".into(),
                id: user_id.to_string(),
                container: "project".into(),
                container_id: project_id.to_string(),
            });
        }

        self.projects.remove_member(project_id, user_id).await?;

        Ok(ProjectMembership {
            project_id,
            user_id,
        })
    }
}
