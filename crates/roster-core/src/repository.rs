//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations are injected
//! into the service layer; the core never touches a concrete store and
//! re-reads whatever edges it needs on every call.

use uuid::Uuid;

use crate::error::RosterResult;
use crate::models::group::{CreateGroup, Group};
use crate::models::hierarchy::GroupHierarchyEdge;
use crate::models::project::{CreateProject, Project};
use crate::models::user::{CreateUser, User};

pub trait UserRepository: Send + Sync {
    /// Seed a user. Entity creation is out-of-band for the membership
    /// subsystem; this exists for bootstrap and tests.
    fn create(&self, input: CreateUser) -> impl Future<Output = RosterResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RosterResult<User>> + Send;
    /// Resolve a batch of ids; unknown ids are simply absent from the
    /// result, so callers compare counts to detect them.
    fn get_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = RosterResult<Vec<User>>> + Send;
}

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = RosterResult<Group>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RosterResult<Group>> + Send;
    fn get_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = RosterResult<Vec<Group>>> + Send;

    /// Get all direct member users of a group.
    fn get_members(&self, group_id: Uuid) -> impl Future<Output = RosterResult<Vec<User>>> + Send;

    /// Get all groups a user is a direct member of.
    fn get_user_groups(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = RosterResult<Vec<Group>>> + Send;

    /// Create one membership edge per user, written as a single
    /// transactional batch: all edges commit or none do.
    fn add_members(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
    ) -> impl Future<Output = RosterResult<()>> + Send;

    /// Delete a single (group, user) membership edge.
    fn remove_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = RosterResult<()>> + Send;

    /// All (parent, child) nesting edges in the hierarchy graph.
    fn list_hierarchy_edges(
        &self,
    ) -> impl Future<Output = RosterResult<Vec<GroupHierarchyEdge>>> + Send;

    /// Create one nesting edge per child under `parent_id`, written as
    /// a single transactional batch.
    fn add_children(
        &self,
        parent_id: Uuid,
        child_ids: &[Uuid],
    ) -> impl Future<Output = RosterResult<()>> + Send;
}

pub trait ProjectRepository: Send + Sync {
    fn create(&self, input: CreateProject) -> impl Future<Output = RosterResult<Project>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RosterResult<Project>> + Send;

    /// Get all users directly added to a project.
    fn get_members(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = RosterResult<Vec<User>>> + Send;

    /// Get all groups directly linked to a project.
    fn get_groups(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = RosterResult<Vec<Group>>> + Send;

    /// Get all projects a user is a direct member of.
    fn get_user_projects(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = RosterResult<Vec<Project>>> + Send;

    /// Create one membership edge per user, written as a single
    /// transactional batch.
    fn add_members(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> impl Future<Output = RosterResult<()>> + Send;

    /// Delete a single (project, user) membership edge.
    fn remove_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = RosterResult<()>> + Send;

    /// Link one group per id to the project, written as a single
    /// transactional batch.
    fn add_groups(
        &self,
        project_id: Uuid,
        group_ids: &[Uuid],
    ) -> impl Future<Output = RosterResult<()>> + Send;
}
