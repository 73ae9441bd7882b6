//! SurrealDB implementation of [`GroupRepository`].
//!
//! Membership uses `member_of` edges (user -> group); nesting uses
//! `child_of` edges (child group -> parent group). Batch writes go
//! through a single transaction so a batch commits fully or not at
//! all; the unique (in, out) indexes reject raced duplicates.

use chrono::{DateTime, Utc};
use roster_core::error::RosterResult;
use roster_core::models::group::{CreateGroup, Group};
use roster_core::models::hierarchy::GroupHierarchyEdge;
use roster_core::models::user::User;
use roster_core::repository::GroupRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    name: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Group {
            id,
            name: self.name,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct for user members returned from edge queries.
#[derive(Debug, SurrealValue)]
struct MemberRow {
    record_id: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
}

impl MemberRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct for nesting edges.
#[derive(Debug, SurrealValue)]
struct EdgeRow {
    child_id: String,
    parent_id: String,
}

impl EdgeRow {
    fn try_into_edge(self) -> Result<GroupHierarchyEdge, DbError> {
        let parent_group_id = Uuid::parse_str(&self.parent_id)
            .map_err(|e| DbError::Query(format!("invalid parent UUID: {e}")))?;
        let child_group_id = Uuid::parse_str(&self.child_id)
            .map_err(|e| DbError::Query(format!("invalid child UUID: {e}")))?;
        Ok(GroupHierarchyEdge {
            parent_group_id,
            child_group_id,
        })
    }
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> RosterResult<Group> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query("CREATE type::record('group', $id) SET name = $name")
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(Group {
            id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> RosterResult<Group> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('group', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(Group {
            id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> RosterResult<Vec<Group>> {
        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE meta::id(id) IN $ids \
                 ORDER BY created_at ASC",
            )
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn get_members(&self, group_id: Uuid) -> RosterResult<Vec<User>> {
        let group_id_str = group_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("group_id", group_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;

        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }

    async fn get_user_groups(&self, user_id: Uuid) -> RosterResult<Vec<Group>> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn add_members(&self, group_id: Uuid, user_ids: &[Uuid]) -> RosterResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let group_id_str = group_id.to_string();

        let mut statements = vec!["BEGIN TRANSACTION".to_string()];
        for user_id in user_ids {
            statements.push(format!(
                "RELATE user:`{user_id}` -> member_of -> group:`{group_id_str}`"
            ));
        }
        statements.push("COMMIT TRANSACTION".to_string());

        self.db
            .query(statements.join(";\n"))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> RosterResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('group', $group_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_hierarchy_edges(&self) -> RosterResult<Vec<GroupHierarchyEdge>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(in) AS child_id, meta::id(out) AS parent_id \
                 FROM child_of",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EdgeRow> = result.take(0).map_err(DbError::from)?;

        let edges = rows
            .into_iter()
            .map(|row| row.try_into_edge())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(edges)
    }

    async fn add_children(&self, parent_id: Uuid, child_ids: &[Uuid]) -> RosterResult<()> {
        if child_ids.is_empty() {
            return Ok(());
        }
        let parent_id_str = parent_id.to_string();

        let mut statements = vec!["BEGIN TRANSACTION".to_string()];
        for child_id in child_ids {
            statements.push(format!(
                "RELATE group:`{child_id}` -> child_of -> group:`{parent_id_str}`"
            ));
        }
        statements.push("COMMIT TRANSACTION".to_string());

        self.db
            .query(statements.join(";\n"))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
