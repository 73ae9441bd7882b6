//! SurrealDB implementation of [`ProjectRepository`].
//!
//! Direct membership uses `assigned_to` edges (user -> project);
//! group links use `included_in` edges (group -> project).

use chrono::{DateTime, Utc};
use roster_core::error::RosterResult;
use roster_core::models::group::Group;
use roster_core::models::project::{CreateProject, Project};
use roster_core::models::user::User;
use roster_core::repository::ProjectRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ProjectRow {
    name: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ProjectRowWithId {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl ProjectRowWithId {
    fn try_into_project(self) -> Result<Project, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Project {
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

/// DB-side row struct for linked groups returned from edge queries.
#[derive(Debug, SurrealValue)]
struct LinkedGroupRow {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl LinkedGroupRow {
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

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> RosterResult<Project> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query("CREATE type::record('project', $id) SET name = $name")
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(Project {
            id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> RosterResult<Project> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('project', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(Project {
            id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    async fn get_members(&self, project_id: Uuid) -> RosterResult<Vec<User>> {
        let project_id_str = project_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE id IN (\
                     SELECT VALUE in FROM assigned_to \
                     WHERE out = type::record('project', $project_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("project_id", project_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;

        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }

    async fn get_groups(&self, project_id: Uuid) -> RosterResult<Vec<Group>> {
        let project_id_str = project_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE id IN (\
                     SELECT VALUE in FROM included_in \
                     WHERE out = type::record('project', $project_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("project_id", project_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LinkedGroupRow> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn get_user_projects(&self, user_id: Uuid) -> RosterResult<Vec<Project>> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM project \
                 WHERE id IN (\
                     SELECT VALUE out FROM assigned_to \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRowWithId> = result.take(0).map_err(DbError::from)?;

        let projects = rows
            .into_iter()
            .map(|row| row.try_into_project())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(projects)
    }

    async fn add_members(&self, project_id: Uuid, user_ids: &[Uuid]) -> RosterResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let project_id_str = project_id.to_string();

        let mut statements = vec!["BEGIN TRANSACTION".to_string()];
        for user_id in user_ids {
            statements.push(format!(
                "RELATE user:`{user_id}` -> assigned_to -> project:`{project_id_str}`"
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

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> RosterResult<()> {
        self.db
            .query(
                "DELETE assigned_to WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('project', $project_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn add_groups(&self, project_id: Uuid, group_ids: &[Uuid]) -> RosterResult<()> {
        if group_ids.is_empty() {
            return Ok(());
        }
        let project_id_str = project_id.to_string();

        let mut statements = vec!["BEGIN TRANSACTION".to_string()];
        for group_id in group_ids {
            statements.push(format!(
                "RELATE group:`{group_id}` -> included_in -> project:`{project_id_str}`"
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
