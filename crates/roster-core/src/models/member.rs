//! Membership projections returned by the service layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::User;

/// Public projection of a user added to a group or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for MemberRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
        }
    }
}

/// Echo of a removed (group, user) membership edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: Uuid,
    pub user_id: Uuid,
}

/// Echo of a removed (project, user) membership edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMembership {
    pub project_id: Uuid,
    pub user_id: Uuid,
}
