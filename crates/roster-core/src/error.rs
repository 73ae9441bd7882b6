//! Error types for the Roster system.

use thiserror::Error;

/// Failure taxonomy surfaced by the membership service and the stores.
///
/// Every business-rule violation is detected before any mutation. The
/// transport layer renders `NotFound` as 404 and every other
/// business-rule variant as 400; `Database` and `Internal` are
/// unclassified server-side failures.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: String, id: String },

    #[error("batch addition failed, a {entity} could not be found")]
    InvalidBatch { entity: String },

    #[error("one of the {entity}s is already a member of the {container}")]
    AlreadyMember { entity: String, container: String },

    #[error("group {id} cannot contain itself")]
    SelfReference { id: String },

    #[error("group {id} already has {descendants} nested groups (limit {limit})")]
    DepthExceeded {
        id: String,
        descendants: usize,
        limit: usize,
    },

    #[error("user {id} has reached the limit of {limit} groups")]
    LimitExceeded { id: String, limit: usize },

    #[error("{entity} with ID {id} is not a member of {container} with ID {container_id}")]
    NotMember {
        entity: String,
        id: String,
        container: String,
        container_id: String,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type RosterResult<T> = Result<T, RosterError>;
