//! SurrealDB repository implementations.

mod group;
mod project;
mod user;

pub use group::SurrealGroupRepository;
pub use project::SurrealProjectRepository;
pub use user::SurrealUserRepository;
