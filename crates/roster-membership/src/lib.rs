//! Roster Membership — the hierarchy constraint engine, membership
//! orchestration for groups and projects, and the flattened
//! project-roster query.

pub mod hierarchy;
pub mod roster;
pub mod service;

pub use roster::{ProjectRoster, RosterMember, RosterQuery};
pub use service::MembershipService;
