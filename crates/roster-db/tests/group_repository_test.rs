//! Integration tests for the Group repository using in-memory
//! SurrealDB.

use roster_core::error::RosterError;
use roster_core::models::group::CreateGroup;
use roster_core::models::user::CreateUser;
use roster_core::repository::{GroupRepository, UserRepository};
use roster_db::repository::{SurrealGroupRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Spin up an in-memory DB, run migrations, create two users.
async fn setup() -> (SurrealGroupRepository<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roster_db::run_migrations(&db).await.unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let alice = user_repo
        .create(CreateUser {
            first_name: "Alice".into(),
            last_name: "Archer".into(),
        })
        .await
        .unwrap();
    let bob = user_repo
        .create(CreateUser {
            first_name: "Bob".into(),
            last_name: "Baker".into(),
        })
        .await
        .unwrap();

    (SurrealGroupRepository::new(db), alice.id, bob.id)
}

#[tokio::test]
async fn create_and_get_group() {
    let (repo, _, _) = setup().await;

    let group = repo
        .create(CreateGroup {
            name: "Developers".into(),
        })
        .await
        .unwrap();
    assert_eq!(group.name, "Developers");

    let fetched = repo.get_by_id(group.id).await.unwrap();
    assert_eq!(fetched.id, group.id);
    assert_eq!(fetched.name, "Developers");
}

#[tokio::test]
async fn get_missing_group_fails() {
    let (repo, _, _) = setup().await;

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RosterError::NotFound { ref entity, .. } if entity == "group"));
}

#[tokio::test]
async fn get_by_ids_skips_unknown_ids() {
    let (repo, _, _) = setup().await;

    let g1 = repo.create(CreateGroup { name: "One".into() }).await.unwrap();
    let g2 = repo.create(CreateGroup { name: "Two".into() }).await.unwrap();

    let found = repo
        .get_by_ids(&[g1.id, g2.id, Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let mut ids: Vec<Uuid> = found.iter().map(|g| g.id).collect();
    ids.sort();
    let mut expected = vec![g1.id, g2.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn add_and_get_members() {
    let (repo, alice, bob) = setup().await;
    let group = repo.create(CreateGroup { name: "Team".into() }).await.unwrap();

    repo.add_members(group.id, &[alice, bob]).await.unwrap();

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 2);

    let names: Vec<&str> = members.iter().map(|u| u.first_name.as_str()).collect();
    assert!(names.contains(&"Alice"));
    assert!(names.contains(&"Bob"));
}

#[tokio::test]
async fn get_user_groups_lists_direct_memberships() {
    let (repo, alice, _) = setup().await;
    let g1 = repo.create(CreateGroup { name: "One".into() }).await.unwrap();
    let g2 = repo.create(CreateGroup { name: "Two".into() }).await.unwrap();

    repo.add_members(g1.id, &[alice]).await.unwrap();
    repo.add_members(g2.id, &[alice]).await.unwrap();

    let groups = repo.get_user_groups(alice).await.unwrap();
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn remove_member_deletes_only_that_edge() {
    let (repo, alice, bob) = setup().await;
    let group = repo.create(CreateGroup { name: "Team".into() }).await.unwrap();
    repo.add_members(group.id, &[alice, bob]).await.unwrap();

    repo.remove_member(group.id, alice).await.unwrap();

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, bob);
}

#[tokio::test]
async fn add_children_and_list_hierarchy_edges() {
    let (repo, _, _) = setup().await;
    let parent = repo
        .create(CreateGroup {
            name: "Parent".into(),
        })
        .await
        .unwrap();
    let child_a = repo.create(CreateGroup { name: "A".into() }).await.unwrap();
    let child_b = repo.create(CreateGroup { name: "B".into() }).await.unwrap();

    repo.add_children(parent.id, &[child_a.id, child_b.id])
        .await
        .unwrap();

    let edges = repo.list_hierarchy_edges().await.unwrap();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.parent_group_id == parent.id));

    let mut children: Vec<Uuid> = edges.iter().map(|e| e.child_group_id).collect();
    children.sort();
    let mut expected = vec![child_a.id, child_b.id];
    expected.sort();
    assert_eq!(children, expected);
}

#[tokio::test]
async fn duplicate_membership_edge_is_rejected_by_the_index() {
    let (repo, alice, _) = setup().await;
    let group = repo.create(CreateGroup { name: "Team".into() }).await.unwrap();

    repo.add_members(group.id, &[alice]).await.unwrap();

    // Bypassing service validation: the unique (in, out) index is the
    // last line of defense.
    let err = repo.add_members(group.id, &[alice]).await.unwrap_err();
    assert!(matches!(err, RosterError::Database(_)));

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn failed_batch_writes_nothing() {
    let (repo, alice, bob) = setup().await;
    let group = repo.create(CreateGroup { name: "Team".into() }).await.unwrap();
    repo.add_members(group.id, &[alice]).await.unwrap();

    // Bob's edge is valid but rides in the same transaction as the
    // duplicate, so the whole batch rolls back.
    let err = repo.add_members(group.id, &[bob, alice]).await.unwrap_err();
    assert!(matches!(err, RosterError::Database(_)));

    let members = repo.get_members(group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, alice);
}
