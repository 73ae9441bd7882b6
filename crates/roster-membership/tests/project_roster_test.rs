//! Integration tests for the flattened project-roster query using
//! in-memory SurrealDB.

use roster_core::error::RosterError;
use roster_core::models::group::CreateGroup;
use roster_core::models::project::CreateProject;
use roster_core::models::user::CreateUser;
use roster_core::repository::{GroupRepository, ProjectRepository, UserRepository};
use roster_db::repository::{
    SurrealGroupRepository, SurrealProjectRepository, SurrealUserRepository,
};
use roster_membership::{MembershipService, RosterQuery};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type Service =
    MembershipService<SurrealUserRepository<Db>, SurrealGroupRepository<Db>, SurrealProjectRepository<Db>>;
type Query = RosterQuery<SurrealGroupRepository<Db>, SurrealProjectRepository<Db>>;

async fn setup() -> (
    Service,
    Query,
    SurrealUserRepository<Db>,
    SurrealGroupRepository<Db>,
    SurrealProjectRepository<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roster_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let groups = SurrealGroupRepository::new(db.clone());
    let projects = SurrealProjectRepository::new(db);

    let service = MembershipService::new(users.clone(), groups.clone(), projects.clone());
    let query = RosterQuery::new(groups.clone(), projects.clone());
    (service, query, users, groups, projects)
}

async fn seed_user(repo: &SurrealUserRepository<Db>, first: &str, last: &str) -> Uuid {
    repo.create(CreateUser {
        first_name: first.into(),
        last_name: last.into(),
    })
    .await
    .unwrap()
    .id
}

async fn seed_group(repo: &SurrealGroupRepository<Db>, name: &str) -> Uuid {
    repo.create(CreateGroup { name: name.into() }).await.unwrap().id
}

async fn seed_project(repo: &SurrealProjectRepository<Db>, name: &str) -> Uuid {
    repo.create(CreateProject { name: name.into() })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn roster_flattens_direct_groups_and_ancestors() {
    let (service, query, users, groups, projects) = setup().await;
    let project_id = seed_project(&projects, "Apollo").await;
    let ada = seed_user(&users, "Ada", "Lovelace").await;
    let grace = seed_user(&users, "Grace", "Hopper").await;

    let physics = seed_group(&groups, "Physics").await;
    let math = seed_group(&groups, "Math").await;
    let science = seed_group(&groups, "Science").await;

    service
        .add_users_to_project(project_id, &[ada, grace])
        .await
        .unwrap();
    service.add_users_to_group(physics, &[ada]).await.unwrap();
    service.add_users_to_group(math, &[ada]).await.unwrap();
    // Science is an ancestor of Physics.
    service
        .add_groups_to_group(science, &[physics])
        .await
        .unwrap();

    let roster = query.list_project_members(project_id).await.unwrap();
    assert_eq!(roster.name, "Apollo");
    assert_eq!(roster.members.len(), 2);

    let ada_row = roster.members.iter().find(|m| m.id == ada).unwrap();
    assert_eq!(ada_row.name, "Ada Lovelace");
    assert_eq!(ada_row.groups, ["Math", "Physics", "Science"]);

    let grace_row = roster.members.iter().find(|m| m.id == grace).unwrap();
    assert!(grace_row.groups.is_empty());
}

#[tokio::test]
async fn roster_includes_members_of_linked_groups() {
    let (service, query, users, groups, projects) = setup().await;
    let project_id = seed_project(&projects, "Apollo").await;
    let crew = seed_group(&groups, "Crew").await;
    let margaret = seed_user(&users, "Margaret", "Hamilton").await;

    service.add_users_to_group(crew, &[margaret]).await.unwrap();
    service
        .add_groups_to_project(project_id, &[crew])
        .await
        .unwrap();

    let roster = query.list_project_members(project_id).await.unwrap();
    assert_eq!(roster.members.len(), 1);
    assert_eq!(roster.members[0].id, margaret);
    assert_eq!(roster.members[0].groups, ["Crew"]);
}

#[tokio::test]
async fn roster_reaches_through_nested_linked_groups() {
    let (service, query, users, groups, projects) = setup().await;
    let project_id = seed_project(&projects, "Apollo").await;
    let crew = seed_group(&groups, "Crew").await;
    let guidance = seed_group(&groups, "Guidance").await;
    let margaret = seed_user(&users, "Margaret", "Hamilton").await;

    // Guidance is nested under Crew; only Crew is linked to the project.
    service
        .add_groups_to_group(crew, &[guidance])
        .await
        .unwrap();
    service
        .add_groups_to_project(project_id, &[crew])
        .await
        .unwrap();
    service
        .add_users_to_group(guidance, &[margaret])
        .await
        .unwrap();

    let roster = query.list_project_members(project_id).await.unwrap();
    assert_eq!(roster.members.len(), 1);
    assert_eq!(roster.members[0].id, margaret);
    // Direct group plus its ancestor, deduplicated.
    assert_eq!(roster.members[0].groups, ["Crew", "Guidance"]);
}

#[tokio::test]
async fn roster_deduplicates_users_reachable_twice() {
    let (service, query, users, groups, projects) = setup().await;
    let project_id = seed_project(&projects, "Apollo").await;
    let crew = seed_group(&groups, "Crew").await;
    let ada = seed_user(&users, "Ada", "Lovelace").await;

    // Ada is both a direct project member and a member of a linked group.
    service
        .add_users_to_project(project_id, &[ada])
        .await
        .unwrap();
    service.add_users_to_group(crew, &[ada]).await.unwrap();
    service
        .add_groups_to_project(project_id, &[crew])
        .await
        .unwrap();

    let roster = query.list_project_members(project_id).await.unwrap();
    assert_eq!(roster.members.len(), 1);
    assert_eq!(roster.members[0].groups, ["Crew"]);
}

#[tokio::test]
async fn roster_of_empty_project_has_no_members() {
    let (_, query, _, _, projects) = setup().await;
    let project_id = seed_project(&projects, "Apollo").await;

    let roster = query.list_project_members(project_id).await.unwrap();
    assert_eq!(roster.id, project_id);
    assert!(roster.members.is_empty());
}

#[tokio::test]
async fn roster_of_missing_project_fails() {
    let (_, query, _, _, _) = setup().await;

    let err = query.list_project_members(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RosterError::NotFound { ref entity, .. } if entity == "project"));
}
