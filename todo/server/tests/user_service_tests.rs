use sea_orm::EntityTrait;
use todo_server::category::{CategoryInput, CategoryService};
use todo_server::entities::user;
use todo_server::task::{TaskInput, TaskService};
use todo_server::user::{UserService, UserServiceError};

mod common;

use common::{PASSWORD, create_user, setup_db};

#[tokio::test]
async fn test_create_user_and_verify_credentials() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let user_service = UserService::new(&db);

    let verified = user_service.verify_credentials("alice", PASSWORD).await?;
    assert_eq!(verified, Some(user.clone()));

    assert_eq!(
        user_service.verify_credentials("alice", "wrong password").await?,
        None
    );
    assert_eq!(
        user_service.verify_credentials("nobody", PASSWORD).await?,
        None
    );
    Ok(())
}

#[tokio::test]
async fn test_create_user_rejects_duplicate_username() -> anyhow::Result<()> {
    let db = setup_db().await?;
    create_user(&db, "alice").await?;

    let result = UserService::new(&db).create_user("alice", "another password").await;
    assert!(matches!(result, Err(UserServiceError::DuplicateUsername(name)) if name == "alice"));
    Ok(())
}

#[tokio::test]
async fn test_get_user_by_id_and_username() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let user_service = UserService::new(&db);

    assert_eq!(user_service.get_user_by_id(user.id()).await?, Some(user.clone()));
    assert_eq!(
        user_service.get_user_by_username("alice").await?,
        Some(user.clone())
    );
    assert_eq!(user_service.get_user_by_id(user.id() + 100).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_delete_user_removes_their_tasks_and_categories() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let alice = create_user(&db, "alice").await?;
    let bob = create_user(&db, "bob").await?;
    let category_service = CategoryService::new(&db);
    let task_service = TaskService::new(&db);

    let home = category_service
        .create_category(
            alice.id(),
            CategoryInput {
                name: "Home".to_string(),
                description: None,
            },
        )
        .await?;
    let mut filed = TaskInput::new("Vacuum");
    filed.category_id = Some(home.id());
    task_service.create_task(alice.id(), filed).await?;
    task_service
        .create_task(alice.id(), TaskInput::new("Call mom"))
        .await?;
    task_service
        .create_task(bob.id(), TaskInput::new("Bob's task"))
        .await?;

    let deleted = UserService::new(&db).delete_user(alice.id()).await?;
    assert_eq!(deleted, alice);

    assert!(task_service.list_all_tasks(alice.id()).await?.is_empty());
    assert!(category_service.list_categories(alice.id()).await?.is_empty());
    assert_eq!(UserService::new(&db).get_user_by_id(alice.id()).await?, None);
    assert_eq!(task_service.list_all_tasks(bob.id()).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_deleting_user_row_cascades_to_tasks_and_categories() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let alice = create_user(&db, "alice").await?;
    let bob = create_user(&db, "bob").await?;
    let category_service = CategoryService::new(&db);
    let task_service = TaskService::new(&db);

    let home = category_service
        .create_category(
            alice.id(),
            CategoryInput {
                name: "Home".to_string(),
                description: None,
            },
        )
        .await?;
    let mut filed = TaskInput::new("Vacuum");
    filed.category_id = Some(home.id());
    task_service.create_task(alice.id(), filed).await?;
    task_service
        .create_task(alice.id(), TaskInput::new("Call mom"))
        .await?;
    task_service
        .create_task(bob.id(), TaskInput::new("Bob's task"))
        .await?;

    // Bypasses UserService so only the foreign keys do the cleanup.
    let result = user::Entity::delete_by_id(alice.id()).exec(&db).await?;
    assert_eq!(result.rows_affected, 1);

    assert!(task_service.list_all_tasks(alice.id()).await?.is_empty());
    assert!(category_service.list_categories(alice.id()).await?.is_empty());
    assert_eq!(task_service.list_all_tasks(bob.id()).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_user() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let result = UserService::new(&db).delete_user(42).await;
    assert!(matches!(result, Err(UserServiceError::UserNotFound(42))));
    Ok(())
}
