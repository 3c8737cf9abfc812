use sea_orm::EntityTrait;
use todo_server::category::{CategoryInput, CategoryService, CategoryServiceError};
use todo_server::entities::category;
use todo_server::task::{TaskInput, TaskService};

mod common;

use common::{create_user, setup_db};

fn input(name: &str) -> CategoryInput {
    CategoryInput {
        name: name.to_string(),
        description: None,
    }
}

#[tokio::test]
async fn test_create_list_and_update_categories() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let service = CategoryService::new(&db);

    let work = service.create_category(user.id(), input("Work")).await?;
    let home = service
        .create_category(
            user.id(),
            CategoryInput {
                name: "Home".to_string(),
                description: Some("Chores".to_string()),
            },
        )
        .await?;

    let listed = service.list_categories(user.id()).await?;
    assert_eq!(listed, vec![work.clone(), home.clone()]);
    assert_eq!(home.description(), Some("Chores"));

    let renamed = service
        .update_category(user.id(), work.id(), input("Office"))
        .await?;
    assert_eq!(renamed.name(), "Office");
    assert_eq!(
        service.get_category_for_user(user.id(), work.id()).await?,
        renamed
    );
    Ok(())
}

#[tokio::test]
async fn test_categories_of_other_users_are_invisible() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let alice = create_user(&db, "alice").await?;
    let bob = create_user(&db, "bob").await?;
    let service = CategoryService::new(&db);
    let bobs = service.create_category(bob.id(), input("Bob's")).await?;

    assert!(service.list_categories(alice.id()).await?.is_empty());
    let lookup = service.get_category_for_user(alice.id(), bobs.id()).await;
    assert!(matches!(lookup, Err(CategoryServiceError::CategoryNotFound(_))));
    let update = service
        .update_category(alice.id(), bobs.id(), input("Mine now"))
        .await;
    assert!(matches!(update, Err(CategoryServiceError::CategoryNotFound(_))));
    let delete = service.delete_category(alice.id(), bobs.id()).await;
    assert!(matches!(delete, Err(CategoryServiceError::CategoryNotFound(_))));

    assert_eq!(
        service.get_category_for_user(bob.id(), bobs.id()).await?.name(),
        "Bob's"
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_category_removes_its_tasks() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let category_service = CategoryService::new(&db);
    let task_service = TaskService::new(&db);

    let errands = category_service
        .create_category(user.id(), input("Errands"))
        .await?;
    task_service
        .create_task(
            user.id(),
            TaskInput {
                category_id: Some(errands.id()),
                ..TaskInput::new("Post office")
            },
        )
        .await?;
    task_service
        .create_task(user.id(), TaskInput::new("Uncategorized"))
        .await?;

    category_service.delete_category(user.id(), errands.id()).await?;

    let remaining = task_service.list_all_tasks(user.id()).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title(), "Uncategorized");
    assert!(category_service.list_categories(user.id()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_deleting_category_row_cascades_to_its_tasks() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let category_service = CategoryService::new(&db);
    let task_service = TaskService::new(&db);

    let errands = category_service
        .create_category(user.id(), input("Errands"))
        .await?;
    let work = category_service
        .create_category(user.id(), input("Work"))
        .await?;
    for (title, category_id) in [
        ("Post office", Some(errands.id())),
        ("Bank", Some(errands.id())),
        ("Standup", Some(work.id())),
        ("Uncategorized", None),
    ] {
        task_service
            .create_task(
                user.id(),
                TaskInput {
                    category_id,
                    ..TaskInput::new(title)
                },
            )
            .await?;
    }

    // Bypasses CategoryService so only the foreign key does the cleanup.
    let result = category::Entity::delete_by_id(errands.id()).exec(&db).await?;
    assert_eq!(result.rows_affected, 1);

    let mut remaining: Vec<String> = task_service
        .list_all_tasks(user.id())
        .await?
        .iter()
        .map(|task| task.title().to_string())
        .collect();
    remaining.sort();
    assert_eq!(remaining, vec!["Standup", "Uncategorized"]);
    let categories = category_service.list_categories(user.id()).await?;
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name(), "Work");
    Ok(())
}
