use axum::http::StatusCode;
use todo_server::category::{CategoryInput, CategoryService};
use todo_server::task::{TaskInput, TaskService};
use todo_server::web::create_app;
use tower::ServiceExt;

mod common;

use common::{auth_cookie, body_text, create_user, get, location, post_form, setup_db, test_config};

fn input(name: &str) -> CategoryInput {
    CategoryInput {
        name: name.to_string(),
        description: None,
    }
}

#[tokio::test]
async fn can_create_category_and_see_it_listed() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let cookie = auth_cookie(&user).await?;
    let app = create_app(&test_config(), db.clone());

    let response = app
        .clone()
        .oneshot(post_form(
            "/category-create",
            Some(&cookie),
            "name=Groceries&description=Weekly+shop",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let categories = CategoryService::new(&db).list_categories(user.id()).await?;
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].description(), Some("Weekly shop"));

    let response = app.oneshot(get("/", Some(&cookie))).await?;
    let body = body_text(response).await;
    assert!(body.contains(&format!(
        "<a href=\"/category/{}\">Groceries</a>",
        categories[0].id()
    )));
    Ok(())
}

#[tokio::test]
async fn create_category_requires_a_name() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let cookie = auth_cookie(&user).await?;
    let app = create_app(&test_config(), db.clone());

    let response = app
        .oneshot(post_form("/category-create", Some(&cookie), "name=++"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
    assert!(CategoryService::new(&db).list_categories(user.id()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn category_detail_lists_its_tasks() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let work = CategoryService::new(&db)
        .create_category(user.id(), input("Work"))
        .await?;
    let tasks = TaskService::new(&db);
    tasks
        .create_task(
            user.id(),
            TaskInput {
                category_id: Some(work.id()),
                ..TaskInput::new("Quarterly report")
            },
        )
        .await?;
    tasks.create_task(user.id(), TaskInput::new("Laundry")).await?;
    let cookie = auth_cookie(&user).await?;
    let app = create_app(&test_config(), db);

    let response = app
        .oneshot(get(&format!("/category/{}", work.id()), Some(&cookie)))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<h1>Work</h1>"));
    assert!(body.contains("Quarterly report"));
    assert!(!body.contains("Laundry"));
    Ok(())
}

#[tokio::test]
async fn can_update_and_delete_category() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let user = create_user(&db, "alice").await?;
    let home = CategoryService::new(&db)
        .create_category(user.id(), input("Home"))
        .await?;
    TaskService::new(&db)
        .create_task(
            user.id(),
            TaskInput {
                category_id: Some(home.id()),
                ..TaskInput::new("Fix sink")
            },
        )
        .await?;
    let cookie = auth_cookie(&user).await?;
    let app = create_app(&test_config(), db.clone());

    let response = app
        .clone()
        .oneshot(get(&format!("/category-update/{}", home.id()), Some(&cookie)))
        .await?;
    assert!(body_text(response).await.contains("value=\"Home\""));

    let response = app
        .clone()
        .oneshot(post_form(
            &format!("/category-update/{}", home.id()),
            Some(&cookie),
            "name=House",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let renamed = CategoryService::new(&db)
        .get_category_for_user(user.id(), home.id())
        .await?;
    assert_eq!(renamed.name(), "House");

    let response = app
        .oneshot(post_form(
            &format!("/category-delete/{}", home.id()),
            Some(&cookie),
            "",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(CategoryService::new(&db).list_categories(user.id()).await?.is_empty());
    assert!(TaskService::new(&db).list_all_tasks(user.id()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn categories_of_other_users_answer_not_found() -> anyhow::Result<()> {
    let db = setup_db().await?;
    let alice = create_user(&db, "alice").await?;
    let bob = create_user(&db, "bob").await?;
    let bobs = CategoryService::new(&db)
        .create_category(bob.id(), input("Hidden"))
        .await?;
    let cookie = auth_cookie(&alice).await?;
    let app = create_app(&test_config(), db.clone());
    let id = bobs.id();

    for uri in [
        format!("/category/{id}"),
        format!("/category-update/{id}"),
        format!("/category-delete/{id}"),
    ] {
        let response = app.clone().oneshot(get(&uri, Some(&cookie))).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    let response = app
        .oneshot(post_form(&format!("/category-delete/{id}"), Some(&cookie), ""))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(CategoryService::new(&db).list_categories(bob.id()).await?.len(), 1);
    Ok(())
}
