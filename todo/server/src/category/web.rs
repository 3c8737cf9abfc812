use askama::Template;
use axum::{
    Extension, Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use std::sync::Arc;

use super::form::{CategoryFormData, CategoryFormErrors};
use super::{Category, CategoryService, CategoryServiceError};
use crate::auth::CurrentUser;
use crate::task::{Task, TaskService, TaskServiceError};
use crate::web::{internal_error_response, not_found_response};

#[derive(Clone, Debug)]
pub struct CategoryState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// Custom error type for category handler operations.
#[derive(Debug, thiserror::Error)]
enum CategoryError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a category service error.
    #[error("Category service error")]
    Service(#[from] CategoryServiceError),
    /// Loading the tasks of a category failed.
    #[error("Task service error")]
    Task(#[from] TaskServiceError),
}

impl axum::response::IntoResponse for CategoryError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CategoryError::Service(CategoryServiceError::CategoryNotFound(_)) => {
                not_found_response()
            }
            err => {
                tracing::error!("Category request failed: {:?}", err);
                internal_error_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "categories/category_detail.html")]
struct CategoryDetailTemplate {
    category: Category,
    tasks: Vec<Task>,
}

#[derive(Template)]
#[template(path = "categories/category_form.html")]
struct CategoryFormTemplate {
    heading: &'static str,
    action: String,
    form: CategoryFormData,
    errors: CategoryFormErrors,
}

#[derive(Template)]
#[template(path = "categories/category_confirm_delete.html")]
struct CategoryDeleteTemplate {
    category: Category,
}

/// Handler for GET /category/{id} listing the tasks filed under the category.
#[tracing::instrument(skip(state))]
async fn category_detail_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, CategoryError> {
    let category = CategoryService::new(&state.db)
        .get_category_for_user(user.id, id)
        .await?;
    let tasks = TaskService::new(&state.db)
        .list_tasks_in_category(user.id, id)
        .await?;
    let template = CategoryDetailTemplate { category, tasks };
    template.render().map(Html).map_err(CategoryError::from)
}

#[tracing::instrument]
async fn category_create_page_handler() -> Result<Html<String>, CategoryError> {
    let template = CategoryFormTemplate {
        heading: "Create category",
        action: "/category-create".to_string(),
        form: CategoryFormData::default(),
        errors: CategoryFormErrors::default(),
    };
    template.render().map(Html).map_err(CategoryError::from)
}

/// Handler for POST /category-create.
#[tracing::instrument(skip(state, form))]
async fn category_create_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<CategoryFormData>,
) -> Result<Response, CategoryError> {
    match form.validate() {
        Ok(input) => {
            let category = CategoryService::new(&state.db)
                .create_category(user.id, input)
                .await?;
            tracing::info!("Created category {}", category.id());
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => {
            let template = CategoryFormTemplate {
                heading: "Create category",
                action: "/category-create".to_string(),
                form,
                errors,
            };
            Ok(Html(template.render()?).into_response())
        }
    }
}

#[tracing::instrument(skip(state))]
async fn category_update_page_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, CategoryError> {
    let category = CategoryService::new(&state.db)
        .get_category_for_user(user.id, id)
        .await?;
    let template = CategoryFormTemplate {
        heading: "Update category",
        action: format!("/category-update/{id}"),
        form: CategoryFormData::from_category(&category),
        errors: CategoryFormErrors::default(),
    };
    template.render().map(Html).map_err(CategoryError::from)
}

/// Handler for POST /category-update/{id}.
#[tracing::instrument(skip(state, form))]
async fn category_update_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Form(form): Form<CategoryFormData>,
) -> Result<Response, CategoryError> {
    let category_service = CategoryService::new(&state.db);
    category_service.get_category_for_user(user.id, id).await?;

    match form.validate() {
        Ok(input) => {
            category_service.update_category(user.id, id, input).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => {
            let template = CategoryFormTemplate {
                heading: "Update category",
                action: format!("/category-update/{id}"),
                form,
                errors,
            };
            Ok(Html(template.render()?).into_response())
        }
    }
}

#[tracing::instrument(skip(state))]
async fn category_delete_page_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, CategoryError> {
    let category = CategoryService::new(&state.db)
        .get_category_for_user(user.id, id)
        .await?;
    let template = CategoryDeleteTemplate { category };
    template.render().map(Html).map_err(CategoryError::from)
}

/// Handler for POST /category-delete/{id}. Tasks of the category go with it.
#[tracing::instrument(skip(state))]
async fn category_delete_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Redirect, CategoryError> {
    CategoryService::new(&state.db)
        .delete_category(user.id, id)
        .await?;
    Ok(Redirect::to("/"))
}

/// Creates and returns the category router.
pub fn create_category_router(state: Arc<CategoryState>) -> Router {
    Router::new()
        .route("/category/{id}", get(category_detail_handler))
        .route(
            "/category-create",
            get(category_create_page_handler).post(category_create_handler),
        )
        .route(
            "/category-update/{id}",
            get(category_update_page_handler).post(category_update_handler),
        )
        .route(
            "/category-delete/{id}",
            get(category_delete_page_handler).post(category_delete_handler),
        )
        .with_state(state)
}
