use askama::Template;
use axum::{
    Extension, Form, Router,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::form::{TaskFormData, TaskFormErrors};
use super::pdf::{self, PdfError};
use super::{Task, TaskListParams, TaskService, TaskServiceError, TaskSort};
use crate::auth::CurrentUser;
use crate::category::{Category, CategoryService, CategoryServiceError};
use crate::entities::sea_orm_active_enums::Priority;
use crate::web::{SelectOption, internal_error_response, not_found_response};

#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// Custom error type for task handler operations.
#[derive(Debug, thiserror::Error)]
enum TaskError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a task service error.
    #[error("Task service error")]
    Service(#[from] TaskServiceError),
    /// Represents a category service error.
    #[error("Category service error")]
    Category(#[from] CategoryServiceError),
    /// Building the PDF export failed.
    #[error("PDF export failed")]
    Pdf(#[from] PdfError),
}

impl axum::response::IntoResponse for TaskError {
    fn into_response(self) -> axum::response::Response {
        match self {
            TaskError::Service(TaskServiceError::TaskNotFound(_)) => not_found_response(),
            err => {
                tracing::error!("Task request failed: {:?}", err);
                internal_error_response()
            }
        }
    }
}

/// One row of the task table.
struct TaskRow {
    id: i32,
    title: String,
    complete: bool,
    priority: &'static str,
    category: String,
    deadline: String,
}

#[derive(Template)]
#[template(path = "tasks/task_list.html")]
struct TaskListTemplate {
    username: String,
    tasks: Vec<TaskRow>,
    categories: Vec<Category>,
    incomplete_count: usize,
    completion_percentage: String,
    search_input: String,
    priority_options: Vec<SelectOption>,
    category_options: Vec<SelectOption>,
    complete_options: Vec<SelectOption>,
    sort_options: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "tasks/task_detail.html")]
struct TaskDetailTemplate {
    task: Task,
    category_name: String,
}

#[derive(Template)]
#[template(path = "tasks/task_form.html")]
struct TaskFormTemplate {
    heading: &'static str,
    action: String,
    form: TaskFormData,
    errors: TaskFormErrors,
    priority_options: Vec<SelectOption>,
    category_options: Vec<SelectOption>,
}

impl TaskFormTemplate {
    fn new(
        heading: &'static str,
        action: String,
        form: TaskFormData,
        errors: TaskFormErrors,
        categories: &[Category],
    ) -> Self {
        let priority_options = priority_options(&form.priority);
        let category_options = category_options(categories, &form.task_category);
        Self {
            heading,
            action,
            form,
            errors,
            priority_options,
            category_options,
        }
    }
}

#[derive(Template)]
#[template(path = "tasks/task_confirm_delete.html")]
struct TaskDeleteTemplate {
    task: Task,
}

fn priority_options(selected: &str) -> Vec<SelectOption> {
    Priority::choices()
        .iter()
        .map(|priority| SelectOption::new(priority.code(), priority.label(), selected))
        .collect()
}

fn category_options(categories: &[Category], selected: &str) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|category| SelectOption::new(category.id().to_string(), category.name(), selected))
        .collect()
}

/// Handler for GET / that lists the current user's tasks.
#[tracing::instrument(skip(state))]
async fn task_list_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<TaskListParams>,
) -> Result<Html<String>, TaskError> {
    let task_service = TaskService::new(&state.db);
    let category_service = CategoryService::new(&state.db);

    let tasks = task_service.list_tasks(user.id, &params).await?;
    let categories = category_service.list_categories(user.id).await?;
    let summary = task_service.completion_summary(user.id).await?;

    let rows: Vec<TaskRow> = {
        let category_names: HashMap<i32, &str> = categories
            .iter()
            .map(|category| (category.id(), category.name()))
            .collect();
        tasks
            .iter()
            .map(|task| TaskRow {
                id: task.id(),
                title: task.title().to_string(),
                complete: task.is_complete(),
                priority: task.priority().label(),
                category: task
                    .category_id()
                    .and_then(|id| category_names.get(&id))
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                deadline: task.deadline_display(),
            })
            .collect()
    };

    let selected_complete = params.complete.as_deref().unwrap_or_default();
    let template = TaskListTemplate {
        username: user.username.clone(),
        tasks: rows,
        incomplete_count: tasks.iter().filter(|task| !task.is_complete()).count(),
        completion_percentage: format!("{:.0}", summary.percentage()),
        search_input: params.search_input().to_string(),
        priority_options: priority_options(params.priority.as_deref().unwrap_or_default()),
        category_options: category_options(
            &categories,
            params.task_category.as_deref().unwrap_or_default(),
        ),
        complete_options: vec![
            SelectOption::new("false", "Not done", selected_complete),
            SelectOption::new("true", "Done", selected_complete),
        ],
        sort_options: TaskSort::choices()
            .iter()
            .map(|sort| SelectOption::new(sort.param(), sort.label(), params.sort().param()))
            .collect(),
        categories,
    };
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for GET /task/{id}.
#[tracing::instrument(skip(state))]
async fn task_detail_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, TaskError> {
    let task = TaskService::new(&state.db)
        .get_task_for_user(user.id, id)
        .await?;
    let category_name = match task.category_id() {
        Some(category_id) => match CategoryService::new(&state.db)
            .get_category_for_user(user.id, category_id)
            .await
        {
            Ok(category) => category.name().to_string(),
            Err(CategoryServiceError::CategoryNotFound(_)) => String::new(),
            Err(err) => return Err(err.into()),
        },
        None => String::new(),
    };
    let template = TaskDetailTemplate {
        task,
        category_name,
    };
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for GET /task-create that shows an empty task form.
#[tracing::instrument(skip(state))]
async fn task_create_page_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, TaskError> {
    let categories = CategoryService::new(&state.db)
        .list_categories(user.id)
        .await?;
    let template = TaskFormTemplate::new(
        "Create task",
        "/task-create".to_string(),
        TaskFormData::default(),
        TaskFormErrors::default(),
        &categories,
    );
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for POST /task-create.
#[tracing::instrument(skip(state, form))]
async fn task_create_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<TaskFormData>,
) -> Result<Response, TaskError> {
    let categories = CategoryService::new(&state.db)
        .list_categories(user.id)
        .await?;
    match form.validate(&categories) {
        Ok(input) => {
            let task = TaskService::new(&state.db)
                .create_task(user.id, input)
                .await?;
            tracing::info!("Created task {}", task.id());
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => {
            let template = TaskFormTemplate::new(
                "Create task",
                "/task-create".to_string(),
                form,
                errors,
                &categories,
            );
            Ok(Html(template.render()?).into_response())
        }
    }
}

/// Handler for GET /task-update/{id} that shows the pre-filled task form.
#[tracing::instrument(skip(state))]
async fn task_update_page_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, TaskError> {
    let task = TaskService::new(&state.db)
        .get_task_for_user(user.id, id)
        .await?;
    let categories = CategoryService::new(&state.db)
        .list_categories(user.id)
        .await?;
    let template = TaskFormTemplate::new(
        "Update task",
        format!("/task-update/{id}"),
        TaskFormData::from_task(&task),
        TaskFormErrors::default(),
        &categories,
    );
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for POST /task-update/{id}.
#[tracing::instrument(skip(state, form))]
async fn task_update_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Form(form): Form<TaskFormData>,
) -> Result<Response, TaskError> {
    let task_service = TaskService::new(&state.db);
    // Foreign or missing tasks answer 404 before the form is looked at.
    task_service.get_task_for_user(user.id, id).await?;

    let categories = CategoryService::new(&state.db)
        .list_categories(user.id)
        .await?;
    match form.validate(&categories) {
        Ok(input) => {
            task_service.update_task(user.id, id, input).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => {
            let template = TaskFormTemplate::new(
                "Update task",
                format!("/task-update/{id}"),
                form,
                errors,
                &categories,
            );
            Ok(Html(template.render()?).into_response())
        }
    }
}

/// Handler for GET /task-delete/{id} that asks for confirmation.
#[tracing::instrument(skip(state))]
async fn task_delete_page_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, TaskError> {
    let task = TaskService::new(&state.db)
        .get_task_for_user(user.id, id)
        .await?;
    let template = TaskDeleteTemplate { task };
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for POST /task-delete/{id}.
#[tracing::instrument(skip(state))]
async fn task_delete_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Redirect, TaskError> {
    TaskService::new(&state.db).delete_task(user.id, id).await?;
    Ok(Redirect::to("/"))
}

/// Handler for GET /export-pdf that downloads the task list as a PDF.
#[tracing::instrument(skip(state))]
async fn export_pdf_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, TaskError> {
    let tasks = TaskService::new(&state.db).list_all_tasks(user.id).await?;
    let categories = CategoryService::new(&state.db)
        .list_categories(user.id)
        .await?;
    let bytes = pdf::build_task_report(&tasks, &categories)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", pdf::FILENAME),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Creates and returns the task router with all task-related routes.
pub fn create_task_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/", get(task_list_handler))
        .route("/task/{id}", get(task_detail_handler))
        .route(
            "/task-create",
            get(task_create_page_handler).post(task_create_handler),
        )
        .route(
            "/task-update/{id}",
            get(task_update_page_handler).post(task_update_handler),
        )
        .route(
            "/task-delete/{id}",
            get(task_delete_page_handler).post(task_delete_handler),
        )
        .route("/export-pdf", get(export_pdf_handler))
        .with_state(state)
}
