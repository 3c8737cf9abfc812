use crate::auth::CurrentUser;
use crate::auth::api::v1::ErrorResponse;
use crate::task::{Task, TaskListParams, TaskService, TaskState};
use axum::{
    Extension, Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskJson {
    id: i32,
    title: String,
    description: Option<String>,
    complete: bool,
    /// Priority code: `H`, `M` or `L`
    priority: String,
    category_id: Option<i32>,
    /// RFC 3339 timestamp
    created_at: String,
    /// RFC 3339 timestamp, absent when the task has no deadline
    deadline: Option<String>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            complete: task.is_complete(),
            priority: task.priority().code().to_string(),
            category_id: task.category_id(),
            created_at: task.created_at().to_rfc3339(),
            deadline: task.deadline().map(|deadline| deadline.to_rfc3339()),
        }
    }
}

/// API response for listing tasks.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    tasks: Vec<TaskJson>,
    /// Number of tasks matching the query
    count: usize,
    /// Share of all the user's tasks that are complete, 0 to 100
    completion_percentage: f64,
}

/// Handler for GET /api/v1/tasks - Returns the caller's tasks in JSON format.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(
        ("search-area" = Option<String>, Query, description = "Case-insensitive title search"),
        ("priority" = Option<String>, Query, description = "Priority code: H, M or L"),
        ("task_category" = Option<String>, Query, description = "Category ID"),
        ("complete" = Option<String>, Query, description = "Completion flag"),
        ("sorting" = Option<String>, Query, description = "priority, deadline, -priority or -deadline")
    ),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<TaskListParams>,
) -> Result<Json<TasksResponse>, (StatusCode, Json<ErrorResponse>)> {
    let service = TaskService::new(&state.db);
    let listing = async {
        let tasks = service.list_tasks(user.id, &params).await?;
        let summary = service.completion_summary(user.id).await?;
        Ok::<_, crate::task::TaskServiceError>((tasks, summary))
    };

    match listing.await {
        Ok((tasks, summary)) => {
            let json_tasks: Vec<TaskJson> = tasks.into_iter().map(TaskJson::from).collect();
            let count = json_tasks.len();

            Ok(Json(TasksResponse {
                tasks: json_tasks,
                count,
                completion_percentage: summary.percentage(),
            }))
        }
        Err(err) => {
            tracing::error!("Failed to get tasks: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "Failed to retrieve tasks",
                )),
            ))
        }
    }
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks_handler))
        .with_state(state)
}
