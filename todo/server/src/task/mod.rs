use crate::entities::sea_orm_active_enums::Priority;
use crate::entities::*;
use chrono::{DateTime, FixedOffset};
use sea_orm::*;

pub mod api;
pub mod form;
pub mod pdf;
pub mod query;
pub mod web;

pub use query::{TaskFilter, TaskListParams, TaskSort};
pub use web::{TaskState, create_task_router};

const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    user_id: i32,
    title: String,
    description: Option<String>,
    complete: bool,
    created_at: DateTime<FixedOffset>,
    priority: Priority,
    category_id: Option<i32>,
    deadline: Option<DateTime<FixedOffset>>,
}

impl Task {
    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the ID of the owning user.
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category_id(&self) -> Option<i32> {
        self.category_id
    }

    pub fn deadline(&self) -> Option<DateTime<FixedOffset>> {
        self.deadline
    }

    /// Creation time formatted for display.
    pub fn created_display(&self) -> String {
        self.created_at.format(DISPLAY_DATETIME_FORMAT).to_string()
    }

    /// Deadline formatted for display, empty when there is none.
    pub fn deadline_display(&self) -> String {
        self.deadline
            .map(|deadline| deadline.format(DISPLAY_DATETIME_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// "Done" or "Not Done", as printed in exports.
    pub fn status_label(&self) -> &'static str {
        if self.complete { "Done" } else { "Not Done" }
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            complete: model.complete,
            created_at: model.created_at,
            priority: model.priority,
            category_id: model.category_id,
            deadline: model.deadline,
        }
    }
}

/// Validated fields of a task create/update form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category_id: Option<i32>,
    pub complete: bool,
    pub deadline: Option<DateTime<FixedOffset>>,
}

impl TaskInput {
    /// An incomplete, uncategorized, high priority task with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            category_id: None,
            complete: false,
            deadline: None,
        }
    }
}

/// Completed and total task counts of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSummary {
    pub completed: u64,
    pub total: u64,
}

impl CompletionSummary {
    /// Percentage of completed tasks; 0 when there are no tasks.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// The task does not exist or belongs to another user.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
}

pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskService<'_> {
        TaskService { db }
    }

    /// Creates a task owned by `user_id`, stamping its creation time.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        user_id: i32,
        input: TaskInput,
    ) -> Result<Task, TaskServiceError> {
        let active_model = task::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            title: ActiveValue::Set(input.title),
            description: ActiveValue::Set(input.description),
            complete: ActiveValue::Set(input.complete),
            created_at: ActiveValue::Set(chrono::Utc::now().fixed_offset()),
            priority: ActiveValue::Set(input.priority),
            category_id: ActiveValue::Set(input.category_id),
            deadline: ActiveValue::Set(input.deadline),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Retrieves a task by ID, provided it belongs to `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_for_user(&self, user_id: i32, id: i32) -> Result<Task, TaskServiceError> {
        let model = self.find_owned(user_id, id).await?;
        Ok(Task::from(model))
    }

    /// Replaces every editable field of a task owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        user_id: i32,
        id: i32,
        input: TaskInput,
    ) -> Result<Task, TaskServiceError> {
        let task_to_update = self.find_owned(user_id, id).await?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        active_model.title = ActiveValue::Set(input.title);
        active_model.description = ActiveValue::Set(input.description);
        active_model.priority = ActiveValue::Set(input.priority);
        active_model.category_id = ActiveValue::Set(input.category_id);
        active_model.complete = ActiveValue::Set(input.complete);
        active_model.deadline = ActiveValue::Set(input.deadline);
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Deletes a task owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, user_id: i32, id: i32) -> Result<Task, TaskServiceError> {
        let task_to_delete = self.find_owned(user_id, id).await?;
        let task_copy = Task::from(task_to_delete);
        task::Entity::delete_by_id(id).exec(self.db).await?;
        Ok(task_copy)
    }

    /// Retrieves all tasks of a user in default order: incomplete first.
    #[tracing::instrument(skip(self))]
    pub async fn list_all_tasks(&self, user_id: i32) -> Result<Vec<Task>, TaskServiceError> {
        self.list_tasks(user_id, &TaskListParams::default()).await
    }

    /// Retrieves the tasks of a user that match the list query parameters.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        user_id: i32,
        params: &TaskListParams,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let select = task::Entity::find().filter(task::Column::UserId.eq(user_id));
        let filter = params.filter();
        let Some(select) = filter.apply(select) else {
            return Ok(Vec::new());
        };
        let tasks = params
            .sort()
            .apply(select)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .filter(|task| filter.retains(task))
            .collect();
        Ok(tasks)
    }

    /// Retrieves the tasks of a user filed under one category, in default order.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks_in_category(
        &self,
        user_id: i32,
        category_id: i32,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let select = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .filter(task::Column::CategoryId.eq(category_id));
        let tasks = TaskSort::Default
            .apply(select)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Counts completed and total tasks of a user, ignoring any list filters.
    #[tracing::instrument(skip(self))]
    pub async fn completion_summary(
        &self,
        user_id: i32,
    ) -> Result<CompletionSummary, TaskServiceError> {
        let total = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .count(self.db)
            .await?;
        let completed = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .filter(task::Column::Complete.eq(true))
            .count(self.db)
            .await?;
        Ok(CompletionSummary { completed, total })
    }

    async fn find_owned(&self, user_id: i32, id: i32) -> Result<task::Model, TaskServiceError> {
        task::Entity::find_by_id(id)
            .filter(task::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_zero_without_tasks() {
        let summary = CompletionSummary::default();
        assert_eq!(summary.percentage(), 0.0);
    }

    #[test]
    fn can_compute_completion_percentage() {
        let summary = CompletionSummary {
            completed: 1,
            total: 4,
        };
        assert_eq!(summary.percentage(), 25.0);

        let summary = CompletionSummary {
            completed: 3,
            total: 3,
        };
        assert_eq!(summary.percentage(), 100.0);
    }

    #[test]
    fn can_label_task_status() {
        let mut task = sample_task();
        assert_eq!(task.status_label(), "Not Done");
        task.complete = true;
        assert_eq!(task.status_label(), "Done");
    }

    #[test]
    fn can_format_missing_deadline_as_empty() {
        let task = sample_task();
        assert_eq!(task.deadline_display(), "");
    }

    fn sample_task() -> Task {
        Task {
            id: 1,
            user_id: 1,
            title: "Write report".to_string(),
            description: None,
            complete: false,
            created_at: DateTime::parse_from_rfc3339("2025-01-02T03:04:05+00:00").unwrap(),
            priority: Priority::High,
            category_id: None,
            deadline: None,
        }
    }
}
