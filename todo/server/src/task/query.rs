//! Task list query parameters and their translation into sea-orm queries.

use crate::entities::sea_orm_active_enums::Priority;
use crate::entities::task;
use super::Task;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, QueryFilter, QueryOrder, Select};
use serde::Deserialize;

/// Query string of the task list, e.g. `/?search-area=milk&sorting=-deadline`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskListParams {
    #[serde(rename = "search-area", default)]
    pub search_area: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub task_category: Option<String>,
    #[serde(default)]
    pub complete: Option<String>,
    #[serde(default)]
    pub sorting: Option<String>,
}

/// The single filter applied to a user's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    TitleContains(String),
    Priority(Priority),
    Category(i32),
    Complete(bool),
    /// A parameter was given but its value can never match.
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Incomplete tasks first.
    #[default]
    Default,
    PriorityAsc,
    DeadlineAsc,
    PriorityDesc,
    DeadlineDesc,
}

impl TaskListParams {
    /// Search text to echo back into the search box.
    pub fn search_input(&self) -> &str {
        present(&self.search_area).unwrap_or_default()
    }

    /// Resolves the effective filter.
    ///
    /// Every parameter narrows the full task set on its own, so when several
    /// are present the last one in the order search, priority, category,
    /// complete wins.
    pub fn filter(&self) -> TaskFilter {
        let mut filter = TaskFilter::All;
        if let Some(search) = present(&self.search_area) {
            filter = TaskFilter::TitleContains(search.to_string());
        }
        if let Some(code) = present(&self.priority) {
            filter = Priority::from_code(code).map_or(TaskFilter::Nothing, TaskFilter::Priority);
        }
        if let Some(id) = present(&self.task_category) {
            filter = id
                .parse()
                .map_or(TaskFilter::Nothing, TaskFilter::Category);
        }
        if let Some(flag) = present(&self.complete) {
            filter = parse_flag(flag).map_or(TaskFilter::Nothing, TaskFilter::Complete);
        }
        filter
    }

    pub fn sort(&self) -> TaskSort {
        present(&self.sorting)
            .map(TaskSort::from_param)
            .unwrap_or_default()
    }
}

impl TaskFilter {
    /// Narrows `select`, or returns `None` when nothing can match.
    ///
    /// Title search is left to [`TaskFilter::retains`].
    pub fn apply(&self, select: Select<task::Entity>) -> Option<Select<task::Entity>> {
        let select = match self {
            TaskFilter::All | TaskFilter::TitleContains(_) => select,
            TaskFilter::Priority(priority) => select.filter(task::Column::Priority.eq(*priority)),
            TaskFilter::Category(id) => select.filter(task::Column::CategoryId.eq(*id)),
            TaskFilter::Complete(flag) => select.filter(task::Column::Complete.eq(*flag)),
            TaskFilter::Nothing => return None,
        };
        Some(select)
    }

    /// Checks a loaded task against the part of the filter not done in SQL.
    ///
    /// Case is folded in Rust on both sides; SQLite's `LOWER()` only folds ASCII.
    pub fn retains(&self, task: &Task) -> bool {
        match self {
            TaskFilter::TitleContains(text) => task
                .title()
                .to_lowercase()
                .contains(&text.to_lowercase()),
            _ => true,
        }
    }
}

impl TaskSort {
    /// Parses the `sorting` parameter; unknown keys keep the default order.
    pub fn from_param(value: &str) -> Self {
        match value {
            "priority" => TaskSort::PriorityAsc,
            "deadline" => TaskSort::DeadlineAsc,
            "-priority" => TaskSort::PriorityDesc,
            "-deadline" => TaskSort::DeadlineDesc,
            _ => TaskSort::Default,
        }
    }

    /// The query string value selecting this order.
    pub fn param(&self) -> &'static str {
        match self {
            TaskSort::Default => "",
            TaskSort::PriorityAsc => "priority",
            TaskSort::DeadlineAsc => "deadline",
            TaskSort::PriorityDesc => "-priority",
            TaskSort::DeadlineDesc => "-deadline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskSort::Default => "Default",
            TaskSort::PriorityAsc => "Priority (low to high)",
            TaskSort::DeadlineAsc => "Deadline (earliest first)",
            TaskSort::PriorityDesc => "Priority (high to low)",
            TaskSort::DeadlineDesc => "Deadline (latest first)",
        }
    }

    pub fn choices() -> [TaskSort; 5] {
        [
            TaskSort::Default,
            TaskSort::PriorityAsc,
            TaskSort::DeadlineAsc,
            TaskSort::PriorityDesc,
            TaskSort::DeadlineDesc,
        ]
    }

    /// Orders `select`, using the task ID as tie breaker.
    ///
    /// Tasks without a deadline sort last in both deadline directions.
    pub fn apply(&self, select: Select<task::Entity>) -> Select<task::Entity> {
        let select = match self {
            TaskSort::Default => select.order_by_asc(task::Column::Complete),
            TaskSort::PriorityAsc => select.order_by_asc(task::Column::Priority),
            TaskSort::PriorityDesc => select.order_by_desc(task::Column::Priority),
            TaskSort::DeadlineAsc => select
                .order_by_asc(deadline_missing())
                .order_by_asc(task::Column::Deadline),
            TaskSort::DeadlineDesc => select
                .order_by_asc(deadline_missing())
                .order_by_desc(task::Column::Deadline),
        };
        select.order_by_asc(task::Column::Id)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "1" | "t" | "on" => Some(true),
        "false" | "False" | "0" | "f" | "off" => Some(false),
        _ => None,
    }
}

fn deadline_missing() -> SimpleExpr {
    Expr::col((task::Entity, task::Column::Deadline)).is_null()
}
