use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;

use super::{Task, TaskInput};
use crate::category::Category;
use crate::entities::sea_orm_active_enums::Priority;
use crate::web::form::{INVALID_CHOICE, REQUIRED, optional_text, required_text};

const TITLE_MAX_LENGTH: usize = 200;
const INVALID_DATETIME: &str = "Enter a valid date/time.";
/// Layout of an `<input type="datetime-local">` value.
const INPUT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const ACCEPTED_DATETIME_FORMATS: [&str; 4] = [
    INPUT_DATETIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Raw task form fields as submitted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFormData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub task_category: String,
    /// Checkbox; only sent when ticked.
    #[serde(default)]
    pub complete: Option<String>,
    #[serde(default)]
    pub deadline: String,
}

impl Default for TaskFormData {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::default().code().to_string(),
            task_category: String::new(),
            complete: None,
            deadline: String::new(),
        }
    }
}

/// Per-field validation messages for the task form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskFormErrors {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub task_category: Option<String>,
    pub deadline: Option<String>,
}

impl TaskFormData {
    /// Pre-fills the form from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title().to_string(),
            description: task.description().unwrap_or_default().to_string(),
            priority: task.priority().code().to_string(),
            task_category: task
                .category_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            complete: task.is_complete().then(|| "on".to_string()),
            deadline: task
                .deadline()
                .map(|deadline| deadline.format(INPUT_DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete.is_some()
    }

    /// Validates the form against the categories the current user may choose from.
    pub fn validate(&self, categories: &[Category]) -> Result<TaskInput, TaskFormErrors> {
        let mut errors = TaskFormErrors::default();

        let title = required_text(&self.title, TITLE_MAX_LENGTH)
            .map_err(|message| errors.title = Some(message))
            .ok();

        let priority = match self.priority.trim() {
            "" => {
                errors.priority = Some(REQUIRED.to_string());
                None
            }
            code => {
                let priority = Priority::from_code(code);
                if priority.is_none() {
                    errors.priority = Some(INVALID_CHOICE.to_string());
                }
                priority
            }
        };

        let category_id = match self.task_category.trim() {
            "" => Some(None),
            raw_id => {
                let chosen = raw_id
                    .parse::<i32>()
                    .ok()
                    .filter(|id| categories.iter().any(|category| category.id() == *id));
                if chosen.is_none() {
                    errors.task_category = Some(INVALID_CHOICE.to_string());
                }
                chosen.map(Some)
            }
        };

        let deadline = match self.deadline.trim() {
            "" => Some(None),
            raw => {
                let parsed = parse_deadline(raw);
                if parsed.is_none() {
                    errors.deadline = Some(INVALID_DATETIME.to_string());
                }
                parsed.map(Some)
            }
        };

        match (title, priority, category_id, deadline) {
            (Some(title), Some(priority), Some(category_id), Some(deadline)) => Ok(TaskInput {
                title,
                description: optional_text(&self.description),
                priority,
                category_id,
                complete: self.is_complete(),
                deadline,
            }),
            _ => Err(errors),
        }
    }
}

/// Parses a submitted deadline; values without an offset are taken as UTC.
fn parse_deadline(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(deadline) = DateTime::parse_from_rfc3339(value) {
        return Some(deadline);
    }
    ACCEPTED_DATETIME_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category::new(3, "Home".to_string(), None, 1)]
    }

    fn form() -> TaskFormData {
        TaskFormData {
            title: "Buy milk".to_string(),
            ..TaskFormData::default()
        }
    }

    #[test]
    fn can_validate_minimal_task_form() {
        let input = form().validate(&categories()).unwrap();
        assert_eq!(input, TaskInput::new("Buy milk"));
    }

    #[test]
    fn can_validate_full_task_form() {
        let form = TaskFormData {
            title: "Buy milk".to_string(),
            description: "semi-skimmed".to_string(),
            priority: "L".to_string(),
            task_category: "3".to_string(),
            complete: Some("on".to_string()),
            deadline: "2025-03-01T18:30".to_string(),
        };
        let input = form.validate(&categories()).unwrap();
        assert_eq!(input.description.as_deref(), Some("semi-skimmed"));
        assert_eq!(input.priority, Priority::Low);
        assert_eq!(input.category_id, Some(3));
        assert!(input.complete);
        assert_eq!(
            input.deadline,
            Some(DateTime::parse_from_rfc3339("2025-03-01T18:30:00+00:00").unwrap())
        );
    }

    #[test]
    fn rejects_categories_of_other_users() {
        let form = TaskFormData {
            task_category: "4".to_string(),
            ..form()
        };
        let errors = form.validate(&categories()).unwrap_err();
        assert_eq!(errors.task_category.as_deref(), Some(INVALID_CHOICE));
        assert_eq!(errors.title, None);
    }

    #[test]
    fn collects_every_field_error() {
        let form = TaskFormData {
            title: "".to_string(),
            priority: "Z".to_string(),
            deadline: "tomorrow".to_string(),
            ..TaskFormData::default()
        };
        let errors = form.validate(&categories()).unwrap_err();
        assert_eq!(errors.title.as_deref(), Some(REQUIRED));
        assert_eq!(errors.priority.as_deref(), Some(INVALID_CHOICE));
        assert_eq!(errors.deadline.as_deref(), Some(INVALID_DATETIME));
        assert_eq!(errors.task_category, None);
    }

    #[test]
    fn requires_a_priority() {
        let form = TaskFormData {
            priority: String::new(),
            ..form()
        };
        let errors = form.validate(&categories()).unwrap_err();
        assert_eq!(errors.priority.as_deref(), Some(REQUIRED));
    }

    #[test]
    fn keeps_deadline_offset_when_given() {
        let parsed = parse_deadline("2025-03-01T18:30:00+02:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 2 * 3600);
    }
}
