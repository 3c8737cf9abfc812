use serde::Deserialize;

use super::{Category, CategoryInput};
use crate::web::form::{optional_text, required_text};

const NAME_MAX_LENGTH: usize = 100;

/// Raw category form fields as submitted by the browser.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CategoryFormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Per-field validation messages for the category form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategoryFormErrors {
    pub name: Option<String>,
}

impl CategoryFormData {
    /// Pre-fills the form from an existing category.
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name().to_string(),
            description: category.description().unwrap_or_default().to_string(),
        }
    }

    pub fn validate(&self) -> Result<CategoryInput, CategoryFormErrors> {
        match required_text(&self.name, NAME_MAX_LENGTH) {
            Ok(name) => Ok(CategoryInput {
                name,
                description: optional_text(&self.description),
            }),
            Err(message) => Err(CategoryFormErrors {
                name: Some(message),
            }),
        }
    }
}
