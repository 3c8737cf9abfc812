//! Field-level helpers shared by the HTML forms.

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Message for a value longer than the column allows.
pub fn max_length_error(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {max} characters (it has {actual}).")
}

/// Trims a required text field, checking presence and length.
pub fn required_text(value: &str, max: usize) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(REQUIRED.to_string());
    }
    let length = trimmed.chars().count();
    if length > max {
        return Err(max_length_error(max, length));
    }
    Ok(trimmed.to_string())
}

/// Maps an empty or whitespace-only field to `None`.
pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
