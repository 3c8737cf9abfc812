use serde::Deserialize;

use crate::web::form::{REQUIRED, max_length_error};

const USERNAME_MAX_LENGTH: usize = 150;
const PASSWORD_MIN_LENGTH: usize = 8;
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn’t match.";
pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Represents the login request payload.
#[derive(serde::Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form: a username and the password typed twice.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterFormErrors {
    pub username: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

impl RegisterFormErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password1.is_none() && self.password2.is_none()
    }
}

impl RegisterForm {
    /// Checks the fields that can be validated without the database.
    pub fn validate(&self) -> Result<(), RegisterFormErrors> {
        let mut errors = RegisterFormErrors::default();

        let username = self.username.trim();
        let username_length = username.chars().count();
        if username.is_empty() {
            errors.username = Some(REQUIRED.to_string());
        } else if username_length > USERNAME_MAX_LENGTH {
            errors.username = Some(max_length_error(USERNAME_MAX_LENGTH, username_length));
        } else if !username.chars().all(is_username_char) {
            errors.username = Some(INVALID_USERNAME.to_string());
        }

        if self.password1.is_empty() {
            errors.password1 = Some(REQUIRED.to_string());
        } else if self.password1.chars().count() < PASSWORD_MIN_LENGTH {
            errors.password1 = Some(format!(
                "This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."
            ));
        }

        if self.password2.is_empty() {
            errors.password2 = Some(REQUIRED.to_string());
        } else if self.password1 != self.password2 {
            errors.password2 = Some(PASSWORD_MISMATCH.to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}
