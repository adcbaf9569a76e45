use super::models::SignupRequest;
use crate::common::{ValidationResult, Validator};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

impl Validator for SignupRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.name.trim().is_empty() {
            result.add_error("name", "Name is required");
        }

        if self.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if !self.email.contains('@') {
            result.add_error("email", "Email must be a valid email address");
        }

        if self.password.is_empty() {
            result.add_error("password", "Password is required");
        } else if self.password.len() < MIN_PASSWORD_LENGTH {
            result.add_error("password", "Password must be at least 6 characters");
        }

        result
    }
}

/// Shared password check for the reset and profile-update paths, which
/// take the new password outside a `SignupRequest`.
pub fn validate_new_password(password: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if password.is_empty() {
        result.add_error("password", "Password is required");
    } else if password.len() < MIN_PASSWORD_LENGTH {
        result.add_error("password", "Password must be at least 6 characters");
    }

    result
}
