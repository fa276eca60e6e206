// Common validation types and traits

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Records an error when a required text field is blank, or longer than `max` chars.
    pub fn check_text(&mut self, field: &str, value: &str, label: &str, max: usize) {
        if value.trim().is_empty() {
            self.add_error(field, &format!("{} is required", label));
        } else if value.chars().count() > max {
            self.add_error(
                field,
                &format!("{} must be at most {} characters", label, max),
            );
        }
    }

    /// Same as `check_text` but blank values are allowed.
    pub fn check_optional_text(&mut self, field: &str, value: Option<&str>, label: &str, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.add_error(
                    field,
                    &format!("{} must be at most {} characters", label, max),
                );
            }
        }
    }

    pub fn into_result(self) -> Result<(), ValidationResult> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}
