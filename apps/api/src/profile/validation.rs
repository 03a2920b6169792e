use serde::Serialize;

/// A single invalid field, reported back inline next to the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates every field error of a form instead of stopping at the first.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Returns the trimmed value, recording an error when it is blank.
    pub fn required(&mut self, field: &str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "is required");
        }
        trimmed.to_string()
    }

    /// Like `required`, with an upper bound on length in characters.
    pub fn required_max(&mut self, field: &str, value: &str, max_chars: usize) -> String {
        let trimmed = self.required(field, value);
        if trimmed.chars().count() > max_chars {
            self.push(field, format!("must be at most {max_chars} characters"));
        }
        trimmed
    }

    /// Merges errors from a nested form under `prefix`, e.g. `experiences[0]`.
    pub fn extend_prefixed(&mut self, prefix: &str, errors: Vec<FieldError>) {
        self.0.extend(errors.into_iter().map(|e| FieldError {
            field: format!("{prefix}.{}", e.field),
            message: e.message,
        }));
    }

    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}

/// Trimmed optional text; blank becomes None.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
