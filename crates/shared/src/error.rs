use thiserror::Error;

/// Form fields that cannot be turned into a wire request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("length must be a finite number, got {raw:?}")]
    InvalidLength { raw: String },
    #[error("date must be a calendar date (YYYY-MM-DD), got {raw:?}")]
    InvalidDate { raw: String },
}

impl FieldError {
    pub fn invalid_length(raw: impl Into<String>) -> Self {
        Self::InvalidLength { raw: raw.into() }
    }

    pub fn invalid_date(raw: impl Into<String>) -> Self {
        Self::InvalidDate { raw: raw.into() }
    }
}
