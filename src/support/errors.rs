use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Invalid date range: end date cannot be before start date")]
    InvalidDateRange,

    #[error("Validation: at least one field must be provided")]
    EmptyPatch,

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn subscription_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Subscription",
            field: "id",
            value: id.to_string(),
        }
    }

    /// Business outcomes the caller can act on, as opposed to internal failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DomainError::Storage(_))
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_record() {
        let err = DomainError::subscription_not_found("abc");
        assert_eq!(err.to_string(), "Not found: Subscription with id=abc");
    }

    #[test]
    fn storage_is_the_only_internal_kind() {
        assert!(!DomainError::Storage("boom".into()).is_client_error());
        assert!(DomainError::EmptyPatch.is_client_error());
        assert!(DomainError::AlreadyExists("x".into()).is_client_error());
        assert!(DomainError::InvalidDateRange.is_client_error());
    }
}
