//! Errors raised by the employee service.

use roster_core::{error::DocumentStoreError, page::PaginationError};
use thiserror::Error;

pub type EmployeeResult<T> = Result<T, EmployeeError>;

#[derive(Error, Debug)]
pub enum EmployeeError {
    /// The request itself is unacceptable; nothing was read or written.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The store failed after the request passed validation.
    #[error("{0}")]
    Internal(String),
}

impl EmployeeError {
    pub fn not_found(employee_id: &str) -> Self {
        Self::NotFound(format!("Employee with ID {employee_id} not found"))
    }

    pub fn already_exists(employee_id: &str) -> Self {
        Self::Conflict(format!("Employee with ID {employee_id} already exists"))
    }
}

impl From<DocumentStoreError> for EmployeeError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::DuplicateKey(key, _) => Self::Conflict(format!("Duplicate key {key}")),
            other => Self::Internal(format!("An error occurred: {other}")),
        }
    }
}

impl From<PaginationError> for EmployeeError {
    fn from(err: PaginationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_conflict_or_internal() {
        let conflict = EmployeeError::from(DocumentStoreError::DuplicateKey(
            "employee_id: \"E001\"".into(),
            "employees".into(),
        ));
        assert!(matches!(conflict, EmployeeError::Conflict(_)));

        let internal = EmployeeError::from(DocumentStoreError::Backend("connection reset".into()));
        assert_eq!(internal.to_string(), "An error occurred: Backend error: connection reset");
    }

    #[test]
    fn internal_detail_is_not_prefixed_twice() {
        let err = EmployeeError::Internal("Failed to create employee".into());
        assert_eq!(err.to_string(), "Failed to create employee");
    }

    #[test]
    fn messages_name_the_employee() {
        assert_eq!(EmployeeError::not_found("E404").to_string(), "Employee with ID E404 not found");
        assert_eq!(EmployeeError::already_exists("E001").to_string(), "Employee with ID E001 already exists");
    }

    #[test]
    fn pagination_errors_are_validation_errors() {
        let err = EmployeeError::from(PaginationError::SizeOutOfRange(0));
        assert!(matches!(err, EmployeeError::Validation(msg) if msg == "size must be between 1 and 100, got 0"));
    }
}
