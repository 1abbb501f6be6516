use std::path::PathBuf;
use thiserror::Error;

/// Service-level errors that can occur in catalog operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Menu item not found: {id}")]
    ItemNotFound { id: i64 },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },

    #[error("Image storage error: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: i64, reason: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) => RepositoryError::ConnectionFailed,
            sqlx::Error::Database(db_err) => {
                if db_err.is_check_violation()
                    || db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                {
                    RepositoryError::ConstraintViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    RepositoryError::Database {
                        message: db_err.message().to_string(),
                    }
                }
            }
            other => RepositoryError::Database {
                message: other.to_string(),
            },
        }
    }
}

/// Errors raised by the image file store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file name: {file_name}")]
    InvalidFileName { file_name: String },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Validation errors for input data
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },

    #[error("Unsupported file type: {extension}, allowed={allowed}")]
    UnsupportedFileType { extension: String, allowed: String },
}

impl ValidationError {
    /// Name of the offending form field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::RequiredField { field }
            | ValidationError::InvalidValue { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
            ValidationError::UnsupportedFileType { .. } => "image",
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for image store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServiceError::ItemNotFound { id: 42 };
        assert_eq!(error.to_string(), "Menu item not found: 42");

        let validation_error = ValidationError::RequiredField {
            field: "name".to_string(),
        };
        assert_eq!(validation_error.to_string(), "Required field missing: name");
    }

    #[test]
    fn test_error_conversion() {
        let validation_error = ValidationError::InvalidValue {
            field: "price".to_string(),
            value: "abc".to_string(),
            reason: "Price must be a number".to_string(),
        };

        let service_error: ServiceError = validation_error.into();
        match service_error {
            ServiceError::ValidationError { message } => {
                assert!(message.contains("Invalid field value"));
            }
            _ => panic!("Expected ValidationError conversion"),
        }
    }

    #[test]
    fn test_repository_error_from_sqlx() {
        let repo_error: RepositoryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(repo_error, RepositoryError::NotFound));

        let repo_error: RepositoryError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(repo_error, RepositoryError::Timeout));

        let repo_error: RepositoryError = sqlx::Error::PoolClosed.into();
        assert!(matches!(repo_error, RepositoryError::ConnectionFailed));
    }

    #[test]
    fn test_storage_error_wraps_into_service_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let service_error: ServiceError = StorageError::io("static/uploads/x.png", io).into();

        assert!(matches!(service_error, ServiceError::Storage { .. }));
        assert!(service_error.to_string().contains("static/uploads/x.png"));
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max_length: 100,
            actual_length: 120,
        };
        assert_eq!(err.field(), "name");

        let err = ValidationError::UnsupportedFileType {
            extension: "exe".to_string(),
            allowed: "png".to_string(),
        };
        assert_eq!(err.field(), "image");
    }
}
