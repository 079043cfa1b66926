use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Reaction error: {0}")]
    Reaction(#[from] ReactionError),

    #[error("Comment error: {0}")]
    Comment(#[from] CommentError),
}

/// Remote REST API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// The keyed resource does not exist (HTTP 404 on a lookup).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid base URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Input rejected before any remote call
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Validation failed: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Taxonomy load errors
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("Failed to load taxonomy: {0}")]
    Remote(#[from] ApiError),

    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("{rank} {id} references missing parent {parent_id}")]
    OrphanNode {
        rank: String,
        id: String,
        parent_id: String,
    },

    #[error("{rank} {id} has invalid parent: {reason}")]
    InvalidParent {
        rank: String,
        id: String,
        reason: String,
    },
}

/// Cascading filter transition rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Taxonomy not loaded")]
    NotLoaded,

    #[error("Unknown category: {id}")]
    UnknownCategory { id: String },

    #[error("No {level} selected")]
    NoParentSelected { level: String },

    #[error("{id} is not a child of {parent_id}")]
    NotAChild { id: String, parent_id: String },
}

/// Reaction ledger errors
#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("Reaction toggle already in flight for {content_id}/{user_id}")]
    InFlight { content_id: String, user_id: String },

    #[error("Reaction update failed: {0}")]
    Remote(#[from] ApiError),

    #[error("Reaction saved but counts could not be refreshed: {source}")]
    Reconcile { source: ApiError },
}

/// Comment thread errors
#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Comment request failed: {0}")]
    Remote(#[from] ApiError),
}

impl ValidationError {
    /// Shorthand for an invalid field.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl ApiError {
    /// Whether this error is the explicit "resource does not exist" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for REST API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for taxonomy operations
pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Result type alias for filter transitions
pub type FilterResult<T> = Result<T, FilterError>;

/// Result type alias for reaction operations
pub type ReactionResult<T> = Result<T, ReactionError>;

/// Result type alias for comment operations
pub type CommentResult<T> = Result<T, CommentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound {
            resource: "reaction r-1/u-1".to_string(),
        };
        assert_eq!(err.to_string(), "Not found: reaction r-1/u-1");

        let err = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ApiError::InvalidResponse {
            message: "malformed JSON".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid response: malformed JSON");

        let err = ApiError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_not_found_is_distinct_from_status_errors() {
        assert!(ApiError::NotFound {
            resource: "x".to_string()
        }
        .is_not_found());
        assert!(!ApiError::Api {
            status: 404,
            message: "route missing".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_hierarchy_error_display() {
        let err = HierarchyError::OrphanNode {
            rank: "project".to_string(),
            id: "p-1".to_string(),
            parent_id: "c-9".to_string(),
        };
        assert_eq!(err.to_string(), "project p-1 references missing parent c-9");

        let err = HierarchyError::DuplicateNode {
            id: "c-1".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate node id: c-1");
    }

    #[test]
    fn test_filter_error_display() {
        let err = FilterError::NotAChild {
            id: "grid".to_string(),
            parent_id: "health".to_string(),
        };
        assert_eq!(err.to_string(), "grid is not a child of health");

        let err = FilterError::NoParentSelected {
            level: "category".to_string(),
        };
        assert_eq!(err.to_string(), "No category selected");
    }

    #[test]
    fn test_reaction_error_display() {
        let err = ReactionError::InFlight {
            content_id: "r-1".to_string(),
            user_id: "u-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Reaction toggle already in flight for r-1/u-1"
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: CommentError = ValidationError::invalid("body", "cannot be empty").into();
        assert!(matches!(err, CommentError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: body - cannot be empty");

        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Comment(_)));
    }

    #[test]
    fn test_api_error_conversion_to_app_error() {
        let api_err = ApiError::Timeout { timeout_ms: 1000 };
        let app_err: AppError = api_err.into();
        assert!(matches!(app_err, AppError::Api(_)));
    }

    #[test]
    fn test_filter_error_conversion_to_app_error() {
        let app_err: AppError = FilterError::NotLoaded.into();
        assert!(matches!(app_err, AppError::Filter(FilterError::NotLoaded)));
    }
}
