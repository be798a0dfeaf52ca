use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Offline cache error: {0}")]
    Cache(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid permission type '{0}'. Expected: view, edit")]
    InvalidPermission(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_distinguish_denied_from_missing() {
        let denied = AppError::AccessDenied("doc-1".into()).to_string();
        let missing = AppError::NotFound("Document does not exist".into()).to_string();
        assert!(denied.starts_with("Access denied"));
        assert!(missing.contains("Document does not exist"));
    }

    #[test]
    fn test_invalid_permission_message() {
        let err = AppError::InvalidPermission("owner".into());
        assert_eq!(
            err.to_string(),
            "Invalid permission type 'owner'. Expected: view, edit"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AppError::Internal(msg) if msg == "boom"));
    }
}
