use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// True when the store rejected a write because of a unique, primary key
    /// or foreign key constraint (duplicate link, duplicate feed name, link to
    /// a missing row).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == ErrorCode::ConstraintViolation
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn sqlite_failure(code: std::os::raw::c_int) -> AppError {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(code), None);
        AppError::Database(tokio_rusqlite::Error::Rusqlite(err))
    }

    #[test]
    fn constraint_failures_are_conflicts() {
        assert!(sqlite_failure(ffi::SQLITE_CONSTRAINT).is_conflict());
        assert!(sqlite_failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY).is_conflict());
        assert!(!sqlite_failure(ffi::SQLITE_BUSY).is_conflict());
        assert!(!AppError::Database(tokio_rusqlite::Error::ConnectionClosed).is_conflict());
        assert!(!AppError::Config("bad".into()).is_conflict());
    }
}
