use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Security check failed")]
    SecurityCheckFailed,

    #[error("Sorry, you are not allowed to {0}")]
    Forbidden(&'static str),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Errors that must abort the request without touching the store.
    pub fn is_fatal_rejection(&self) -> bool {
        matches!(
            self,
            Self::SecurityCheckFailed | Self::Forbidden(_) | Self::Unauthenticated
        )
    }
}
