use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("{0}")]
    Validation(String),
    #[error("time block not found: {0}")]
    BlockNotFound(String),
}

impl From<String> for CalendarError {
    fn from(message: String) -> Self {
        Self::Validation(message)
    }
}
