use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid notification id: {0}")]
    InvalidId(String),
}

impl CoreError {
    /// Short error code string, used when an error has to cross the bridge.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::InvalidId(_) => "INVALID_ID",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
