use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{action}: missing argument {index}")]
    MissingArgument { action: &'static str, index: usize },

    #[error("{action}: {reason}")]
    InvalidArgument { action: &'static str, reason: String },

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Stable code carried in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } => "INVALID_ARGS",
            Self::Malformed(_) => "MALFORMED",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
