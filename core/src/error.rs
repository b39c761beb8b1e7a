use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    pub fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;
