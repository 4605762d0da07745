use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlashdashError {
    #[error("not initialized: run 'slashdash init'")]
    NotInitialized,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid command name '{0}': must be lowercase words joined by hyphens")]
    InvalidCommandName(String),

    #[error("invalid input reference '{0}': expected <kind>:<id>")]
    InvalidInputRef(String),

    #[error("invalid threshold {name}={value}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("unknown hack: {0}")]
    UnknownHack(String),

    #[error("invalid {kind}: {value}")]
    InvalidVariant { kind: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SlashdashError>;
