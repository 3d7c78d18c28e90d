use thiserror::Error;

/// Every fatal condition raised while parsing, validating, binding or
/// dispatching an invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// A flag that does not accept multiple values occurred twice.
    #[error("option cannot be used multiple times: {0}")]
    DuplicateOption(String),

    /// A required flag never occurred (and no environment value was found).
    #[error("option is required: {0}")]
    MissingRequired(String),

    /// A positional accessor asked for an index past the end.
    #[error("missing argument at index {0}")]
    MissingArgument(usize),

    /// A typed flag accessor found no value to convert.
    #[error("option has no value: {0}")]
    MissingValue(String),

    /// A value could not be converted to the requested type.
    #[error("invalid value '{value}' for {target}: {reason}")]
    InvalidValue {
        target: String,
        value: String,
        reason: String,
    },

    /// A struct field could not be populated from its flag.
    #[error("bind field '{field}' failed: {reason}")]
    Bind { field: String, reason: String },

    /// Raised by a handler.
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid translation table: {0}")]
    Translations(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::Failed(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::Failed(msg.to_string())
    }
}
