use thiserror::Error;

/// Failure raised while evaluating a decoded program.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("variable X{} referenced but only {available} binding(s) provided", .index + 1)]
    OutOfRange { index: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum TinyGpError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Run aborted (last collected generation: {}): {cause}", describe_generation(.last_generation))]
    RunAborted {
        last_generation: Option<u32>,
        #[source]
        cause: Box<TinyGpError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl TinyGpError {
    /// The underlying error of an aborted run, or `self` otherwise.
    pub fn cause(&self) -> &TinyGpError {
        match self {
            TinyGpError::RunAborted { cause, .. } => cause.cause(),
            other => other,
        }
    }
}

fn describe_generation(generation: &Option<u32>) -> String {
    generation.map_or_else(|| "none".to_string(), |g| g.to_string())
}

pub type Result<T> = std::result::Result<T, TinyGpError>;
