use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Subrequest failed: {0}")]
    SubrequestError(#[from] reqwest::Error),

    #[error("Subrequest to {path} timed out after {timeout_ms}ms")]
    SubrequestTimeout { path: String, timeout_ms: u64 },

    #[error("Upstream {path} responded with status {status}")]
    UpstreamStatusError { path: String, status: u16 },

    #[error("Malformed upstream payload: {0}")]
    PayloadError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Invalid owner id '{id}': {reason}")]
    InvalidOwnerId { id: String, reason: String },
}

impl AggregatorError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AggregatorError::ConfigError { .. }
                | AggregatorError::MissingConfigError { .. }
                | AggregatorError::InvalidConfigValueError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AggregatorError::SubrequestError(_) | AggregatorError::SubrequestTimeout { .. } => {
                "Could not reach the upstream service".to_string()
            }
            AggregatorError::UpstreamStatusError { status, .. } => {
                format!("The upstream service rejected the request (status {})", status)
            }
            AggregatorError::PayloadError(_) => {
                "The upstream service returned data in an unexpected shape".to_string()
            }
            AggregatorError::IoError(e) => format!("File or network IO failed: {}", e),
            AggregatorError::ConfigError { message } => format!("Invalid configuration: {}", message),
            AggregatorError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            AggregatorError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            AggregatorError::ServerError { message } => format!("Server failed: {}", message),
            AggregatorError::InvalidOwnerId { id, .. } => {
                format!("Owner id '{}' cannot be forwarded upstream", id)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AggregatorError::SubrequestError(_) | AggregatorError::SubrequestTimeout { .. } => {
                "Check that --upstream-url points at a running service"
            }
            AggregatorError::UpstreamStatusError { .. } => {
                "Check --owners-path and the upstream service logs"
            }
            AggregatorError::PayloadError(_) => {
                "Make sure the owners endpoint returns an array of owners with a 'pets' list"
            }
            AggregatorError::IoError(_) => "Check file permissions and that the port is free",
            AggregatorError::ConfigError { .. }
            | AggregatorError::MissingConfigError { .. }
            | AggregatorError::InvalidConfigValueError { .. } => {
                "Run with --help to see the accepted options"
            }
            AggregatorError::ServerError { .. } => "Check the listen address and retry",
            AggregatorError::InvalidOwnerId { .. } => {
                "Use an owner id without '/', '?', '#', '%' or dot segments"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
