//! Error types for the Armory domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Armory operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Lookup errors ---
    #[error("Configuration not found: {kind} '{id}'")]
    ConfigurationNotFound { kind: String, id: String },

    // --- Assembly errors ---
    #[error("Construction failed: {0}")]
    Construction(#[from] ConstructionError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ConfigurationNotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures raised while building or registering a component.
#[derive(Debug, Clone, Error)]
pub enum ConstructionError {
    #[error("{component}: {reason}")]
    Failed { component: String, reason: String },

    #[error("{component} is already registered with different parameters")]
    Divergent { component: String },

    #[error("{component} requires {dependency}, which is not registered")]
    MissingDependency {
        component: String,
        dependency: String,
    },

    #[error("{component} is registered as a {actual} component")]
    KindMismatch { component: String, actual: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("MCP server '{server}' unavailable: {reason}")]
    Unavailable { server: String, reason: String },
}

impl ToolError {
    /// Whether the model can be told about this error and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidArguments(_))
    }
}
