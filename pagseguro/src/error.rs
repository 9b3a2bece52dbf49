//! Error types shared by payload builders and operation clients.

use crate::settings::Mode;
use crate::xml::{Value, XmlError};

/// Errors surfaced by configuration, payload building, and calls against
/// the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("Invalid configuration for `{field}`: {reason}")]
    Config {
        /// Name of the configuration key that failed.
        field: &'static str,
        /// Explanation of what was wrong with the value.
        reason: String,
    },
    /// The operation requires the other credential mode.
    #[error("{operation} is not available in {mode} mode")]
    UnsupportedMode {
        /// Operation that was attempted.
        operation: &'static str,
        /// Credential mode the client is configured with.
        mode: Mode,
    },
    /// A date string could not be parsed.
    #[error("Could not parse date `{input}`")]
    DateParse {
        /// The rejected input.
        input: String,
    },
    /// The request never produced a provider response.
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
    /// The provider rejected the request outright (HTTP 400).
    #[error("Provider rejected the request: {body}")]
    RejectedRequest {
        /// Response body as returned by the provider.
        body: String,
    },
    /// The provider rejected the credentials (HTTP 401).
    #[error("Provider rejected the credentials")]
    Authentication,
    /// The requested resource does not exist (HTTP 404).
    #[error("Resource not found")]
    NotFound,
    /// The provider answered with a status this client does not handle.
    #[error("Unexpected provider status {status}")]
    UnknownProvider {
        /// HTTP status code of the response.
        status: u16,
    },
    /// The response body was not well-formed XML.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(#[from] XmlError),
    /// The provider returned a validation error document.
    #[error("Provider validation failed: {errors}")]
    ProviderValidation {
        /// Decoded contents of the `errors` element.
        errors: Value,
    },
    /// The response parsed but its root does not match the operation.
    #[error("Unrecognized response shape for {operation}")]
    InvalidResponseShape {
        /// Operation whose response was being decoded.
        operation: &'static str,
    },
}

/// Last failure recorded by an operation client.
///
/// Provider validation keeps the decoded `errors` payload so callers can
/// inspect individual error codes; every other failure keeps its rendered
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastError {
    /// Decoded `errors` element from a provider validation response.
    Provider(Value),
    /// Rendered message of any other failure.
    Message(String),
}

impl From<&Error> for LastError {
    fn from(error: &Error) -> Self {
        match error {
            Error::ProviderValidation { errors } => Self::Provider(errors.clone()),
            other => Self::Message(other.to_string()),
        }
    }
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(errors) => write!(f, "{errors}"),
            Self::Message(message) => f.write_str(message),
        }
    }
}
