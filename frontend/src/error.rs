use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage operation failed: {0}")]
    Operation(String),
    #[error("malformed stored value under {key}: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize value for {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Raised by the tracking primitive when a command cannot be delivered.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("gtag call failed: {0}")]
    Send(String),
    #[error("could not convert params: {0}")]
    Params(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    #[error("failed to load script {0}")]
    LoadFailed(String),
    #[error("timed out waiting for script")]
    Timeout,
    #[error("document not available")]
    NoDocument,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please wait before submitting again")]
    Throttled,
    #[error("Contact form is currently disabled. Please contact the administrator.")]
    MissingAccessKey,
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Request(#[from] RequestError),
}
