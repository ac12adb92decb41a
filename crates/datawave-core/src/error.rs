use std::path::PathBuf;

use thiserror::Error;

use crate::http_client::HttpError;
use crate::session::SessionState;

/// Validation errors for user-supplied query inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("auths cannot be empty")]
    EmptyAuths,
    #[error("page size must be greater than zero")]
    ZeroPageSize,
    #[error("{field} date must be YYYYMMDD: '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("begin date {begin} is after end date {end}")]
    InvertedDateRange { begin: String, end: String },
}

/// Errors from reshaping or projecting normalized records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{missing:?} not found in any results")]
    UnknownFilterKey { missing: Vec<String> },
}

/// Errors from rendering or persisting query results.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to rename existing output file {path}; check that it is not in use or otherwise locked")]
    PersistRenameFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("raw data field '{field}' could not be decoded: {source}")]
    RawData {
        field: String,
        #[source]
        source: datawave_rawdata::RawDataError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the query session protocol.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("create endpoint returned non-200 response {status}: {body}")]
    SessionCreateFailed { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(#[from] HttpError),

    #[error("query session is {state}, expected open")]
    NotOpen { state: SessionState },

    #[error("query session is {state}; sessions cannot be reopened")]
    AlreadyUsed { state: SessionState },

    #[error("malformed response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the field dictionary endpoint.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Invalid response from dictionary request: {reason}")]
    RequestFailed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the authorization endpoints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("A bad response from the endpoint whoami was found: {reason}")]
    WhoamiFailed { reason: String },

    #[error("An error occurred while requesting to evict all users: {reason}")]
    EvictFailed { reason: String },
}
