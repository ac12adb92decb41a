//! # DataWave Core
//!
//! Query session protocol and result pipeline for the DataWave client.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`admin`] | Whoami, user eviction and Accumulo table-cache endpoints |
//! | [`config`] | Base URL resolution, headers, and per-request timeout |
//! | [`dictionary`] | Field dictionary fetch and fixed-width formatting |
//! | [`domain`] | Query parameters, wire pages, records, and metadata |
//! | [`error`] | Error enums for every stage of the pipeline |
//! | [`http_client`] | Blocking transport trait with reqwest and scripted implementations |
//! | [`normalize`] | Raw page flattening and key projection |
//! | [`output`] | Console rendering and JSON artifact persistence |
//! | [`retry`] | Bounded retry for polling external job state |
//! | [`session`] | Single-use query session state machine |
//!
//! ## Flow
//!
//! ```text
//! QueryParameters ──▶ QuerySession::open ──▶ pages() ──▶ normalize::parse_events
//!                                                               │
//!                     output::{print_to_console, persist} ◀── normalize::filter
//! ```

pub mod admin;
pub mod config;
pub mod dictionary;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod output;
pub mod retry;
pub mod session;

pub use config::{parse_headers, resolve_base_url, ConfigError, ConnectionConfig, DEFAULT_PORT};
pub use dictionary::{DictionaryField, DICTIONARY_COLUMNS};
pub use domain::{
    now_unix_ms, NormalizedRecord, QueryMetadata, QueryParameters, QueryResults, RawEvent,
    RawField, RawPage, RawValue,
};
pub use error::{
    AdminError, DictionaryError, NormalizeError, OutputError, SessionError, ValidationError,
};
pub use http_client::{
    Credential, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use output::{PersistReport, RAW_DATA_MARKER};
pub use retry::{RetryError, RetryPolicy};
pub use session::{Pages, QuerySession, SessionState};
