//! Connection settings shared by every request against the web services.

use std::collections::BTreeMap;

use thiserror::Error;

/// Port the DataWave web services listen on when reached directly.
pub const DEFAULT_PORT: u16 = 8443;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("URL is none, cannot continue")]
    MissingUrl,

    #[error("invalid header '{value}', expected NAME:VALUE")]
    InvalidHeader { value: String },
}

/// Where the service lives and what to send with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl ConnectionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: BTreeMap::new(),
            timeout_ms: 60_000,
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Joins `path` onto the base URL with exactly one `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Resolves the base URL: `localhost` wins, otherwise `https://{url}`.
/// A URL that already carries a scheme is used as-is.
pub fn resolve_base_url(localhost: bool, url: Option<&str>) -> Result<String, ConfigError> {
    if localhost {
        return Ok(format!("https://localhost:{DEFAULT_PORT}"));
    }

    let url = url.map(str::trim).filter(|url| !url.is_empty());
    match url {
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
            Ok(url.trim_end_matches('/').to_string())
        }
        Some(url) => Ok(format!("https://{}", url.trim_end_matches('/'))),
        None => Err(ConfigError::MissingUrl),
    }
}

/// Parses `NAME:VALUE` header arguments into a map. Later duplicates win.
pub fn parse_headers<I, S>(values: I) -> Result<BTreeMap<String, String>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers = BTreeMap::new();
    for value in values {
        let value = value.as_ref();
        let Some((name, header_value)) = value.split_once(':') else {
            return Err(ConfigError::InvalidHeader {
                value: value.to_string(),
            });
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidHeader {
                value: value.to_string(),
            });
        }
        headers.insert(name.to_string(), header_value.trim().to_string());
    }
    Ok(headers)
}
