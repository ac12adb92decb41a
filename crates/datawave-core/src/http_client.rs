use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP methods used against the DataWave web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP request envelope passed to an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: 60_000,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        for (name, value) in headers {
            self.headers
                .insert(name.to_ascii_lowercase(), value.clone());
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// URL-encodes `fields` in the given order as an
    /// `application/x-www-form-urlencoded` body.
    pub fn with_form<K, V>(self, fields: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let body = fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name.as_ref()),
                    urlencoding::encode(value.as_ref())
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        self.with_header("content-type", "application/x-www-form-urlencoded")
            .with_body(body)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Decodes the form body back into ordered pairs.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let Some(body) = self.body.as_deref() else {
            return Vec::new();
        };

        body.split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_form_component(name), decode_form_component(value))
            })
            .collect()
    }
}

fn decode_form_component(component: &str) -> String {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| component.to_string())
}

/// HTTP response envelope returned by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Blocking transport contract. Implementations carry the client credential
/// and never validate the server certificate.
pub trait HttpClient: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Client certificate used for mutual TLS, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    cert: PathBuf,
    key: Option<PathBuf>,
}

impl Credential {
    pub fn new(cert: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<PathBuf>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn cert(&self) -> &Path {
        &self.cert
    }

    pub fn key(&self) -> Option<&Path> {
        self.key.as_deref()
    }

    /// Non-secret label for the credential: the certificate file stem.
    pub fn label(&self) -> String {
        self.cert
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.cert.to_string_lossy().into_owned())
    }

    fn identity_pem(&self) -> std::io::Result<Vec<u8>> {
        let mut pem = std::fs::read(&self.cert)?;
        if let Some(key) = &self.key {
            if !pem.ends_with(b"\n") {
                pem.push(b'\n');
            }
            pem.extend(std::fs::read(key)?);
        }
        Ok(pem)
    }
}

/// Production transport built on `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    /// Client without an identity; server certificates are not verified.
    pub fn new() -> Self {
        Self {
            client: Self::builder()
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }

    /// Client presenting `credential` on every request.
    pub fn with_credential(credential: &Credential) -> Result<Self, HttpError> {
        let pem = credential.identity_pem().map_err(|error| {
            HttpError::new(format!(
                "failed to read credential '{}': {error}",
                credential.cert().display()
            ))
        })?;
        let identity = reqwest::Identity::from_pem(&pem).map_err(|error| {
            HttpError::new(format!("invalid client credential: {error}"))
        })?;

        let client = Self::builder()
            .identity(identity)
            .build()
            .map_err(|error| HttpError::new(format!("failed to build client: {error}")))?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    fn builder() -> reqwest::blocking::ClientBuilder {
        reqwest::blocking::Client::builder()
            .user_agent(concat!("datawave-cli/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(true)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = builder.timeout(Duration::from_millis(request.timeout_ms));

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                HttpError::new(format!("request timeout: {e}"))
            } else if e.is_connect() {
                HttpError::new(format!("connection failed: {e}"))
            } else {
                HttpError::new(format!("request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

/// In-memory transport that replays queued responses in order and records
/// every request it receives. Used for deterministic offline tests.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<HttpResponse, HttpError>>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: Result<HttpResponse, HttpError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response left")))
    }
}

/// Logs the response status, and the body for anything other than 200/204.
pub fn log_http_response(response: &HttpResponse) {
    debug!(status = response.status, "response received");
    if response.status != 200 && response.status != 204 {
        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(json) => debug!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| response.body.clone())
            ),
            Err(_) => debug!("{}", response.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_headers_are_lowercased_and_merged() {
        let mut headers = BTreeMap::new();
        headers.insert(String::from("Authorization"), String::from("Bearer abc"));

        let request = HttpRequest::get("https://example.test/whoami")
            .with_header("X-Trace", "1")
            .with_headers(&headers);

        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer abc")
        );
        assert_eq!(request.headers.get("x-trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn form_body_keeps_field_order_and_encodes_values() {
        let request = HttpRequest::post("https://example.test/create.json").with_form(&[
            ("query", "GENRES == 'Test'"),
            ("auths", "A,B"),
        ]);

        assert_eq!(
            request.body.as_deref(),
            Some("query=GENRES%20%3D%3D%20%27Test%27&auths=A%2CB")
        );
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(
            request.form_fields(),
            vec![
                (String::from("query"), String::from("GENRES == 'Test'")),
                (String::from("auths"), String::from("A,B")),
            ]
        );
    }

    #[test]
    fn credential_label_is_certificate_stem() {
        let credential = Credential::new("/certs/test-cert.pem").with_key("/certs/test-key.pem");
        assert_eq!(credential.label(), "test-cert");
        assert_eq!(credential.key(), Some(Path::new("/certs/test-key.pem")));
    }

    #[test]
    fn scripted_client_replays_in_order_then_fails() {
        let client = ScriptedHttpClient::new([
            Ok(HttpResponse::ok_json("{}")),
            Ok(HttpResponse::new(404, "")),
        ]);

        assert_eq!(client.execute(HttpRequest::get("a")).map(|r| r.status), Ok(200));
        assert_eq!(client.execute(HttpRequest::get("b")).map(|r| r.status), Ok(404));
        assert!(client.execute(HttpRequest::get("c")).is_err());
        assert_eq!(client.requests().len(), 3);
    }
}
