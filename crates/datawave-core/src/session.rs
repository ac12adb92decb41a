//! Stateful client for one paginated event query.
//!
//! A session is single use: it is created `Unopened`, becomes `Open` once the
//! service hands out a query id, and ends `Closed`. Pages are pulled one at a
//! time with [`QuerySession::pull_page`] or lazily through
//! [`QuerySession::pages`]; a non-200 `next` response marks the end of the
//! stream.

use std::fmt::{Display, Formatter};
use std::iter::FusedIterator;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::domain::{NormalizedRecord, QueryMetadata, QueryParameters, QueryResults, RawPage};
use crate::http_client::{log_http_response, HttpClient, HttpRequest};
use crate::normalize::parse_events;
use crate::SessionError;

const CREATE_ENDPOINT: &str = "DataWave/Query/EventQuery/create.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unopened => "unopened",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "Result")]
    result: String,
}

pub struct QuerySession {
    config: ConnectionConfig,
    client: Arc<dyn HttpClient>,
    params: QueryParameters,
    credential_label: String,
    session_id: Option<String>,
    state: SessionState,
    results_count: u64,
}

impl QuerySession {
    pub fn new(
        config: ConnectionConfig,
        client: Arc<dyn HttpClient>,
        params: QueryParameters,
    ) -> Self {
        Self {
            config,
            client,
            params,
            credential_label: String::new(),
            session_id: None,
            state: SessionState::Unopened,
            results_count: 0,
        }
    }

    /// Label recorded as `Cert` in the captured metadata.
    pub fn with_credential_label(mut self, label: impl Into<String>) -> Self {
        self.credential_label = label.into();
        self
    }

    pub fn params(&self) -> &QueryParameters {
        &self.params
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn results_count(&self) -> u64 {
        self.results_count
    }

    pub fn credential_label(&self) -> &str {
        &self.credential_label
    }

    /// Creates the query on the service and stores its id.
    pub fn open(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Unopened {
            return Err(SessionError::AlreadyUsed { state: self.state });
        }

        let url = self.config.endpoint(CREATE_ENDPOINT);
        debug!(%url, "creating query");
        info!(
            query_name = self.params.query_name(),
            query = self.params.query(),
            auths = self.params.auths(),
            page_size = self.params.page_size(),
            "executing query"
        );

        let request = self
            .request(HttpRequest::post(url))
            .with_form(&self.params.serialize());
        let response = self.client.execute(request)?;
        log_http_response(&response);

        if !response.is_ok() {
            return Err(SessionError::SessionCreateFailed {
                status: response.status,
                body: response.body,
            });
        }

        let created: CreateResponse =
            response
                .json()
                .map_err(|source| SessionError::MalformedResponse {
                    endpoint: String::from(CREATE_ENDPOINT),
                    source,
                })?;
        debug!(session_id = %created.result, "query created");
        self.session_id = Some(created.result);
        self.state = SessionState::Open;
        Ok(())
    }

    /// Fetches the next page. `Ok(None)` means the service has no more
    /// results.
    pub fn pull_page(&mut self) -> Result<Option<RawPage>, SessionError> {
        let id = match (&self.state, &self.session_id) {
            (SessionState::Open, Some(id)) => id,
            _ => return Err(SessionError::NotOpen { state: self.state }),
        };

        let endpoint = format!("DataWave/Query/{id}/next.json");
        let url = self.config.endpoint(&endpoint);
        debug!(%url, "requesting next page");

        let response = self.client.execute(self.request(HttpRequest::get(url)))?;
        log_http_response(&response);
        if !response.is_ok() {
            debug!(status = response.status, "end of results");
            return Ok(None);
        }

        let page: RawPage = response
            .json()
            .map_err(|source| SessionError::MalformedResponse { endpoint, source })?;
        self.results_count += page.returned_events;
        Ok(Some(page))
    }

    /// Ends the session. Safe to call in any state; the close request is
    /// sent at most once and its failures are only logged.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let was_open = self.state == SessionState::Open;
        self.state = SessionState::Closed;

        let Some(id) = self.session_id.as_deref() else {
            return;
        };
        let url = self.config.endpoint(&format!("DataWave/Query/{id}/close.json"));
        debug!(%url, "closing query");
        match self.client.execute(self.request(HttpRequest::get(url))) {
            Ok(response) => {
                log_http_response(&response);
                if !response.is_success() {
                    warn!(status = response.status, "close request was not accepted");
                }
            }
            Err(error) => warn!("close request failed: {error}"),
        }

        if was_open {
            if self.results_count > 0 {
                info!("Total results retrieved: {}", self.results_count);
            } else {
                info!("No results found!");
            }
        }
    }

    /// Opens the session, runs `body`, and closes the session on every exit
    /// path.
    pub fn scoped<T, E, F>(mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut QuerySession) -> Result<T, E>,
        E: From<SessionError>,
    {
        if let Err(error) = self.open() {
            self.close();
            return Err(error.into());
        }
        let outcome = body(&mut self);
        self.close();
        outcome
    }

    /// Lazy page sequence. Ends at the end of the stream, or right after
    /// yielding an error.
    pub fn pages(&mut self) -> Pages<'_> {
        Pages {
            session: self,
            finished: false,
        }
    }

    /// Metadata for the results pulled so far.
    pub fn metadata(&self) -> QueryMetadata {
        QueryMetadata::capture(&self.params, self.results_count, &self.credential_label)
    }

    /// Runs the whole query: open, drain every page through the normalizer,
    /// close, and capture metadata.
    pub fn collect(self) -> Result<QueryResults, SessionError> {
        self.scoped(|session| {
            let mut events: Vec<NormalizedRecord> = Vec::new();
            for page in session.pages() {
                events.extend(parse_events(&page?));
            }
            Ok(QueryResults::new(session.metadata(), events))
        })
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        request
            .with_headers(&self.config.headers)
            .with_timeout_ms(self.config.timeout_ms)
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            self.close();
        }
    }
}

impl std::fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySession")
            .field("base_url", &self.config.base_url)
            .field("params", &self.params)
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("results_count", &self.results_count)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`QuerySession::pages`].
#[derive(Debug)]
pub struct Pages<'a> {
    session: &'a mut QuerySession,
    finished: bool,
}

impl Iterator for Pages<'_> {
    type Item = Result<RawPage, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.session.pull_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

impl FusedIterator for Pages<'_> {}

#[cfg(test)]
mod tests {
    use crate::http_client::{HttpError, HttpResponse, ScriptedHttpClient};

    use super::*;

    fn session(client: Arc<ScriptedHttpClient>) -> QuerySession {
        QuerySession::new(
            ConnectionConfig::new("https://dw.test"),
            client,
            QueryParameters::new("test-query", "GENRES == 'Test'", "PUBLIC"),
        )
    }

    #[test]
    fn new_session_is_unopened() {
        let session = session(Arc::new(ScriptedHttpClient::default()));
        assert_eq!(session.state(), SessionState::Unopened);
        assert_eq!(session.session_id(), None);
        assert_eq!(session.results_count(), 0);
    }

    #[test]
    fn open_stores_session_id() {
        let client = Arc::new(ScriptedHttpClient::new([Ok(HttpResponse::ok_json(
            r#"{"Result":"abc-123"}"#,
        ))]));
        let mut session = session(Arc::clone(&client));

        session.open().expect("open should succeed");
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.session_id(), Some("abc-123"));

        // Re-opening is rejected without another request.
        assert!(matches!(
            session.open(),
            Err(SessionError::AlreadyUsed { state: SessionState::Open })
        ));
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn malformed_create_body_is_reported() {
        let client = Arc::new(ScriptedHttpClient::new([Ok(HttpResponse::ok_json("{}"))]));
        let mut session = session(client);

        assert!(matches!(
            session.open(),
            Err(SessionError::MalformedResponse { .. })
        ));
        assert_eq!(session.state(), SessionState::Unopened);
    }

    #[test]
    fn transport_failure_while_paging_stops_iteration() {
        let client = Arc::new(ScriptedHttpClient::new([
            Ok(HttpResponse::ok_json(r#"{"Result":"id"}"#)),
            Err(HttpError::new("connection reset")),
        ]));
        let mut session = session(client);
        session.open().expect("open should succeed");

        let mut pages = session.pages();
        assert!(matches!(pages.next(), Some(Err(SessionError::Transport(_)))));
        assert!(pages.next().is_none());
        assert!(pages.next().is_none());
    }

    #[test]
    fn drop_closes_open_session() {
        let client = Arc::new(ScriptedHttpClient::new([
            Ok(HttpResponse::ok_json(r#"{"Result":"id-9"}"#)),
            Ok(HttpResponse::new(200, "")),
        ]));
        {
            let mut session = session(Arc::clone(&client));
            session.open().expect("open should succeed");
        }

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].url, "https://dw.test/DataWave/Query/id-9/close.json");
    }
}
