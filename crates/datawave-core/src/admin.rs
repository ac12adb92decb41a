//! One-shot administrative endpoints: identity lookup, user eviction and the
//! Accumulo table cache.

use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::http_client::{log_http_response, HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::AdminError;

const WHOAMI_ENDPOINT: &str = "authorization/v1/whoami";
const EVICT_ALL_ENDPOINT: &str = "authorization/v1/admin/evictAll";
const CACHE_RELOAD_ENDPOINT: &str = "DataWave/Common/AccumuloTableCache/reload/datawave.metadata";
const CACHE_VIEW_ENDPOINT: &str = "DataWave/Common/AccumuloTableCache/";

fn get(
    client: &dyn HttpClient,
    config: &ConnectionConfig,
    path: &str,
) -> Result<HttpResponse, HttpError> {
    let url = config.endpoint(path);
    debug!(%url, "sending request");
    let response = client.execute(
        HttpRequest::get(url)
            .with_headers(&config.headers)
            .with_timeout_ms(config.timeout_ms),
    )?;
    log_http_response(&response);
    if !response.is_success() {
        warn!(status = response.status, "request to {path} was not successful");
    }
    Ok(response)
}

/// Body of a 2xx response, or a description of why there is none.
fn success_body(outcome: Result<HttpResponse, HttpError>) -> Result<String, String> {
    match outcome {
        Ok(response) if response.is_success() => Ok(response.body),
        Ok(response) => Err(format!("status {}: {}", response.status, response.body)),
        Err(error) => Err(error.to_string()),
    }
}

/// Identity details for the presented credential, as indented JSON when the
/// body parses, otherwise the raw text.
pub fn whoami(client: &dyn HttpClient, config: &ConnectionConfig) -> Result<String, AdminError> {
    info!("Getting the authorization details for my cert from DW...");
    let body = success_body(get(client, config, WHOAMI_ENDPOINT))
        .map_err(|reason| AdminError::WhoamiFailed { reason })?;
    Ok(pretty_or_raw(&body))
}

/// Drops every cached user on the service so credentials are re-read.
pub fn evict_all_users(
    client: &dyn HttpClient,
    config: &ConnectionConfig,
) -> Result<String, AdminError> {
    info!("Requesting all users to be evicted from DW...");
    success_body(get(client, config, EVICT_ALL_ENDPOINT))
        .map_err(|reason| AdminError::EvictFailed { reason })
}

fn pretty_or_raw(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| body.to_string())
}

/// Asks the service to reload its metadata table cache.
pub fn reload_accumulo_cache(
    client: &dyn HttpClient,
    config: &ConnectionConfig,
) -> Result<u16, HttpError> {
    info!("Reloading the accumulo cache...");
    let response = get(client, config, CACHE_RELOAD_ENDPOINT)?;
    if response.is_success() {
        info!("Successfully requested a reload.");
    }
    Ok(response.status)
}

/// Current table cache status as returned by the service.
pub fn view_accumulo_cache(
    client: &dyn HttpClient,
    config: &ConnectionConfig,
) -> Result<String, HttpError> {
    info!("Viewing the accumulo cache...");
    Ok(get(client, config, CACHE_VIEW_ENDPOINT)?.body)
}
