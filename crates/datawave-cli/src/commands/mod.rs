mod accumulo;
mod authorization;
mod dictionary;
mod query;

use std::sync::Arc;

use datawave_core::{
    parse_headers, resolve_base_url, ConnectionConfig, Credential, HttpClient, ReqwestHttpClient,
};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Everything a command needs to reach the service.
pub struct Context {
    pub config: ConnectionConfig,
    pub credential: Credential,
    pub client: Arc<dyn HttpClient>,
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    let context = build_context(cli)?;

    match &cli.command {
        Command::Query(args) => query::run(args, &context),
        Command::Dictionary(args) => dictionary::run(args, &context),
        Command::Authorization(args) => authorization::run(args, &context),
        Command::Accumulo(args) => accumulo::run(args, &context),
    }
}

fn build_context(cli: &Cli) -> Result<Context, CliError> {
    let base_url = resolve_base_url(cli.localhost, cli.url.as_deref())?;
    debug!(%base_url, "resolved base URL");

    let headers = parse_headers(&cli.headers)?;
    debug!(?headers, "headers passed in");

    let cert = cli.cert.clone().ok_or(CliError::MissingCert)?;
    let credential = match &cli.key {
        Some(key) => Credential::new(cert).with_key(key),
        None => Credential::new(cert),
    };
    let client = ReqwestHttpClient::with_credential(&credential).map_err(CliError::Client)?;

    Ok(Context {
        config: ConnectionConfig::new(base_url)
            .with_headers(headers)
            .with_timeout_ms(cli.timeout_ms),
        credential,
        client: Arc::new(client),
    })
}
