//! CLI argument definitions for `dwv`.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `query` | Run an event query and print or save the results |
//! | `dictionary` | Show the field dictionary |
//! | `authorization` | Show what the service knows about the credential, or evict cached users |
//! | `accumulo` | Reload or view the Accumulo table cache |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--url` | `$DWV_URL` | Service host, `https://` is prepended when missing |
//! | `--localhost` | `false` | Use `https://localhost:8443` |
//! | `--cert` | required | Client certificate (PEM) |
//! | `--key` | none | Separate private key (PEM) |
//! | `-H/--header` | none | Extra `NAME:VALUE` header, repeatable |
//! | `--log-level` | `info` | Log verbosity, `RUST_LOG` overrides |
//! | `--timeout-ms` | `60000` | Per-request timeout |
//!
//! # Examples
//!
//! ```bash
//! dwv --url dw.example.com --cert user.pem query -q "GENRES == 'Action'" --auths PUBLIC
//! dwv --localhost --cert user.pem query -q "TITLE == 'Heat'" --auths PUBLIC -o out/heat.json -d
//! dwv --localhost --cert user.pem dictionary --auths PUBLIC -d movie
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "dwv",
    version,
    about = "Command-line client for the DataWave query web services"
)]
pub struct Cli {
    /// Service host, e.g. `dw.example.com`.
    #[arg(long, global = true, env = "DWV_URL")]
    pub url: Option<String>,

    /// Talk to a service on `https://localhost:8443`, ignoring `--url`.
    #[arg(long, global = true, default_value_t = false)]
    pub localhost: bool,

    /// Client certificate in PEM format.
    #[arg(long, global = true)]
    pub cert: Option<PathBuf>,

    /// Private key in PEM format, when not bundled with the certificate.
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,

    /// Extra request header as `NAME:VALUE`. Repeatable.
    #[arg(short = 'H', long = "header", global = true)]
    pub headers: Vec<String>,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 60_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a query and print the results, or save them with `-o`.
    ///
    /// Raw data fields show as "Contains raw data" unless `-d` is given, in
    /// which case they are decoded as Parquet tables (console) or written as
    /// `.parquet` files next to the output (file). The JSON output always
    /// keeps the encoded value.
    Query(QueryArgs),
    /// Display the dictionary of fields.
    Dictionary(DictionaryArgs),
    /// Print the whoami details for the credential, or evict every cached
    /// user with `--evict`.
    Authorization(AuthorizationArgs),
    /// Request an Accumulo cache reload, or view the cache with `--view`.
    Accumulo(AccumuloArgs),
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// JEXL query to run.
    #[arg(short, long)]
    pub query: String,

    /// Name given to the query on the service.
    #[arg(long, default_value = "test-query")]
    pub query_name: String,

    /// Comma-separated authorizations.
    #[arg(long)]
    pub auths: String,

    /// Key or comma-separated keys (no spaces) to keep in every event.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// `.json` file to write. Console output only when absent.
    #[arg(short, long, value_parser = json_path)]
    pub output: Option<PathBuf>,

    /// Decode raw data fields.
    #[arg(short, long, default_value_t = false)]
    pub decode_raw: bool,

    #[arg(long, default_value_t = 5)]
    pub page_size: u32,

    /// First day to search, `YYYYMMDD`.
    #[arg(long, default_value = "19700101")]
    pub begin: String,

    /// Last day to search, `YYYYMMDD`.
    #[arg(long, default_value = "20990101")]
    pub end: String,

    /// Column visibility expression attached to the query.
    #[arg(long, default_value = "N/A")]
    pub visibility: String,
}

#[derive(Debug, Args)]
pub struct DictionaryArgs {
    /// Comma-separated authorizations.
    #[arg(long)]
    pub auths: String,

    /// Data type or comma-separated data types to limit the dictionary to.
    #[arg(short, long)]
    pub data_types: Option<String>,

    /// `.txt` file to append the dictionary to.
    #[arg(short, long, value_parser = txt_path)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AuthorizationArgs {
    /// Ask the service to evict all cached users instead of printing whoami.
    #[arg(long, default_value_t = false)]
    pub evict: bool,
}

#[derive(Debug, Args)]
pub struct AccumuloArgs {
    /// View the cache instead of requesting a reload.
    #[arg(short, long, default_value_t = false)]
    pub view: bool,
}

fn json_path(value: &str) -> Result<PathBuf, String> {
    path_with_extension(value, "json")
}

fn txt_path(value: &str) -> Result<PathBuf, String> {
    path_with_extension(value, "txt")
}

fn path_with_extension(value: &str, extension: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match path.extension() {
        Some(actual) if actual == extension => Ok(path),
        _ => Err(format!("file must end with .{extension}")),
    }
}
