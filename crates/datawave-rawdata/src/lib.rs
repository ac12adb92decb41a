//! Raw payload decoding for DataWave events.
//!
//! Events that carry a `RAWDATA_*` field hold a base64-encoded Parquet file.
//! This crate decodes that payload and reads it back through an in-memory
//! DuckDB connection so it can be shown as a text table.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`parquet`] | Base64 decoding and Parquet reading |
//! | [`table`] | Fixed-width `|`-separated text tables |

pub mod parquet;
pub mod table;

use thiserror::Error;

pub use parquet::{decode_base64, ParquetColumn, ParquetTable};
pub use table::TextTable;

#[derive(Debug, Error)]
pub enum RawDataError {
    #[error("raw data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
