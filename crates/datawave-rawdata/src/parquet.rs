use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::Path;

use ::duckdb::types::Value as DuckValue;
use ::duckdb::{Connection, Statement, ToSql};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};

use crate::table::TextTable;
use crate::RawDataError;

/// Decodes a standard-alphabet base64 payload.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, RawDataError> {
    Ok(STANDARD.decode(encoded.trim())?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParquetColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Columnar contents of a decoded Parquet payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParquetTable {
    pub columns: Vec<ParquetColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl ParquetTable {
    pub fn from_base64(encoded: &str) -> Result<Self, RawDataError> {
        Self::from_bytes(&decode_base64(encoded)?)
    }

    /// Stages the bytes in a temporary `.parquet` file and reads it back.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RawDataError> {
        let mut staging = tempfile::Builder::new()
            .prefix("datawave-rawdata-")
            .suffix(".parquet")
            .tempfile()?;
        staging.write_all(bytes)?;
        staging.flush()?;
        Self::read(staging.path())
    }

    /// Reads every column and row of a Parquet file in one DuckDB query.
    pub fn read(path: &Path) -> Result<Self, RawDataError> {
        let connection = Connection::open_in_memory()?;
        let location = path.to_string_lossy().replace('\\', "/").replace('\'', "''");
        let mut statement = connection.prepare(&format!("SELECT * FROM read_parquet('{location}')"))?;
        let mut cursor = statement.query([] as [&dyn ToSql; 0])?;

        let columns = cursor.as_ref().map(describe_columns).unwrap_or_default();
        let mut rows = Vec::new();
        while let Some(row) = cursor.next()? {
            rows.push(
                (0..columns.len())
                    .map(|index| row.get::<_, DuckValue>(index).map(cell_value))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }

        Ok(Self {
            columns,
            row_count: rows.len(),
            rows,
        })
    }

    pub fn to_text_table(&self) -> TextTable {
        let mut table = TextTable::new(self.columns.iter().map(|column| column.name.clone()));
        for row in &self.rows {
            table.push_row(row.iter().map(render_cell));
        }
        table
    }
}

impl Display for ParquetTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n[{} rows x {} columns]",
            self.to_text_table(),
            self.row_count,
            self.columns.len()
        )
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Column names and DuckDB types of an executed statement.
fn describe_columns(statement: &Statement<'_>) -> Vec<ParquetColumn> {
    (0..statement.column_count())
        .map(|index| ParquetColumn {
            name: statement
                .column_name(index)
                .map_or_else(|_| format!("column_{index}"), ToString::to_string),
            r#type: statement.column_type(index).to_string(),
        })
        .collect()
}

fn cell_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(flag) => json!(flag),
        DuckValue::TinyInt(n) => json!(n),
        DuckValue::SmallInt(n) => json!(n),
        DuckValue::Int(n) => json!(n),
        DuckValue::BigInt(n) => json!(n),
        DuckValue::UTinyInt(n) => json!(n),
        DuckValue::USmallInt(n) => json!(n),
        DuckValue::UInt(n) => json!(n),
        DuckValue::UBigInt(n) => json!(n),
        // NaN and infinities have no JSON form and render as null.
        DuckValue::Float(n) => json!(n),
        DuckValue::Double(n) => json!(n),
        DuckValue::Text(text) => Value::String(text),
        DuckValue::Blob(bytes) => Value::String(hex::encode(bytes)),
        other => Value::String(format!("{other:?}")),
    }
}
