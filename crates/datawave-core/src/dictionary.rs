//! Field dictionary: fetch, normalize, and render as a fixed-width table.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use datawave_rawdata::TextTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::http_client::{log_http_response, HttpClient, HttpRequest};
use crate::DictionaryError;

const DICTIONARY_ENDPOINT: &str = "dictionary/data/v1/";

/// Display columns, in output order.
pub const DICTIONARY_COLUMNS: [&str; 10] = [
    "name",
    "Data Type",
    "Forward Indexed",
    "Reversed Indexed",
    "Types",
    "Tokenized",
    "Normalized",
    "Index Only",
    "Descriptions",
    "Last Updated",
];

/// One entry of the service's `MetadataFields` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryField {
    #[serde(rename = "fieldName")]
    pub name: String,
    #[serde(rename = "dataType", default)]
    pub data_type: String,
    #[serde(rename = "forwardIndexed", default)]
    pub forward_indexed: bool,
    #[serde(rename = "reverseIndexed", default)]
    pub reverse_indexed: bool,
    #[serde(rename = "Types", default)]
    pub types: Value,
    #[serde(rename = "Descriptions", default)]
    pub descriptions: Value,
    #[serde(rename = "indexOnly", default)]
    pub index_only: bool,
    #[serde(default)]
    pub normalized: bool,
    #[serde(default)]
    pub tokenized: bool,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Value,
}

impl DictionaryField {
    /// Cells in [`DICTIONARY_COLUMNS`] order.
    pub fn cells(&self) -> [String; 10] {
        [
            self.name.clone(),
            self.data_type.clone(),
            self.forward_indexed.to_string(),
            self.reverse_indexed.to_string(),
            render(&self.types),
            self.tokenized.to_string(),
            self.normalized.to_string(),
            self.index_only.to_string(),
            render(&self.descriptions),
            render(&self.last_updated),
        ]
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct DictionaryResponse {
    #[serde(rename = "MetadataFields")]
    metadata_fields: Vec<DictionaryField>,
}

/// Requests the field dictionary visible to `auths`, optionally limited to
/// the comma-separated `data_types`.
pub fn fetch_dictionary(
    client: &dyn HttpClient,
    config: &ConnectionConfig,
    auths: &str,
    data_types: Option<&str>,
) -> Result<Vec<DictionaryField>, DictionaryError> {
    info!("Getting the entire field dictionary in DataWave...");
    let url = config.endpoint(DICTIONARY_ENDPOINT);
    debug!(%url, "requesting dictionary");

    let mut form = vec![("auths", auths)];
    if let Some(data_types) = data_types {
        form.push(("dataTypeFilters", data_types));
    }
    let request = HttpRequest::get(url)
        .with_headers(&config.headers)
        .with_timeout_ms(config.timeout_ms)
        .with_form(&form);

    let response = client
        .execute(request)
        .map_err(|error| DictionaryError::RequestFailed {
            reason: error.to_string(),
        })?;
    log_http_response(&response);
    if !response.is_success() {
        return Err(DictionaryError::RequestFailed {
            reason: format!("status {}", response.status),
        });
    }
    parse_dictionary(&response.body)
}

pub fn parse_dictionary(body: &str) -> Result<Vec<DictionaryField>, DictionaryError> {
    serde_json::from_str::<DictionaryResponse>(body)
        .map(|response| response.metadata_fields)
        .map_err(|error| DictionaryError::RequestFailed {
            reason: error.to_string(),
        })
}

/// Lays the fields out as a fixed-width table. `None` when there is nothing
/// to show.
pub fn format_dictionary(fields: &[DictionaryField]) -> Option<TextTable> {
    if fields.is_empty() {
        warn!("No fields to display");
        return None;
    }
    let mut table = TextTable::new(DICTIONARY_COLUMNS);
    for field in fields {
        table.push_row(field.cells());
    }
    Some(table)
}

pub fn write_dictionary<W: Write>(
    fields: &[DictionaryField],
    sink: &mut W,
) -> Result<(), DictionaryError> {
    let Some(table) = format_dictionary(fields) else {
        return Ok(());
    };
    for line in table.lines() {
        writeln!(sink, "{line}")?;
    }
    sink.flush()?;
    Ok(())
}

/// Appends the table to `path`, creating the file and its parents as needed.
pub fn save_dictionary(fields: &[DictionaryField], path: &Path) -> Result<(), DictionaryError> {
    if fields.is_empty() {
        warn!("No fields to display");
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write_dictionary(fields, &mut file)?;
    info!("Saved dictionary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn field(name: &str, data_type: &str) -> DictionaryField {
        serde_json::from_value(json!({
            "fieldName": name,
            "dataType": data_type,
            "forwardIndexed": true,
            "reverseIndexed": false,
            "Types": ["Text"],
            "Descriptions": [],
            "indexOnly": false,
            "normalized": true,
            "tokenized": false,
            "lastUpdated": "20240101"
        }))
        .expect("field should parse")
    }

    #[test]
    fn cells_follow_column_order() {
        let cells = field("GENRES", "movie").cells();
        assert_eq!(
            cells,
            [
                "GENRES", "movie", "true", "false", r#"["Text"]"#, "false", "true", "false", "[]",
                "20240101",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn empty_field_list_formats_to_nothing() {
        assert!(format_dictionary(&[]).is_none());

        let mut sink = Vec::new();
        write_dictionary(&[], &mut sink).expect("write should succeed");
        assert!(sink.is_empty());
    }

    #[test]
    fn columns_pad_to_widest_value() {
        let table = format_dictionary(&[field("A_VERY_LONG_FIELD_NAME", "x")])
            .expect("table should exist");
        let lines = table.lines();

        assert!(lines[0].starts_with("name                  |Data Type|"));
        assert!(lines[1].starts_with("----------------------|---------|"));
        assert!(lines[2].starts_with("A_VERY_LONG_FIELD_NAME|x        |"));
    }

    #[test]
    fn unparseable_body_is_a_request_failure() {
        assert!(matches!(
            parse_dictionary("<html>"),
            Err(DictionaryError::RequestFailed { .. })
        ));
        assert!(matches!(
            parse_dictionary(r#"{"Other": []}"#),
            Err(DictionaryError::RequestFailed { .. })
        ));
    }
}
