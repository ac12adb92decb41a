//! Console rendering and durable JSON artifacts for query results.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use datawave_rawdata::{decode_base64, ParquetTable};
use serde_json::Value;
use tempfile::{Builder, NamedTempFile};
use tracing::{error, info, warn};

use crate::domain::{NormalizedRecord, QueryResults};
use crate::OutputError;

/// Marker in a field name for base64-encoded Parquet payloads.
pub const RAW_DATA_MARKER: &str = "RAWDATA";
const RAW_DATA_PLACEHOLDER: &str = "Contains raw data";
const RECORD_SEPARATOR: &str = "----------";
const ORIGIN_FIELD: &str = "ORIG_FILE";
const UNKNOWN_ORIGIN: &str = "unknown_origin";
const DEFAULT_RAW_DATA_STEM: &str = "RAWDATA";

/// Files touched by [`persist`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistReport {
    pub path: PathBuf,
    /// Where a pre-existing artifact was moved to.
    pub renamed: Option<PathBuf>,
    pub raw_data_files: Vec<PathBuf>,
}

pub fn is_raw_data_field(name: &str) -> bool {
    name.contains(RAW_DATA_MARKER)
}

/// Writes every record as `name: value` lines followed by a separator, then
/// the returned-event total.
pub fn print_to_console<W: Write>(
    results: &QueryResults,
    decode_raw: bool,
    sink: &mut W,
) -> Result<(), OutputError> {
    for record in &results.events {
        for (name, value) in record {
            if is_raw_data_field(name) {
                if decode_raw {
                    let table = decode_console_table(name, value)?;
                    writeln!(sink, "{name}: {table}")?;
                } else {
                    writeln!(sink, "{name}: {RAW_DATA_PLACEHOLDER}")?;
                }
            } else {
                writeln!(sink, "{name}: {}", display_value(value))?;
            }
        }
        writeln!(sink, "{RECORD_SEPARATOR}")?;
    }
    writeln!(
        sink,
        "Query returned: {} events.",
        results.metadata.returned_events
    )?;
    sink.flush()?;
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn decode_console_table(name: &str, value: &Value) -> Result<ParquetTable, OutputError> {
    let encoded = first_string(value).unwrap_or_default();
    ParquetTable::from_base64(encoded).map_err(|source| OutputError::RawData {
        field: name.to_string(),
        source,
    })
}

fn first_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text),
        Value::Array(values) => values.first().and_then(Value::as_str),
        _ => None,
    }
}

/// Writes `{"metadata": .., "events": [..]}` to `path`.
///
/// An existing file is first moved aside to `<stem>_old<.ext>`. The artifact
/// is written to a temporary file in the same directory and moved into place,
/// so a failed write never leaves a partial file at `path`. With
/// `decode_raw`, every raw-data field is also written out as a Parquet file
/// under `<parent>/rawdata/`.
pub fn persist(
    results: &QueryResults,
    path: &Path,
    decode_raw: bool,
) -> Result<PersistReport, OutputError> {
    let parent = parent_dir(path);
    fs::create_dir_all(&parent)?;
    info!("Outputting to {}", path.display());

    let renamed = if path.exists() {
        Some(rename_existing(path)?)
    } else {
        None
    };

    let mut temp = staging_file(&parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, results)?;
        writer.flush()?;
    }
    temp.persist(path).map_err(|error| error.error)?;
    info!("Saved output file to {}", path.display());

    let raw_data_files = if decode_raw {
        let files = write_raw_data(&results.events, &parent)?;
        info!("Saved raw data to {}", parent.join("rawdata").display());
        files
    } else {
        Vec::new()
    };

    Ok(PersistReport {
        path: path.to_path_buf(),
        renamed,
        raw_data_files,
    })
}

/// Temporary file beside the artifact, opened the way a plain create would
/// be so the artifact ends up with the usual umask-derived mode.
fn staging_file(parent: &Path) -> io::Result<NamedTempFile<File>> {
    Builder::new()
        .prefix(".dwv-")
        .suffix(".json.tmp")
        .make_in(parent, |path| {
            OpenOptions::new().write(true).create_new(true).open(path)
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `out/results.json` → `out/results_old.json`.
pub fn renamed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(extension) => format!("{stem}_old.{}", extension.to_string_lossy()),
        None => format!("{stem}_old"),
    };
    path.with_file_name(name)
}

fn rename_existing(path: &Path) -> Result<PathBuf, OutputError> {
    let target = renamed_path(path);
    info!("Existing output file exists. Attempting to rename it.");
    fs::rename(path, &target).map_err(|source| rename_failure(path, source))?;
    info!("Existing file renamed to {}", target.display());
    Ok(target)
}

/// Permission failures mean the old artifact is locked or protected; anything
/// else is plain I/O.
fn rename_failure(path: &Path, source: io::Error) -> OutputError {
    if source.kind() == ErrorKind::PermissionDenied {
        error!("Failed to rename old file! Check that it is not in use or otherwise locked!");
        OutputError::PersistRenameFailed {
            path: path.to_path_buf(),
            source,
        }
    } else {
        OutputError::Io(source)
    }
}

fn write_raw_data(records: &[NormalizedRecord], parent: &Path) -> Result<Vec<PathBuf>, OutputError> {
    let mut written = Vec::new();
    for record in records {
        for (name, value) in record {
            if !is_raw_data_field(name) {
                continue;
            }
            let Some(encoded) = first_string(value) else {
                warn!(field = %name, "raw data field is not a string, skipping");
                continue;
            };
            let bytes = decode_base64(encoded).map_err(|source| OutputError::RawData {
                field: name.clone(),
                source,
            })?;

            let target = raw_data_path(parent, record, name);
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&target, bytes)?;
            written.push(target);
        }
    }
    Ok(written)
}

/// `<parent>/rawdata/<origin up to ".json">/<field suffix>.parquet`.
///
/// The result always stays under `<parent>/rawdata/`: the origin keeps only
/// plain path segments and the suffix cannot contain separators.
pub fn raw_data_path(parent: &Path, record: &NormalizedRecord, field: &str) -> PathBuf {
    let origin = match record.first_str(ORIGIN_FIELD) {
        Some(origin) => origin_dir(origin.split(".json").next().unwrap_or(origin)),
        None => {
            warn!(field, "record has no {ORIGIN_FIELD}, using {UNKNOWN_ORIGIN}");
            PathBuf::from(UNKNOWN_ORIGIN)
        }
    };
    let suffix = field.split_once('_').map_or(field, |(_, rest)| rest);

    parent
        .join("rawdata")
        .join(origin)
        .join(format!("{}.parquet", file_stem(suffix)))
}

fn origin_dir(origin: &str) -> PathBuf {
    let dir = Path::new(origin)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment),
            _ => None,
        })
        .collect::<PathBuf>();
    if dir.as_os_str().is_empty() {
        warn!(origin, "{ORIGIN_FIELD} has no usable path segment, using {UNKNOWN_ORIGIN}");
        PathBuf::from(UNKNOWN_ORIGIN)
    } else {
        dir
    }
}

fn file_stem(suffix: &str) -> String {
    let stem = suffix.replace(['/', '\\'], "_");
    match stem.as_str() {
        "" => String::from(DEFAULT_RAW_DATA_STEM),
        "." | ".." => stem.replace('.', "_"),
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renamed_path_inserts_old_before_extension() {
        assert_eq!(
            renamed_path(Path::new("out/results.json")),
            PathBuf::from("out/results_old.json")
        );
        assert_eq!(renamed_path(Path::new("plain")), PathBuf::from("plain_old"));
    }

    #[test]
    fn raw_data_path_uses_origin_and_field_suffix() {
        let record: NormalizedRecord = [
            ("ORIG_FILE", json!(["batch-7.json.gz", "other.json"])),
            ("EVENT_RAWDATA", json!("AAAA")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            raw_data_path(Path::new("out"), &record, "EVENT_RAWDATA"),
            PathBuf::from("out/rawdata/batch-7/RAWDATA.parquet")
        );
    }

    #[test]
    fn raw_data_path_without_origin_falls_back() {
        let record: NormalizedRecord = [("X_RAWDATA", json!("AAAA"))].into_iter().collect();

        assert_eq!(
            raw_data_path(Path::new("out"), &record, "X_RAWDATA"),
            PathBuf::from("out/rawdata/unknown_origin/RAWDATA.parquet")
        );
    }

    #[test]
    fn raw_data_path_stays_under_rawdata() {
        let parent = Path::new("out");
        let rawdata = parent.join("rawdata");

        for (origin, field) in [
            ("../../../escaped.json", "EVENT_RAWDATA"),
            ("/etc/passwd.json", "EVENT_RAWDATA"),
            ("./a/../b.json", "EVENT_../../RAWDATA"),
            ("..", "EVENT_.."),
            ("src/batch.json", "EVENT_a/b"),
        ] {
            let record: NormalizedRecord = [("ORIG_FILE", json!(origin))].into_iter().collect();
            let target = raw_data_path(parent, &record, field);

            assert!(target.starts_with(&rawdata), "{target:?} escaped {rawdata:?}");
            assert!(
                !target.components().any(|c| matches!(c, Component::ParentDir)),
                "{target:?} contains .."
            );
        }
    }

    #[test]
    fn raw_data_path_cleans_origin_and_suffix() {
        let record: NormalizedRecord = [("ORIG_FILE", json!("../../../escaped.json"))]
            .into_iter()
            .collect();
        assert_eq!(
            raw_data_path(Path::new("out"), &record, "EVENT_a/b"),
            PathBuf::from("out/rawdata/escaped/a_b.parquet")
        );

        let record: NormalizedRecord = [("ORIG_FILE", json!("../.."))].into_iter().collect();
        assert_eq!(
            raw_data_path(Path::new("out"), &record, "EVENT_.."),
            PathBuf::from("out/rawdata/unknown_origin/__.parquet")
        );
    }

    #[test]
    fn permission_denied_rename_is_a_rename_failure() {
        let path = Path::new("out/results.json");

        let locked = rename_failure(path, io::Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(
            locked,
            OutputError::PersistRenameFailed { path: ref failed, .. } if failed == path
        ));

        let missing = rename_failure(path, io::Error::from(ErrorKind::NotFound));
        assert!(matches!(missing, OutputError::Io(ref source) if source.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn non_string_values_render_as_json() {
        assert_eq!(display_value(&json!("text")), "text");
        assert_eq!(display_value(&json!(["a", "b"])), r#"["a","b"]"#);
        assert_eq!(display_value(&json!(42)), "42");
    }
}
