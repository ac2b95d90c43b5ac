//! CSV encoders for report downloads.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{AnalyticsError, Result};

/// A report row type with a fixed column schema. Column names must match the
/// serialized field names.
pub trait ReportRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

fn to_object<T: Serialize>(row: &T) -> Result<Map<String, Value>> {
    let object = match serde_json::to_value(row)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    Ok(object)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(nested) => nested.to_string(),
    }
}

fn write_table(columns: &[&str], objects: &[Map<String, Value>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;

    for object in objects {
        writer.write_record(columns.iter().map(|column| cell(object.get(*column))))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AnalyticsError::Io(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Encodes rows whose keys may differ. Columns are the union of every row's
/// keys in first-seen order; zero rows (or rows without keys) give an empty
/// payload.
pub fn encode_rows<T: Serialize>(rows: &[T]) -> Result<String> {
    let objects: Vec<Map<String, Value>> = rows.iter().map(to_object).collect::<Result<_>>()?;

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    if columns.is_empty() {
        return Ok(String::new());
    }
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    write_table(&columns, &objects)
}

/// Encodes typed report rows against their declared schema. Always writes the
/// header, even for zero rows.
pub fn encode_report<T: ReportRow>(rows: &[T]) -> Result<String> {
    let objects: Vec<Map<String, Value>> = rows.iter().map(to_object).collect::<Result<_>>()?;
    write_table(T::COLUMNS, &objects)
}

pub fn export_file_name(kind: &str, date: NaiveDate) -> String {
    format!("{kind}-reports-{}.csv", date.format("%Y-%m-%d"))
}

pub fn write_export(dir: &Path, kind: &str, date: NaiveDate, payload: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(kind, date));
    fs::write(&path, payload)?;
    info!(path = %path.display(), bytes = payload.len(), "wrote export");
    Ok(path)
}
