//! Tab-delimited rendering of a result set
//!
//! Columns follow the dataset's field order from the catalog, not the key
//! order inside each record.

use crate::dremio::error::{DremioError, Result};
use crate::dremio::models::Record;
use serde_json::Value;
use std::io::Write;

/// Text for one cell
///
/// Strings verbatim, null as `None`, booleans as `True`/`False`, numbers
/// and nested values as compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

/// Render header plus records; every line ends with '\n'
pub fn format_tab_delimited(fields: &[String], records: &[Record]) -> Result<String> {
    let mut out = String::new();
    out.push_str(&fields.join("\t"));
    out.push('\n');

    for (index, record) in records.iter().enumerate() {
        let cells = fields
            .iter()
            .map(|field| {
                record
                    .get(field)
                    .map(cell_text)
                    .ok_or_else(|| DremioError::MissingField {
                        record: index,
                        field: field.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    Ok(out)
}

/// Render into `writer`; nothing is written if any record is incomplete
pub fn write_tab_delimited<W: Write>(
    writer: &mut W,
    fields: &[String],
    records: &[Record],
) -> Result<()> {
    let text = format_tab_delimited(fields, records)?;
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|source| DremioError::Io {
            path: "<stdout>".into(),
            source,
        })
}
