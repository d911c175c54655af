//! CSV aggregation of extracted records.
//!
//! Columns come from the field definitions, in definition order, so the
//! report matches the prompt and the downstream billing import byte for
//! byte. Fields the model omitted (or returned null) become empty cells.

use crate::error::ChartsplitError;
use crate::extract::fields::FieldDef;
use crate::output::ExtractedRecord;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Write all records to `path` as CSV.
pub fn write_csv(
    records: &[ExtractedRecord],
    fields: &[FieldDef],
    path: &Path,
) -> Result<(), ChartsplitError> {
    let io_err = |detail: String| ChartsplitError::ReportWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(e.to_string()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(e.to_string()))?;

    let headers: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    writer
        .write_record(&headers)
        .map_err(|e| io_err(e.to_string()))?;

    for record in records {
        let row: Vec<String> = fields
            .iter()
            .map(|field| cell_value(record.values.get(&field.name)))
            .collect();
        writer.write_record(&row).map_err(|e| io_err(e.to_string()))?;
    }

    writer.flush().map_err(|e| io_err(e.to_string()))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Render one JSON value as a CSV cell.
///
/// Strings are written verbatim (cleanup already happened at parse time);
/// numbers and booleans via their canonical form; missing/null as empty.
fn cell_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> ExtractedRecord {
        ExtractedRecord {
            source_file: "chart_section_01_pages_1-2.pdf".into(),
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            retries: 0,
        }
    }

    fn fields(names: &[&str]) -> Vec<FieldDef> {
        names
            .iter()
            .map(|n| FieldDef {
                name: n.to_string(),
                description: String::new(),
                location: String::new(),
                output_format: String::new(),
            })
            .collect()
    }

    #[test]
    fn csv_columns_follow_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![record(&[
            ("MRN", Value::String("00123".into())),
            ("Patient Name", Value::String("DOE, JOHN A".into())),
        ])];
        write_csv(&records, &fields(&["Patient Name", "MRN"]), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next().unwrap(), "Patient Name,MRN");
        assert_eq!(lines.next().unwrap(), "\"DOE, JOHN A\",00123");
    }

    #[test]
    fn missing_fields_become_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![record(&[("MRN", Value::String("42".into()))])];
        write_csv(&records, &fields(&["Patient Name", "MRN", "Zip"]), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.lines().nth(1).unwrap() == ",42,");
    }

    #[test]
    fn numeric_values_are_written_plainly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![record(&[("Copay", Value::from(25))])];
        write_csv(&records, &fields(&["Copay"]), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().nth(1).unwrap(), "25");
    }

    #[test]
    fn unwritable_path_errors() {
        let records = vec![record(&[])];
        let err = write_csv(
            &records,
            &fields(&["A"]),
            Path::new("/proc/definitely/not/writable/out.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, ChartsplitError::ReportWriteFailed { .. }));
    }
}
