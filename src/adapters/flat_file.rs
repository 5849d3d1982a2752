use crate::core::normalizer::parse_number;
use crate::domain::model::{Field, FieldKind, NormalizedRecord, ResultSet, Value};
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::path::Path;

/// Writes the result set as CSV with a header row, replacing any existing file.
pub fn write_flat_file(result: &ResultSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(result.fields().iter().map(|f| f.name.as_str()))?;
    for record in result.records() {
        writer.write_record(record.values().iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} records to {}", result.len(), path.display());
    Ok(())
}

/// Reads back a file produced by [`write_flat_file`] using `schema` for typing.
pub fn read_flat_file(path: &Path, schema: &[Field]) -> Result<ResultSet> {
    let mut reader = csv::Reader::from_path(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let expected: Vec<&str> = schema.iter().map(|f| f.name.as_str()).collect();
    if header != expected {
        return Err(EtlError::parse(format!(
            "flat file header {:?} does not match schema {:?}",
            header, expected
        )));
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let values = schema
            .iter()
            .zip(row.iter())
            .map(|(field, text)| match field.kind {
                FieldKind::Text => Ok(Value::Text(text.to_string())),
                FieldKind::Real => parse_number(text).map(Value::Real).ok_or_else(|| {
                    EtlError::MalformedNumberError {
                        field: field.name.clone(),
                        value: text.to_string(),
                        record: index,
                    }
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        records.push(NormalizedRecord::new(values));
    }

    ResultSet::new(schema.to_vec(), records)
}
