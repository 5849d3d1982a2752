use crate::domain::model::{Cell, CellRule, ColumnDef, ColumnSpec, RawRecord, Table};
use crate::utils::error::{EtlError, Result};
use std::collections::BTreeMap;

/// Characters removed from numeric text before parsing.
pub const THOUSANDS_SEPARATORS: &[char] = &[',', '\u{2009}', '\u{202f}'];

/// Row-level validity rules applied on top of the column layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub skip_header: bool,
    pub missing_sentinel: Option<String>,
    /// Fields checked against the sentinel. Empty means every numeric column.
    pub sentinel_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DropReason {
    TooFewCells,
    MissingLink,
    MissingData,
}

impl DropReason {
    fn as_str(&self) -> &'static str {
        match self {
            DropReason::TooFewCells => "too few cells",
            DropReason::MissingLink => "no link in cell",
            DropReason::MissingData => "missing-data sentinel",
        }
    }
}

pub fn strip_thousands_separators(text: &str) -> String {
    text.chars()
        .filter(|c| !THOUSANDS_SEPARATORS.contains(c))
        .collect()
}

/// Turns the rows of a located table into text records shaped by `spec`.
///
/// Rows that fail a validity rule are dropped, never coerced. Drops are logged
/// per row at debug level and summarized at info level.
pub fn extract(table: &Table, spec: &ColumnSpec, filter: &RowFilter) -> Result<Vec<RawRecord>> {
    let skip = usize::from(filter.skip_header);
    let data_rows = table.rows.len().saturating_sub(skip);
    if data_rows == 0 {
        return Err(EtlError::parse("located table has no data rows"));
    }

    let required = spec.required_cells();
    let sentinel_fields: Vec<&str> = if filter.sentinel_fields.is_empty() {
        spec.numeric_names().collect()
    } else {
        filter.sentinel_fields.iter().map(String::as_str).collect()
    };

    let mut records = Vec::with_capacity(data_rows);
    let mut dropped: BTreeMap<DropReason, usize> = BTreeMap::new();
    let mut well_formed = 0usize;

    for (index, row) in table.rows.iter().enumerate().skip(skip) {
        let cells = row.data_cells();
        if cells.len() < required {
            tracing::debug!(
                "Dropping row {}: {} ({} of {})",
                index,
                DropReason::TooFewCells.as_str(),
                cells.len(),
                required
            );
            *dropped.entry(DropReason::TooFewCells).or_default() += 1;
            continue;
        }
        well_formed += 1;

        match extract_row(&cells, spec, filter.missing_sentinel.as_deref(), &sentinel_fields) {
            Ok(record) => records.push(record),
            Err((reason, field)) => {
                tracing::debug!("Dropping row {}: {} in '{}'", index, reason.as_str(), field);
                *dropped.entry(reason).or_default() += 1;
            }
        }
    }

    if well_formed == 0 {
        return Err(EtlError::parse(format!(
            "no row in the located table has the {} cells the column layout needs",
            required
        )));
    }

    if !dropped.is_empty() {
        let summary: Vec<String> = dropped
            .iter()
            .map(|(reason, count)| format!("{} {}", count, reason.as_str()))
            .collect();
        tracing::info!("Dropped rows: {}", summary.join(", "));
    }
    tracing::info!("Extracted {} records from {} data rows", records.len(), data_rows);

    Ok(records)
}

fn extract_row<'a>(
    cells: &[&Cell],
    spec: &'a ColumnSpec,
    sentinel: Option<&str>,
    sentinel_fields: &[&str],
) -> std::result::Result<RawRecord, (DropReason, &'a str)> {
    let mut fields = Vec::with_capacity(spec.len());

    for column in spec.columns() {
        let text = cell_text(cells[column.cell], column)
            .ok_or((DropReason::MissingLink, column.name.as_str()))?;

        if sentinel == Some(text.as_str()) && sentinel_fields.contains(&column.name.as_str()) {
            return Err((DropReason::MissingData, column.name.as_str()));
        }

        let text = if column.numeric {
            strip_thousands_separators(&text)
        } else {
            text
        };
        fields.push((column.name.clone(), text));
    }

    Ok(RawRecord::new(fields))
}

fn cell_text(cell: &Cell, column: &ColumnDef) -> Option<String> {
    match column.rule {
        CellRule::Text => Some(cell.text.trim().to_string()),
        CellRule::FirstLink => cell.links.first().map(|link| link.trim().to_string()),
        CellRule::FirstText => Some(
            cell.first_text
                .as_deref()
                .unwrap_or(&cell.text)
                .trim()
                .to_string(),
        ),
    }
}
