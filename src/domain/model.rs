use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A parsed page reduced to what extraction needs: tables in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Header,
    Data,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    /// Concatenated text of the cell and all its descendants.
    pub text: String,
    /// First direct text node of the cell, if any.
    pub first_text: Option<String>,
    /// Texts of the non-empty hyperlinks inside the cell, in document order.
    pub links: Vec<String>,
}

impl Cell {
    pub fn data(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: CellKind::Data,
            first_text: Some(text.clone()),
            text,
            links: Vec::new(),
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Header,
            ..Self::data(text)
        }
    }

    pub fn with_link(mut self, link_text: impl Into<String>) -> Self {
        self.links.push(link_text.into());
        self
    }

    pub fn is_data(&self) -> bool {
        self.kind == CellKind::Data
    }
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Data cells only; column offsets index into this view.
    pub fn data_cells(&self) -> Vec<&Cell> {
        self.cells.iter().filter(|c| c.is_data()).collect()
    }
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Widest row, counted in data cells.
    pub fn data_width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.iter().filter(|c| c.is_data()).count())
            .max()
            .unwrap_or(0)
    }
}

/// Positional rule for picking one table off a page.
///
/// Both variants break when the page is restructured; a miss is reported,
/// never papered over with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum TableSelector {
    /// The Nth table in document order, zero-based.
    Index { index: usize },
    /// The first table whose widest row has exactly `columns` data cells.
    Shape {
        columns: usize,
        #[serde(default)]
        min_rows: Option<usize>,
    },
}

impl fmt::Display for TableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelector::Index { index } => write!(f, "table #{}", index),
            TableSelector::Shape { columns, min_rows } => match min_rows {
                Some(rows) => write!(f, "first table with {} columns and >= {} rows", columns, rows),
                None => write!(f, "first table with {} columns", columns),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRule {
    /// Trimmed text content of the whole cell.
    #[default]
    Text,
    /// Text of the first hyperlink in the cell.
    FirstLink,
    /// First direct text node, ignoring trailing markup such as footnotes.
    FirstText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Offset among the row's data cells.
    pub cell: usize,
    #[serde(default)]
    pub rule: CellRule,
    #[serde(default)]
    pub numeric: bool,
}

impl ColumnDef {
    pub fn text(name: &str, cell: usize) -> Self {
        Self {
            name: name.to_string(),
            cell,
            rule: CellRule::Text,
            numeric: false,
        }
    }

    pub fn numeric(name: &str, cell: usize) -> Self {
        Self {
            numeric: true,
            ..Self::text(name, cell)
        }
    }

    pub fn with_rule(mut self, rule: CellRule) -> Self {
        self.rule = rule;
        self
    }
}

/// Ordered output fields; validated once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    columns: Vec<ColumnDef>,
}

impl ColumnSpec {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(EtlError::config("column spec must define at least one column"));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(EtlError::config("column names cannot be empty"));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(EtlError::config(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.numeric)
            .map(|c| c.name.as_str())
    }

    /// Number of data cells a row needs to satisfy every column.
    pub fn required_cells(&self) -> usize {
        self.columns.iter().map(|c| c.cell + 1).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One valid source row as text, fields in `ColumnSpec` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Real,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Real,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Real(f64),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Text(_) => FieldKind::Text,
            Value::Real(_) => FieldKind::Real,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Real(v) => write!(f, "{:.2}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    values: Vec<Value>,
}

impl NormalizedRecord {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// The output of one run: a fixed schema and rows that conform to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    fields: Vec<Field>,
    records: Vec<NormalizedRecord>,
}

impl ResultSet {
    pub fn new(fields: Vec<Field>, records: Vec<NormalizedRecord>) -> Result<Self> {
        for (index, record) in records.iter().enumerate() {
            if record.values.len() != fields.len() {
                return Err(EtlError::parse(format!(
                    "record {} has {} values, schema has {} fields",
                    index,
                    record.values.len(),
                    fields.len()
                )));
            }
            for (field, value) in fields.iter().zip(&record.values) {
                if field.kind != value.kind() {
                    return Err(EtlError::parse(format!(
                        "record {} field '{}' is {:?}, expected {:?}",
                        index,
                        field.name,
                        value.kind(),
                        field.kind
                    )));
                }
            }
        }
        Ok(Self { fields, records })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn value(&self, record: usize, field: &str) -> Option<&Value> {
        let index = self.field_index(field)?;
        self.records.get(record)?.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
