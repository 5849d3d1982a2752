use crate::domain::model::{FieldKind, ResultSet, Value};
use crate::utils::error::{EtlError, Result};
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::{params_from_iter, Connection, ToSql};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::path::Path;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Real(v) => ToSqlOutput::from(*v),
        })
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Rows returned by an ad-hoc query, with their column names.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&SqlValue>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> JsonValue {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, JsonValue> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), sql_to_json(value)))
                    .collect();
                JsonValue::Object(object)
            })
            .collect();
        JsonValue::Array(rows)
    }
}

fn sql_to_json(value: &SqlValue) -> JsonValue {
    match value {
        SqlValue::Null => JsonValue::Null,
        SqlValue::Integer(i) => JsonValue::from(*i),
        SqlValue::Real(f) => JsonValue::from(*f),
        SqlValue::Text(s) => JsonValue::from(s.as_str()),
        SqlValue::Blob(b) => JsonValue::from(format!("<{} bytes>", b.len())),
    }
}

fn display_sql(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn write_padded(f: &mut fmt::Formatter<'_>, values: &[String], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", value, width = *width))
        .collect();
    writeln!(f, "{}", padded.join("  ").trim_end())
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(display_sql).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_padded(f, &self.columns, &widths)?;
        for row in &cells {
            write_padded(f, row, &widths)?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

/// A SQLite connection scoped to one run.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replaces `table_name` with one row per record.
    pub fn write_table(&self, result: &ResultSet, table_name: &str) -> Result<()> {
        if result.fields().is_empty() {
            return Err(EtlError::SinkError {
                message: format!("cannot create table '{}' without columns", table_name),
            });
        }

        let table = quote_identifier(table_name);
        let columns: Vec<String> = result
            .fields()
            .iter()
            .map(|field| {
                let sql_type = match field.kind {
                    FieldKind::Text => "TEXT",
                    FieldKind::Real => "REAL",
                };
                format!("{} {}", quote_identifier(&field.name), sql_type)
            })
            .collect();

        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} ({});",
            columns.join(", ")
        ))?;

        let placeholders: Vec<String> = (1..=result.fields().len())
            .map(|i| format!("?{}", i))
            .collect();
        let mut insert = self.conn.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            table,
            placeholders.join(", ")
        ))?;
        for record in result.records() {
            insert.execute(params_from_iter(record.values()))?;
        }

        tracing::debug!("Loaded {} rows into {}", result.len(), table_name);
        Ok(())
    }

    /// Runs one statement and collects every row it returns.
    pub fn query(&self, sql: &str) -> Result<QueryOutput> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut output = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            output.push(values);
        }

        Ok(QueryOutput {
            columns,
            rows: output,
        })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| EtlError::from(e))
    }
}
