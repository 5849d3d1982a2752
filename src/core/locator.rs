use crate::domain::model::{Document, Table, TableSelector};
use crate::utils::error::{EtlError, Result};

/// Picks the table the pipeline reads. A miss is fatal for the run.
pub fn locate<'a>(document: &'a Document, selector: &TableSelector) -> Result<&'a Table> {
    let found = match selector {
        TableSelector::Index { index } => document.tables.get(*index),
        TableSelector::Shape { columns, min_rows } => document.tables.iter().find(|table| {
            table.data_width() == *columns
                && min_rows.map_or(true, |rows| table.rows.len() >= rows)
        }),
    };

    match found {
        Some(table) => {
            tracing::debug!(
                "Located {} ({} rows, {} columns)",
                selector,
                table.rows.len(),
                table.data_width()
            );
            Ok(table)
        }
        None => Err(EtlError::NotFoundError {
            message: format!(
                "no match for {} among {} tables on the page",
                selector,
                document.tables.len()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Cell, Row};

    fn table(width: usize, rows: usize) -> Table {
        Table::new(
            (0..rows)
                .map(|r| Row::new((0..width).map(|c| Cell::data(format!("{}-{}", r, c))).collect()))
                .collect(),
        )
    }

    #[test]
    fn test_locate_by_index() {
        let doc = Document {
            tables: vec![table(1, 1), table(2, 2), table(3, 3)],
        };
        let found = locate(&doc, &TableSelector::Index { index: 2 }).unwrap();
        assert_eq!(found.rows.len(), 3);
    }

    #[test]
    fn test_locate_index_past_end_is_not_found() {
        let doc = Document {
            tables: vec![table(1, 1), table(2, 2)],
        };
        let err = locate(&doc, &TableSelector::Index { index: 2 }).unwrap_err();
        assert!(matches!(err, EtlError::NotFoundError { .. }));
        assert!(err.to_string().contains("2 tables"));
    }

    #[test]
    fn test_locate_by_shape_takes_first_match() {
        let doc = Document {
            tables: vec![table(2, 1), table(3, 1), table(3, 10)],
        };
        let first = locate(
            &doc,
            &TableSelector::Shape {
                columns: 3,
                min_rows: None,
            },
        )
        .unwrap();
        assert_eq!(first.rows.len(), 1);

        let bigger = locate(
            &doc,
            &TableSelector::Shape {
                columns: 3,
                min_rows: Some(5),
            },
        )
        .unwrap();
        assert_eq!(bigger.rows.len(), 10);
    }

    #[test]
    fn test_locate_shape_ignores_header_cells() {
        let mut with_header = table(2, 2);
        with_header
            .rows
            .insert(0, Row::new(vec![Cell::header("a"), Cell::header("b"), Cell::header("c")]));
        let doc = Document {
            tables: vec![with_header],
        };
        let err = locate(
            &doc,
            &TableSelector::Shape {
                columns: 3,
                min_rows: None,
            },
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_locate_on_empty_document() {
        let err = locate(&Document::default(), &TableSelector::Index { index: 0 }).unwrap_err();
        assert!(matches!(err, EtlError::NotFoundError { .. }));
    }
}
