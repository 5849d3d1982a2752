use crate::domain::model::{Cell, CellKind, Document, Row, Table};
use crate::utils::error::{EtlError, Result};
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| EtlError::parse(format!("invalid selector '{}': {:?}", css, e)))
}

/// Parses markup into the table/row/cell model, tables in document order.
///
/// A table only owns the rows whose nearest enclosing `<table>` is itself, so
/// nested tables never leak rows into their parent.
pub fn parse_document(markup: &str) -> Result<Document> {
    let html = Html::parse_document(markup);
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;
    let link_selector = selector("a")?;

    let tables: Vec<Table> = html
        .select(&table_selector)
        .map(|table| {
            let rows = table
                .select(&row_selector)
                .filter(|row| owning_table(row) == Some(table))
                .map(|row| parse_row(row, &link_selector))
                .collect();
            Table::new(rows)
        })
        .collect();

    tracing::debug!("Parsed document with {} tables", tables.len());
    Ok(Document { tables })
}

fn owning_table<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn parse_row(row: ElementRef, link_selector: &Selector) -> Row {
    let cells = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| {
            let kind = match cell.value().name() {
                "td" => CellKind::Data,
                "th" => CellKind::Header,
                _ => return None,
            };
            Some(parse_cell(cell, kind, link_selector))
        })
        .collect();
    Row::new(cells)
}

fn parse_cell(cell: ElementRef, kind: CellKind, link_selector: &Selector) -> Cell {
    let first_text = cell
        .children()
        .filter_map(|node| node.value().as_text().map(|t| String::from(&**t)))
        .find(|t| !t.trim().is_empty());

    let links = cell
        .select(link_selector)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Cell {
        kind,
        text: cell.text().collect(),
        first_text,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
  <table id="nav"><tr><td><a href="/">Home</a></td></tr></table>
  <table class="wikitable">
    <tbody>
      <tr><th>Rank</th><th>Bank name</th><th>Market cap (US$ billion)</th></tr>
      <tr><td>1</td><td><span class="flagicon"><a href="/f"><img src="us.png"></a></span> <a href="/jpm">JPMorgan Chase</a></td><td>432.92
</td></tr>
      <tr><td>2</td><td><a href="/boa">Bank of America</a></td><td>231.52<sup>[1]</sup></td></tr>
    </tbody>
  </table>
</body></html>
"#;

    #[test]
    fn test_parse_tables_in_document_order() {
        let doc = parse_document(PAGE).unwrap();
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].rows.len(), 1);
        assert_eq!(doc.tables[1].rows.len(), 3);
        assert_eq!(doc.tables[1].data_width(), 3);
    }

    #[test]
    fn test_header_and_data_cells_are_distinguished() {
        let doc = parse_document(PAGE).unwrap();
        let header = &doc.tables[1].rows[0];
        assert!(header.cells.iter().all(|c| c.kind == CellKind::Header));
        assert!(header.data_cells().is_empty());
    }

    #[test]
    fn test_links_skip_image_only_anchors() {
        let doc = parse_document(PAGE).unwrap();
        let bank_cell = &doc.tables[1].rows[1].cells[1];
        assert_eq!(bank_cell.links, vec!["JPMorgan Chase".to_string()]);
        assert_eq!(bank_cell.text.trim(), "JPMorgan Chase");
    }

    #[test]
    fn test_first_text_stops_before_footnote() {
        let doc = parse_document(PAGE).unwrap();
        let value_cell = &doc.tables[1].rows[2].cells[2];
        assert_eq!(value_cell.first_text.as_deref(), Some("231.52"));
        assert_eq!(value_cell.text, "231.52[1]");
    }

    #[test]
    fn test_nested_table_rows_stay_with_their_table() {
        let markup = r#"
<table>
  <tr><td>outer<table><tr><td>inner 1</td></tr><tr><td>inner 2</td></tr></table></td></tr>
  <tr><td>outer 2</td></tr>
</table>"#;
        let doc = parse_document(markup).unwrap();
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].rows.len(), 2);
        assert_eq!(doc.tables[1].rows.len(), 2);
        assert_eq!(doc.tables[1].rows[0].cells[0].text, "inner 1");
    }

    #[test]
    fn test_page_without_tables() {
        let doc = parse_document("<p>nothing here</p>").unwrap();
        assert!(doc.tables.is_empty());
    }
}
