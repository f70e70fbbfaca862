// src/table/mod.rs
pub mod schema;
pub mod source;
pub mod utils;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use tracing::debug;

pub use schema::{BoundRow, BoundTable, Field, TableId, TableSchema};
pub use source::{DirSource, HttpSource, MemorySource, TableSource};
pub use utils::clean_str;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names, from the first non-blank line.
    pub headers: Vec<String>,
    /// Each data row, as a Vec of Strings (one per header).
    pub rows: Vec<Vec<String>>,
    /// Rows skipped because their field count did not match the headers.
    pub dropped: usize,
}

impl RawTable {
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Parse delimited text into a [`RawTable`].
///
/// - Any line ending (`\n`, `\r\n`, `\r`) is accepted and blank lines are skipped.
/// - The first remaining line is the header row; a leading UTF-8 BOM is stripped.
/// - Commas inside a double-quoted span never split a field, wherever the span
///   starts: `a, "b, c",d` and `a,x "b, c" y,d` both have three fields. An
///   unterminated quote runs to the end of the line.
/// - Every field is trimmed and loses its surrounding quotes.
/// - Rows whose field count differs from the header count are dropped, not reported.
pub fn parse_table(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    // Quotes are resolved by `join_quoted` below; the reader only splits on commas.
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // keep this so short/long rows reach the count check below
        .quoting(false)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let mut table = RawTable::default();
    let mut have_headers = false;

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;

        // whitespace-only line
        if record.len() == 1 && record.get(0).map_or(true, |f| f.trim().is_empty()) {
            continue;
        }

        let fields: Vec<String> = join_quoted(record.iter())
            .iter()
            .map(|f| clean_str(f))
            .collect();
        if !have_headers {
            table.headers = fields;
            have_headers = true;
            continue;
        }

        if fields.len() == table.headers.len() {
            table.rows.push(fields);
        } else {
            debug!(
                record = idx,
                expected = table.headers.len(),
                found = fields.len(),
                "dropping malformed row"
            );
            table.dropped += 1;
        }
    }

    Ok(table)
}

/// Re-join comma-split pieces that fall inside an open double-quoted span.
/// A span is open while the field built so far holds an odd number of `"`.
fn join_quoted<'a>(pieces: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let mut open = false;
    for piece in pieces {
        match fields.last_mut() {
            Some(last) if open => {
                last.push(',');
                last.push_str(piece);
            }
            _ => fields.push(piece.to_string()),
        }
        if piece.matches('"').count() % 2 == 1 {
            open = !open;
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_table_quoted_commas() -> Result<()> {
        let content = "Crop,Notes,Yield\n\
                       Tomato,\"Hybrid, high yielding\",2.5\n\
                       Rice, \"Cold tolerant\" ,-\n";
        let table = parse_table(content)?;

        assert_eq!(table.headers, vec!["Crop", "Notes", "Yield"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Tomato", "Hybrid, high yielding", "2.5"]);
        assert_eq!(table.rows[1], vec!["Rice", "Cold tolerant", "-"]);
        assert_eq!(table.dropped, 0);
        Ok(())
    }

    #[test]
    fn test_parse_table_quoted_span_after_space() -> Result<()> {
        let content = "Crop,Notes,Yield\n\
                       Tomato, \"Hybrid, high yielding\",2.5\n\
                       Maize,  \"Early, drought tolerant\"  ,3\n";
        let table = parse_table(content)?;

        assert_eq!(table.dropped, 0);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Tomato", "Hybrid, high yielding", "2.5"]);
        assert_eq!(table.rows[1], vec!["Maize", "Early, drought tolerant", "3"]);
        Ok(())
    }

    #[test]
    fn test_parse_table_quoted_span_inside_field() -> Result<()> {
        let content = "Crop,Notes,Yield\n\
                       Tomato,Hybrid \"a, b\" type,2.5\n\
                       Bean,pole \"x, y\" and \"z, w\",1\n";
        let table = parse_table(content)?;

        assert_eq!(table.dropped, 0);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Tomato", "Hybrid \"a, b\" type", "2.5"]);
        assert_eq!(table.rows[1], vec!["Bean", "pole \"x, y\" and \"z, w\"", "1"]);
        Ok(())
    }

    #[test]
    fn test_parse_table_unterminated_quote_runs_to_line_end() -> Result<()> {
        let content = "Crop,Notes,Yield\nTomato,\"open, never closed,2.5\nRice,ok,1\n";
        let table = parse_table(content)?;

        assert_eq!(table.rows, vec![vec!["Rice", "ok", "1"]]);
        assert_eq!(table.dropped, 1);
        Ok(())
    }

    #[test]
    fn test_parse_table_line_endings_bom_and_blank_lines() -> Result<()> {
        let content = "\u{feff}a,b\r\n1,2\r\n\r\n   \n3,4\r5,6\n\n";
        let table = parse_table(content)?;

        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string(), "4".to_string()],
                vec!["5".to_string(), "6".to_string()],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_table_drops_rows_with_wrong_field_count() -> Result<()> {
        let content = "a,b,c\n1,2,3\n1,2\n1,2,3,4\n\"x,y\",z,w\n";
        let table = parse_table(content)?;

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["x,y", "z", "w"]);
        assert_eq!(table.dropped, 2);
        Ok(())
    }

    #[test]
    fn test_parse_table_empty_input() -> Result<()> {
        let table = parse_table("\n\n")?;
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_fields_survive_reserialization() -> Result<()> {
        let headers = ["Region", "Crop", "Remarks"];
        let rows = vec![
            vec!["मध्य पहाड", "Tomato", "Hybrid, high yielding"],
            vec!["तराई", "Rice", "plain"],
            vec!["उच्च पहाड", "Potato, local", "a, b, c"],
        ];

        let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
        wtr.write_record(headers)?;
        for row in &rows {
            wtr.write_record(row)?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        let text = String::from_utf8(bytes)?;

        let table = parse_table(&text)?;
        assert_eq!(table.headers, headers);
        assert_eq!(table.rows, rows);
        Ok(())
    }

    #[test]
    fn test_column_lookup() -> Result<()> {
        let table = parse_table("Crop,Region\nRice,Terai\n")?;
        assert_eq!(table.column("Region"), Some(1));
        assert_eq!(table.column("Missing"), None);
        Ok(())
    }
}
