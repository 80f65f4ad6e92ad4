//! CSV reading with delimiter sniffing.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use dqf_model::Table;

use crate::decode::{TextEncoding, decode_bytes, utf16_bom};
use crate::error::{IngestError, Result};

const CANDIDATES: &[u8] = b",;\t|";

/// Lines inspected when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// A decoded input table and how it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvSource {
    pub table: Table,
    pub delimiter: u8,
    pub encoding: TextEncoding,
}

/// Reads a CSV file, sniffing its delimiter.
pub fn read_table(path: &Path) -> Result<CsvSource> {
    read_table_with(path, None)
}

/// Reads a CSV file with an explicit delimiter, or a sniffed one when `None`.
pub fn read_table_with(path: &Path, delimiter: Option<u8>) -> Result<CsvSource> {
    let bytes = fs::read(path).map_err(|err| IngestError::read(path, err))?;
    if let Some(encoding) = utf16_bom(&bytes) {
        return Err(IngestError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding,
        });
    }
    let (text, encoding) = decode_bytes(&bytes);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&text));
    let table = parse_table(&text, delimiter).map_err(|err| match err {
        ParseError::Empty => IngestError::EmptyCsv {
            path: path.to_path_buf(),
        },
        ParseError::Csv(source) => IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        },
    })?;
    info!(
        path = %path.display(),
        encoding = %encoding,
        delimiter = %char::from(delimiter).escape_default(),
        columns = table.width(),
        rows = table.height(),
        "read raw dataset"
    );
    Ok(CsvSource {
        table,
        delimiter,
        encoding,
    })
}

/// Failure to parse decoded CSV text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no header row")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Parses decoded text. The first record is the header row; short rows are
/// padded with empty cells.
pub fn parse_table(text: &str, delimiter: u8) -> std::result::Result<Table, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(ParseError::Csv)?,
        None => return Err(ParseError::Empty),
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("unnamed_{}", index + 1)
            } else {
                name.to_string()
            }
        })
        .collect();

    let width = columns.len();
    let mut table = Table::new(columns);
    for (line, record) in records.enumerate() {
        let record = record.map_err(ParseError::Csv)?;
        // Blank line; rows of empty cells are still rows.
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        if record.len() > width {
            warn!(row = line, fields = record.len(), width, "row wider than header, extra cells dropped");
        }
        table.push_row(record.iter().map(str::to_string).collect());
    }
    debug!(columns = table.width(), rows = table.height(), "parsed CSV text");
    Ok(table)
}

/// Picks the candidate delimiter that splits the first lines most
/// consistently; comma when nothing splits.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let mut best = (false, 0usize, b',');
    for &candidate in CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect();
        let Some(&first) = counts.first() else {
            break;
        };
        if first == 0 {
            continue;
        }
        let consistent = counts.iter().all(|&count| count == first);
        if (consistent, first) > (best.0, best.1) {
            best = (consistent, first, candidate);
        }
    }
    best.2
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            quoted = !quoted;
        } else if byte == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1,5;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b\n1|2\n"), b'|');
        assert_eq!(sniff_delimiter("single\nvalue\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        assert_eq!(sniff_delimiter("name;city\n\"Rao, Asha\";Pune\n"), b';');
    }

    #[test]
    fn pads_ragged_rows() {
        let table = parse_table("a,b,c\n1,2\n\n4,5,6\n", b',').expect("parse");
        assert_eq!(table.rows, vec![vec!["1", "2", ""], vec!["4", "5", "6"]]);
    }

    #[test]
    fn rows_of_empty_cells_are_kept() {
        let table = parse_table("a,b,c\n1,2,3\n,,\n  \n4,5,6\n", b',').expect("parse");
        assert_eq!(table.height(), 3);
        assert_eq!(table.rows[1], ["", "", ""]);
        assert_eq!(table.rows[2], ["4", "5", "6"]);
    }

    #[test]
    fn names_blank_headers() {
        let table = parse_table(" id ,,x\n1,2,3\n", b',').expect("parse");
        assert_eq!(table.columns, ["id", "unnamed_2", "x"]);
    }

    #[test]
    fn empty_text_has_no_header() {
        assert!(matches!(parse_table("", b','), Err(ParseError::Empty)));
    }
}
