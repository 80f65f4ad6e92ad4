//! Raw dataset input and cleaned dataset output.
//!
//! [`read_table`] decodes a CSV file of unknown provenance: UTF-8 with or
//! without a byte order mark, falling back to Latin-1, with the delimiter
//! sniffed among `,` `;` tab and `|`. [`write_table`] writes a canonical table
//! back as comma separated UTF-8.

mod decode;
mod error;
mod reader;
mod writer;

pub use decode::{TextEncoding, decode_bytes};
pub use error::{IngestError, Result};
pub use reader::{CsvSource, ParseError, parse_table, read_table, read_table_with, sniff_delimiter};
pub use writer::{write_table, write_table_to};
