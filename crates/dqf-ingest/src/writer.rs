//! CSV output for cleaned datasets.

use std::io::Write;
use std::path::Path;

use tracing::info;

use dqf_model::Table;

use crate::error::{IngestError, Result};

/// Writes `table` as comma separated UTF-8 with a header row.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    write_table_to(file, table).map_err(|source| IngestError::CsvWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows = table.height(), "wrote cleaned dataset");
    Ok(())
}

pub fn write_table_to<W: Write>(writer: W, table: &Table) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
