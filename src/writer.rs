//! Serializes the collected records to a delimited file.
//!
//! The header row is the field order of [`AppRecord`] itself, so rows can
//! never disagree with the header. A locked or unwritable destination comes
//! back as a typed error; this module never prompts or blocks on input.

use std::fs::File;
use std::path::Path;

use csv::WriterBuilder;
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::record::AppRecord;

#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(usize),
    /// Empty input: nothing is created or modified.
    NothingToWrite,
}

/// Writes all records to `path`. The extension picks the delimiter: `.tsv`
/// and `.txt` get tabs, everything else commas.
pub fn write_records(path: &Path, records: &[AppRecord]) -> Result<WriteOutcome> {
    if records.is_empty() {
        warn!("nothing to write to file, no data scraped");
        return Ok(WriteOutcome::NothingToWrite);
    }

    let file = File::create(path).map_err(|source| ScrapeError::DestinationLocked {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("wrote {} records to {}", records.len(), path.display());
    Ok(WriteOutcome::Written(records.len()))
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    }
}
