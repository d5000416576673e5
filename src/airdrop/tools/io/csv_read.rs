use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, instrument};

use crate::airdrop::tools::amount::parse_amount;
use crate::airdrop::tools::error::{Result, ToolError};
use crate::airdrop::tools::model::AirdropEntry;

/// Reads `address,amount` rows from a headerless CSV file.
///
/// Rows with fewer than two columns or with an amount that is not a decimal
/// number are skipped. They are logged at debug level and otherwise not
/// accounted for anywhere.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_entries(path: &Path) -> Result<Vec<AirdropEntry>> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        match parse_entry(&record) {
            Some(entry) => entries.push(entry),
            None => {
                skipped += 1;
                debug!(line = record.position().map(|pos| pos.line()), "skipping malformed row");
            }
        }
    }

    debug!(rows = entries.len(), skipped, "read airdrop entries");
    Ok(entries)
}

/// Converts a single record into an entry, or `None` when it is malformed.
pub fn parse_entry(record: &StringRecord) -> Option<AirdropEntry> {
    if record.len() < 2 {
        return None;
    }
    let amount = parse_amount(record.get(1)?)?;
    Some(AirdropEntry {
        address: record.get(0)?.trim().to_string(),
        amount,
    })
}
