use std::fs::File;
use std::path::Path;

use csv::{Terminator, Writer, WriterBuilder};

use crate::airdrop::tools::error::Result;
use crate::airdrop::tools::model::AirdropRow;

/// Writes the prepared `address,baseUnits` rows, one per line, without a
/// header.
pub struct AirdropWriter {
    inner: Writer<File>,
    written: usize,
}

impl AirdropWriter {
    /// Creates (or truncates) the output file.
    pub fn create(path: &Path) -> Result<Self> {
        let inner = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_path(path)?;
        Ok(Self { inner, written: 0 })
    }

    /// Appends one row.
    pub fn write_row(&mut self, row: &AirdropRow) -> Result<()> {
        let amount = row.scaled_amount.to_string();
        self.inner
            .write_record([row.address.as_str(), amount.as_str()])?;
        self.written += 1;
        Ok(())
    }

    /// Flushes buffered rows to disk.
    pub fn finish(mut self) -> Result<usize> {
        self.inner.flush()?;
        Ok(self.written)
    }
}
