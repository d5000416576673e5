use std::fmt;
use std::path::PathBuf;

use alloy_primitives::U256;
use bigdecimal::{BigDecimal, Signed, Zero};
use num_bigint::BigInt;
use tracing::{debug, info, instrument};

use crate::airdrop::tools::amount::{format_decimal, format_plain, format_units, scale_amount};
use crate::airdrop::tools::error::{Result, ToolError};
use crate::airdrop::tools::io::csv_read;
use crate::airdrop::tools::io::csv_write::AirdropWriter;
use crate::airdrop::tools::model::AirdropRow;

/// Output path used when none is given.
pub const DEFAULT_OUTPUT: &str = "airdrop_prepared.csv";

/// Minimum amount kept in the airdrop when none is given: `0.00001` tokens.
pub fn default_min_amount() -> BigDecimal {
    BigDecimal::new(BigInt::from(1), 5)
}

/// Inputs of a single preparation run.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Threshold in whole tokens. Rows scaling below it are dust.
    pub min_amount: BigDecimal,
}

impl PrepareOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            min_amount: default_min_amount(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_min_amount(mut self, min_amount: BigDecimal) -> Self {
        self.min_amount = min_amount;
        self
    }
}

/// Totals gathered while preparing the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub decimals: u8,
    pub min_amount: BigDecimal,
    /// Rows written to the output file.
    pub recipients: usize,
    /// Rows dropped for falling below the threshold.
    pub dust_count: usize,
    /// Sum of the original amounts of the dropped rows, in tokens.
    pub dust_total: BigDecimal,
    /// Sum of the original amounts of all valid rows, in tokens.
    pub original_total: BigDecimal,
    /// Sum of the written amounts, in base units.
    pub final_total: U256,
}

impl fmt::Display for AirdropSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let final_total =
            format_units(self.final_total, self.decimals, 6).map_err(|_| fmt::Error)?;
        let dust_total = format_decimal(&self.dust_total, 10);

        writeln!(f, "Input:      {}", self.input.display())?;
        writeln!(f, "Output:     {}", self.output.display())?;
        writeln!(f, "Decimals:   {}", self.decimals)?;
        writeln!(f, "Min amount: {} tokens", format_plain(&self.min_amount))?;
        writeln!(f, "---")?;
        writeln!(f, "Recipients:   {}", self.recipients)?;
        writeln!(
            f,
            "Dust removed: {} addresses ({dust_total} tokens)",
            self.dust_count
        )?;
        writeln!(f, "---")?;
        writeln!(
            f,
            "Original total: {} tokens",
            format_decimal(&self.original_total, 6)
        )?;
        writeln!(f, "Final total:    {final_total} tokens")?;
        write!(f, "Dust loss:      {dust_total} tokens")
    }
}

/// Rescales every valid input row to base units and writes the rows at or
/// above the threshold to the output file.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %options.input.display(), output = %options.output.display(), decimals = decimals)
)]
pub fn prepare_csv(options: &PrepareOptions, decimals: u8) -> Result<AirdropSummary> {
    let entries = csv_read::read_entries(&options.input)?;
    info!(row_count = entries.len(), "read input rows");

    // Negative thresholds keep everything that is not itself negative.
    let min_scaled = if options.min_amount.is_negative() {
        U256::ZERO
    } else {
        scale_amount(&options.min_amount, decimals)?
    };
    debug!(%min_scaled, "minimum in base units");

    let mut writer = AirdropWriter::create(&options.output)?;
    let mut summary = AirdropSummary {
        input: options.input.clone(),
        output: options.output.clone(),
        decimals,
        min_amount: options.min_amount.clone(),
        recipients: 0,
        dust_count: 0,
        dust_total: BigDecimal::zero(),
        original_total: BigDecimal::zero(),
        final_total: U256::ZERO,
    };

    for entry in entries {
        summary.original_total = &summary.original_total + &entry.amount;
        let row = AirdropRow {
            scaled_amount: scale_amount(&entry.amount, decimals)?,
            original_amount: entry.amount,
            address: entry.address,
        };

        if is_dust(&row, min_scaled) {
            summary.dust_count += 1;
            summary.dust_total = &summary.dust_total + &row.original_amount;
        } else {
            writer.write_row(&row)?;
            summary.final_total = summary
                .final_total
                .checked_add(row.scaled_amount)
                .ok_or_else(|| ToolError::AmountOverflow(summary.final_total.to_string()))?;
        }
    }

    summary.recipients = writer.finish()?;
    info!(
        recipients = summary.recipients,
        dust = summary.dust_count,
        "airdrop file written"
    );
    Ok(summary)
}

/// A row is dust when its signed base-unit amount is below the threshold.
/// Negative amounts that truncate to zero count as zero.
fn is_dust(row: &AirdropRow, min_scaled: U256) -> bool {
    let negative = row.original_amount.is_negative() && !row.scaled_amount.is_zero();
    negative || row.scaled_amount < min_scaled
}
