use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::airdrop::tools::error::ToolError;

/// Recipient address as it appears in the input file. Addresses are passed
/// through untouched, so the plain string representation is kept.
pub type RecipientAddress = String;

/// One row of the coverage tool's summary table that matched the source
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageLine {
    /// Number of covered lines.
    pub covered: u64,
    /// Number of instrumented lines.
    pub total: u64,
    /// Path of the source file, starting at the prefix.
    pub file_path: String,
}

impl CoverageLine {
    /// Lines still missing coverage, zero when the file is fully covered.
    pub fn deficit(&self) -> u64 {
        self.total.saturating_sub(self.covered)
    }

    /// Covered share as a percentage. Files without instrumented lines
    /// count as fully covered.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.covered as f64 / self.total as f64 * 100.0
        }
    }
}

/// A syntactically valid input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropEntry {
    pub address: RecipientAddress,
    /// Amount in whole tokens.
    pub amount: BigDecimal,
}

/// An input row together with its amount expressed in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropRow {
    pub address: RecipientAddress,
    pub original_amount: BigDecimal,
    /// `trunc(original_amount * 10^decimals)`, never rounded up.
    pub scaled_amount: U256,
}

/// Token metadata read once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub decimals: u8,
    pub symbol: String,
}

/// Token contract address as typed by the user, together with its parsed
/// form. The raw text is what gets echoed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAddress {
    pub raw: String,
    pub address: Address,
}

impl FromStr for TokenAddress {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim().to_string();
        let address = Address::from_str(&raw)
            .map_err(|error| ToolError::InvalidAddress(format!("{raw}: {error}")))?;
        Ok(Self { raw, address })
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
