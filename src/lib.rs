//! Core library for the airdrop-tools command line applications.
//!
//! Two independent tools are built on top of it. `prepare_airdrop_csv`
//! rescales a list of `(address, amount)` rows into integer base units of an
//! ERC-20 token, reading the token metadata over JSON-RPC ([`io::rpc`]) and
//! streaming the rows through [`io::csv_read`], [`amount`] and
//! [`io::csv_write`] under the orchestration in [`prepare`].
//! `calculate_src_coverage` runs the coverage tool and aggregates its
//! summary table through [`coverage`].

pub mod airdrop;

pub use airdrop::tools::{Result, ToolError, amount, coverage, error, io, logging, model, prepare};
