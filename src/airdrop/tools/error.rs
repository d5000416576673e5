use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while the
/// tools read input, talk to the RPC endpoint, or run the coverage tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Transport level failures, including timeouts and HTTP error statuses.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a JSON-RPC error object or no result.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A hex payload returned by the endpoint could not be decoded.
    #[error("invalid hex payload '{value}': {reason}")]
    InvalidHex { value: String, reason: String },

    /// The token reports more decimals than a 256-bit amount can represent.
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(String),

    /// Scaling an amount into base units overflowed 256 bits.
    #[error("amount {0} does not fit in 256 bits once scaled")]
    AmountOverflow(String),

    /// Raised when the coverage tool could not be started.
    #[error("failed to run coverage tool '{program}': {source}")]
    CoverageTool {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Raised when a coverage pattern fails to compile.
    #[error("invalid coverage pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a token address is not 20 bytes of hex.
    #[error("invalid token address {0}")]
    InvalidAddress(String),

    /// Raised when no RPC endpoint was configured, or it is empty.
    #[error("RPC_URL environment variable is required")]
    MissingRpcUrl,

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
