use tracing_subscriber::EnvFilter;

use crate::airdrop::tools::error::{Result, ToolError};

/// Installs the global fmt subscriber. Events go to stderr so that the
/// reports printed on stdout stay machine-readable. The filter comes from
/// `RUST_LOG` and defaults to `warn`.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}
