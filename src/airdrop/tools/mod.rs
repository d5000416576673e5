pub mod amount;
pub mod coverage;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod prepare;

pub use error::{Result, ToolError};
