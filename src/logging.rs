//! File logger setup for embedding applications.
//!
//! The library logs through the `log` facade everywhere; the hosting app
//! decides where that goes. This helper wires up a `simplelog` file writer
//! with RFC3339 timestamps — call it once at startup, before constructing
//! a session.

use std::fs::File;
use std::path::Path;

use simplelog::{ConfigBuilder, WriteLogger};

pub use simplelog::LevelFilter;

/// Initializes a file logger at `path`. Fails if the file cannot be
/// created or a global logger is already installed.
pub fn init_file_logger(path: impl AsRef<Path>, level: LevelFilter) -> std::io::Result<()> {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let log_file = File::create(path)?;
    WriteLogger::init(level, log_config, log_file).map_err(std::io::Error::other)?;
    log::info!("Threadline logging initialized");
    Ok(())
}
