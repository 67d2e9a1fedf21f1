//! Failures while loading `quire.toml`.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read config file `{}`", .0.display())]
    Unreadable(PathBuf, #[source] io::Error),

    /// Not valid TOML, or a key of the wrong type or unknown section.
    #[error("malformed config: {0}")]
    Malformed(#[from] toml::de::Error),

    /// Parsed, but the values cannot work together.
    #[error("rejected config value {0}")]
    Rejected(String),
}
