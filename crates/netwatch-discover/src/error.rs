//! Error types for the netwatch-discover crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Nmap did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("Invalid scan range: {0}")]
    InvalidRange(String),

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
