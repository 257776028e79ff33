//! Configuration for the netwatch scanner.

use serde::Deserialize;

use crate::error::Result;

/// Top-level netwatch configuration.
///
/// Loaded from `netwatch.toml` or `NETWATCH__` environment variables.
/// Every key is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct NetwatchConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Discovery flags passed to nmap ahead of the output options.
    #[serde(default = "default_nmap_args")]
    pub nmap_args: Vec<String>,

    /// Scan target used until an operator supplies one.
    #[serde(default = "default_range")]
    pub default_range: String,

    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound on a single nmap run, in seconds.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_nmap_args() -> Vec<String> {
    // ARP ping sweep, names through the system resolver.
    ["-sn", "-PR", "--system-dns"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_range() -> String {
    "192.168.1.0/24".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_scan_timeout() -> u64 {
    120
}

impl Default for NetwatchConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            nmap_args: default_nmap_args(),
            default_range: default_range(),
            bind_addr: default_bind_addr(),
            scan_timeout_secs: default_scan_timeout(),
        }
    }
}

/// Load configuration from `<file_prefix>.{toml,json,...}` (optional) and
/// the environment. Environment values win over the file.
pub fn load_config(file_prefix: &str) -> Result<NetwatchConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NETWATCH")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("nmap_args"),
        )
        .build()?;

    Ok(cfg.try_deserialize()?)
}
