//! Host discovery.
//!
//! [`NmapScanner`] runs nmap as a child process via `tokio::process::Command`
//! and turns its XML output into [`Responder`]s. Callers go through the
//! [`Discovery`] trait, which never fails: a broken scan reads as an empty
//! network.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ipnet::IpNet;
use netwatch_core::Responder;
use tokio::process::Command;
use uuid::Uuid;

use crate::config::NetwatchConfig;
use crate::error::{DiscoverError, Result};
use crate::nmap_xml::{self, NmapRun};

/// Source of the hosts currently responding on a range.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Hosts answering on `range`. Failures are logged and yield an empty list.
    async fn discover(&self, range: &str) -> Vec<Responder>;
}

/// Result of a single nmap scan execution.
#[derive(Debug)]
pub struct ScanResult {
    /// Unique ID for this scan run.
    pub scan_id: Uuid,
    /// The target CIDR.
    pub target: String,
    /// Parsed nmap XML output.
    pub nmap_run: NmapRun,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

/// Wrapper around the nmap binary.
#[derive(Debug, Clone)]
pub struct NmapScanner {
    nmap_path: String,
    nmap_args: Vec<String>,
    timeout: Duration,
}

impl NmapScanner {
    pub fn new(nmap_path: &str) -> Self {
        let defaults = NetwatchConfig::default();
        Self {
            nmap_path: nmap_path.to_string(),
            nmap_args: defaults.nmap_args,
            timeout: Duration::from_secs(defaults.scan_timeout_secs),
        }
    }

    pub fn from_config(config: &NetwatchConfig) -> Self {
        Self {
            nmap_path: config.nmap_path.clone(),
            nmap_args: config.nmap_args.clone(),
            timeout: Duration::from_secs(config.scan_timeout_secs),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nmap_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify nmap is installed and return its `--version` banner.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Execute a discovery sweep against `target`.
    ///
    /// Nmap is invoked with `-oX -` to write XML to stdout. The child is
    /// killed if it outlives the configured timeout.
    pub async fn scan(&self, target: &str) -> Result<ScanResult> {
        let target = target.trim();
        validate_range(target)?;

        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            args = ?self.nmap_args,
            "Starting nmap scan"
        );

        let run = Command::new(&self.nmap_path)
            .args(&self.nmap_args)
            .arg("-oX")
            .arg("-")
            .arg("--noninteractive")
            .arg(target)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result.map_err(|e| self.spawn_error(e))?,
            Err(_) => {
                return Err(DiscoverError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
        };

        let duration = start.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let nmap_run = nmap_xml::parse_nmap_xml(&output.stdout)?;
        let host_count = nmap_run.hosts.iter().filter(|h| h.is_up()).count();
        let totals = nmap_run.host_totals().unwrap_or_default();

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            hosts_up = host_count,
            hosts_down = totals.down,
            hosts_total = totals.total,
            duration_ms = duration.as_millis(),
            "Nmap scan complete"
        );

        Ok(ScanResult {
            scan_id,
            target: target.to_string(),
            nmap_run,
            duration,
        })
    }

    fn spawn_error(&self, e: std::io::Error) -> DiscoverError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            }
        } else {
            DiscoverError::Io(e)
        }
    }
}

#[async_trait]
impl Discovery for NmapScanner {
    async fn discover(&self, range: &str) -> Vec<Responder> {
        match self.scan(range).await {
            Ok(result) => {
                let responders = result.nmap_run.responders();
                tracing::debug!(
                    scan_id = %result.scan_id,
                    responders = responders.len(),
                    duration_ms = result.duration.as_millis(),
                    target = %result.target,
                    "Discovery finished"
                );
                responders
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    target = %range,
                    "Discovery failed, treating as no responders"
                );
                Vec::new()
            }
        }
    }
}

/// Accept a CIDR block or a single address.
fn validate_range(target: &str) -> Result<()> {
    if target.parse::<IpNet>().is_ok() || target.parse::<IpAddr>().is_ok() {
        Ok(())
    } else {
        Err(DiscoverError::InvalidRange(target.to_string()))
    }
}
