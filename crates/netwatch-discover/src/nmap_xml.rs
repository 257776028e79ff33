//! Nmap XML output deserialization.
//!
//! A ping sweep run with `-oX -` writes one `<host>` element per scanned
//! address. Only the parts needed to identify responders are modelled.

use std::net::IpAddr;

use netwatch_core::Responder;
use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Root element: `<nmaprun>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct NmapRun {
    #[serde(rename = "host", default)]
    pub hosts: Vec<NmapHost>,
    pub runstats: Option<RunStats>,
}

/// A single host from scan results.
#[derive(Debug, Clone, Deserialize)]
pub struct NmapHost {
    pub status: Option<HostStatus>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<Address>,
    pub hostnames: Option<Hostnames>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hostnames {
    #[serde(rename = "hostname", default)]
    pub hostnames: Vec<Hostname>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunStats {
    pub hosts: Option<RunStatsHosts>,
}

/// Nmap's own tally of the sweep, `<runstats><hosts .../>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RunStatsHosts {
    #[serde(rename = "@up", default)]
    pub up: u32,
    #[serde(rename = "@down", default)]
    pub down: u32,
    #[serde(rename = "@total", default)]
    pub total: u32,
}

impl NmapHost {
    /// The host's IP address, preferring IPv4.
    pub fn ip(&self) -> Option<IpAddr> {
        ["ipv4", "ipv6"].iter().find_map(|kind| {
            self.addresses
                .iter()
                .find(|a| a.addr_type == *kind)
                .and_then(|a| a.addr.parse().ok())
        })
    }

    /// Extract the MAC address, if present.
    pub fn mac(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == "mac")
            .map(|a| a.addr.as_str())
    }

    /// Extract the first hostname, if present.
    pub fn hostname(&self) -> Option<&str> {
        self.hostnames
            .as_ref()
            .and_then(|hn| hn.hostnames.first())
            .map(|h| h.name.as_str())
    }

    /// Check if the host is up.
    pub fn is_up(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == "up")
    }
}

impl NmapRun {
    /// Host counts reported by nmap, if the run finished cleanly.
    pub fn host_totals(&self) -> Option<RunStatsHosts> {
        self.runstats.as_ref().and_then(|s| s.hosts)
    }

    /// Responders for every host that is up and has a usable address.
    pub fn responders(&self) -> Vec<Responder> {
        self.hosts
            .iter()
            .filter(|h| h.is_up())
            .filter_map(|h| match h.ip() {
                Some(ip) => Some(Responder::new(
                    ip,
                    h.hostname().map(String::from),
                    h.mac().map(String::from),
                )),
                None => {
                    tracing::warn!(
                        addresses = ?h.addresses.iter().map(|a| a.addr.as_str()).collect::<Vec<_>>(),
                        "Skipping responding host without an IP address"
                    );
                    None
                }
            })
            .collect()
    }
}

/// Parse nmap XML bytes into a structured `NmapRun`.
pub fn parse_nmap_xml(xml: &[u8]) -> Result<NmapRun> {
    quick_xml::de::from_reader(xml).map_err(|e| DiscoverError::XmlParse(format!("{e}")))
}
