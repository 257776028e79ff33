//! netwatch-discover: On-demand network presence scanner.
//!
//! Wraps nmap to find responding hosts on a subnet, reconciles them into
//! the known-device set, and serves the result over HTTP.

pub mod config;
pub mod error;
pub mod nmap_xml;
pub mod scanner;
pub mod server;
pub mod service;
