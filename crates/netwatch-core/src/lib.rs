//! netwatch-core: Device presence tracking for the netwatch scanner.
//!
//! This crate holds the pieces with no I/O:
//! - Responder and device record types
//! - The presence lifecycle (active, absent once, removed)
//! - Reconciliation of a scan's responders into the known-device set

pub mod reconcile;
pub mod types;

pub use reconcile::{reconcile, KnownDevices, ReconcileSummary, REMOVAL_THRESHOLD};
pub use types::{DeviceRecord, LifecycleState, Responder};
