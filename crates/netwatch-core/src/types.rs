//! Core domain types for device presence tracking.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Responder ─────────────────────────────────────────────────────

/// A host that answered the current discovery scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responder {
    pub address: IpAddr,
    pub display_name: Option<String>,
    pub hardware_id: Option<String>,
}

impl Responder {
    /// Build a responder, treating blank names and hardware ids as absent.
    pub fn new(address: IpAddr, display_name: Option<String>, hardware_id: Option<String>) -> Self {
        Self {
            address,
            display_name: non_blank(display_name),
            hardware_id: non_blank(hardware_id),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Lifecycle ─────────────────────────────────────────────────────

/// Presence state of a tracked device.
///
/// Removal is not a state: a device that misses two scans in a row is
/// dropped from the known-device set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// Answered the most recent scan.
    Active,
    /// Missed exactly one scan.
    AbsentOnce,
}

// ── Device Record ─────────────────────────────────────────────────

/// A device in the known-device set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub address: IpAddr,
    pub display_name: Option<String>,
    pub hardware_id: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    absence_streak: u32,
}

impl DeviceRecord {
    /// A freshly discovered device.
    pub fn from_responder(responder: &Responder, seen_at: DateTime<Utc>) -> Self {
        Self {
            address: responder.address,
            display_name: responder.display_name.clone(),
            hardware_id: responder.hardware_id.clone(),
            first_seen: seen_at,
            last_seen: seen_at,
            absence_streak: 0,
        }
    }

    /// Consecutive scans this device has failed to answer.
    pub fn absence_streak(&self) -> u32 {
        self.absence_streak
    }

    /// The lifecycle state implied by the absence streak.
    pub fn lifecycle_state(&self) -> LifecycleState {
        if self.absence_streak == 0 {
            LifecycleState::Active
        } else {
            LifecycleState::AbsentOnce
        }
    }

    /// Overwrite metadata with the latest observation and mark the device active.
    pub(crate) fn refresh(&mut self, responder: &Responder, seen_at: DateTime<Utc>) {
        self.display_name = responder.display_name.clone();
        self.hardware_id = responder.hardware_id.clone();
        self.last_seen = seen_at;
        self.absence_streak = 0;
    }

    /// Record one missed scan and return the new streak.
    pub(crate) fn miss(&mut self) -> u32 {
        self.absence_streak = self.absence_streak.saturating_add(1);
        self.absence_streak
    }
}
