//! Presence reconciliation: merge one scan's responders into the set of
//! known devices and advance every device through its lifecycle.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::types::{DeviceRecord, Responder};

/// Consecutive missed scans after which a device is forgotten.
pub const REMOVAL_THRESHOLD: u32 = 2;

/// Counts produced by a single reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub responders: usize,
    pub added: usize,
    pub refreshed: usize,
    pub went_quiet: usize,
    pub removed: usize,
}

/// Devices seen since process start that have not yet expired, keyed by address.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KnownDevices {
    devices: BTreeMap<IpAddr, DeviceRecord>,
}

impl KnownDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, address: &IpAddr) -> Option<&DeviceRecord> {
        self.devices.get(address)
    }

    /// Devices in address order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.values()
    }

    /// Apply one scan's responders.
    ///
    /// Responders are applied first, so a device that answered is never also
    /// counted as absent in the same pass. Every device that did not answer
    /// has its absence streak bumped, and devices reaching
    /// [`REMOVAL_THRESHOLD`] are deleted.
    pub fn reconcile(&mut self, responders: &[Responder], seen_at: DateTime<Utc>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut answered: HashSet<IpAddr> = HashSet::with_capacity(responders.len());

        for responder in responders {
            let first_this_pass = answered.insert(responder.address);
            match self.devices.get_mut(&responder.address) {
                Some(device) => {
                    device.refresh(responder, seen_at);
                    if first_this_pass {
                        summary.refreshed += 1;
                    }
                }
                None => {
                    self.devices.insert(
                        responder.address,
                        DeviceRecord::from_responder(responder, seen_at),
                    );
                    summary.added += 1;
                }
            }
        }
        summary.responders = answered.len();

        let mut expired = Vec::new();
        for (address, device) in self.devices.iter_mut() {
            if answered.contains(address) {
                continue;
            }
            let streak = device.miss();
            if streak >= REMOVAL_THRESHOLD {
                expired.push(*address);
            } else {
                summary.went_quiet += 1;
            }
        }

        for address in expired {
            self.devices.remove(&address);
            tracing::debug!(address = %address, "Device removed after consecutive misses");
            summary.removed += 1;
        }

        summary
    }
}

impl<'a> IntoIterator for &'a KnownDevices {
    type Item = &'a DeviceRecord;
    type IntoIter = std::collections::btree_map::Values<'a, IpAddr, DeviceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.values()
    }
}

/// Value-level form of [`KnownDevices::reconcile`].
pub fn reconcile(
    mut known: KnownDevices,
    responders: &[Responder],
    seen_at: DateTime<Utc>,
) -> KnownDevices {
    known.reconcile(responders, seen_at);
    known
}
