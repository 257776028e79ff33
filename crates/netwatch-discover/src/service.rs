//! The scan cycle: discover, reconcile, snapshot.
//!
//! [`ScanService`] owns the known-device set and the current scan target.
//! Both sit behind one async mutex that is held for the whole cycle, so
//! concurrent scan requests run one after another.

use std::sync::Arc;

use chrono::Utc;
use netwatch_core::{DeviceRecord, KnownDevices, ReconcileSummary};
use tokio::sync::Mutex;

use crate::scanner::Discovery;

struct ScanState {
    known: KnownDevices,
    target: String,
}

/// What one scan cycle produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The range that was scanned, now the current target.
    pub range_used: String,
    /// Every device still tracked after reconciliation, in address order.
    pub devices: Vec<DeviceRecord>,
    pub summary: ReconcileSummary,
}

pub struct ScanService {
    discovery: Arc<dyn Discovery>,
    state: Mutex<ScanState>,
}

impl ScanService {
    pub fn new(discovery: Arc<dyn Discovery>, default_range: impl Into<String>) -> Self {
        Self {
            discovery,
            state: Mutex::new(ScanState {
                known: KnownDevices::new(),
                target: default_range.into(),
            }),
        }
    }

    /// The range the next scan will use when none is supplied.
    pub async fn current_target(&self) -> String {
        self.state.lock().await.target.clone()
    }

    /// Run one scan cycle.
    ///
    /// A blank or missing `range` reuses the current target; otherwise the
    /// supplied range becomes the new target.
    pub async fn scan(&self, range: Option<&str>) -> ScanOutcome {
        let mut state = self.state.lock().await;

        if let Some(range) = range.map(str::trim).filter(|r| !r.is_empty()) {
            state.target = range.to_string();
        }
        let target = state.target.clone();

        let responders = self.discovery.discover(&target).await;
        let summary = state.known.reconcile(&responders, Utc::now());

        tracing::info!(
            responders = summary.responders,
            added = summary.added,
            refreshed = summary.refreshed,
            went_quiet = summary.went_quiet,
            removed = summary.removed,
            tracked = state.known.len(),
            target = %target,
            "Scan reconciled"
        );

        ScanOutcome {
            range_used: target,
            devices: state.known.iter().cloned().collect(),
            summary,
        }
    }
}
