//! Sync coordinator
//!
//! Scans the store for unsynced reports and pushes each one to the remote,
//! flipping its `synced` flag only after the remote accepted it. Runs are
//! serialized, so overlapping calls never submit the same report twice.

use super::{Connectivity, RemoteReportSink};
use crate::error::StoreError;
use crate::store::LocalReportStore;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Outcome of one `sync_pending` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Reports handed to the remote
    pub attempted: usize,
    /// Ids now marked synced
    pub synced: Vec<String>,
    /// Ids that stay pending until the next run
    pub failed: Vec<String>,
    /// True when the run was skipped because the device is offline
    pub skipped_offline: bool,
}

impl SyncReport {
    /// Nothing was left behind and the run was not skipped.
    pub fn is_success(&self) -> bool {
        !self.skipped_offline && self.failed.is_empty()
    }
}

pub struct OfflineSyncCoordinator {
    store: Arc<LocalReportStore>,
    remote: Arc<dyn RemoteReportSink>,
    connectivity: Connectivity,
    run_guard: Mutex<()>,
}

impl OfflineSyncCoordinator {
    pub fn new(store: Arc<LocalReportStore>, remote: Arc<dyn RemoteReportSink>, connectivity: Connectivity) -> Self {
        Self {
            store,
            remote,
            connectivity,
            run_guard: Mutex::new(()),
        }
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Record a reachability transition. Coming back online triggers a sync.
    pub fn connectivity_changed(&self, online: bool) -> Result<Option<SyncReport>, StoreError> {
        let was_online = self.connectivity.set_online(online);
        info!(online, was_online, "Connectivity changed");

        if online && !was_online {
            return self.sync_pending().map(Some);
        }
        Ok(None)
    }

    /// Push every unsynced report to the remote.
    ///
    /// Reports the remote refuses stay unsynced and are retried on the next
    /// call. With nothing pending this touches neither the store nor the
    /// remote.
    pub fn sync_pending(&self) -> Result<SyncReport, StoreError> {
        let _running = self.run_guard.lock().unwrap_or_else(PoisonError::into_inner);

        if !self.connectivity.is_online() {
            debug!("Offline, skipping sync");
            return Ok(SyncReport {
                skipped_offline: true,
                ..SyncReport::default()
            });
        }

        let pending = self.store.pending();
        let mut report = SyncReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        info!(pending = pending.len(), "Syncing offline reports");

        for item in pending {
            report.attempted += 1;
            match self.remote.push(&item) {
                Ok(()) => {
                    self.store.update(&item.id, |r| r.synced = true)?;
                    report.synced.push(item.id);
                }
                Err(e) => {
                    warn!(id = %item.id, error = %e, "Remote push failed, report stays pending");
                    report.failed.push(item.id);
                }
            }
        }

        info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            "Sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::model::PotholeReport;
    use crate::store::MemoryBackend;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingRemote {
        received: Mutex<Vec<String>>,
        reject: HashSet<String>,
    }

    impl RemoteReportSink for RecordingRemote {
        fn push(&self, report: &PotholeReport) -> Result<(), RemoteError> {
            if self.reject.contains(&report.id) {
                return Err(RemoteError::Rejected(report.id.clone()));
            }
            self.received.lock().unwrap().push(report.id.clone());
            Ok(())
        }
    }

    fn report(id: &str, synced: bool) -> PotholeReport {
        PotholeReport {
            id: id.to_string(),
            user_id: "U1".to_string(),
            user_name: "User One".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            confidence: 0.9,
            image_snapshot: String::new(),
            timestamp: 0,
            synced,
        }
    }

    #[test]
    fn test_failed_push_stays_pending() -> anyhow::Result<()> {
        let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
        store.append(report("ok", false))?;
        store.append(report("bad", false))?;

        let remote = Arc::new(RecordingRemote {
            reject: HashSet::from(["bad".to_string()]),
            ..Default::default()
        });
        let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(true));

        let outcome = coordinator.sync_pending()?;
        assert_eq!(outcome.synced, vec!["ok"]);
        assert_eq!(outcome.failed, vec!["bad"]);
        assert!(!outcome.is_success());
        assert_eq!(store.get("bad").map(|r| r.synced), Some(false));
        Ok(())
    }

    #[test]
    fn test_offline_run_is_skipped() -> anyhow::Result<()> {
        let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
        store.append(report("a", false))?;
        let remote = Arc::new(RecordingRemote::default());
        let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(false));

        let outcome = coordinator.sync_pending()?;
        assert!(outcome.skipped_offline);
        assert!(remote.received.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_reconnect_triggers_sync() -> anyhow::Result<()> {
        let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
        store.append(report("a", false))?;
        let remote = Arc::new(RecordingRemote::default());
        let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(false));

        assert_eq!(coordinator.connectivity_changed(false)?, None);
        let outcome = coordinator.connectivity_changed(true)?;

        assert_eq!(outcome.map(|o| o.synced), Some(vec!["a".to_string()]));
        assert_eq!(store.get("a").map(|r| r.synced), Some(true));

        // already online, no second run
        assert_eq!(coordinator.connectivity_changed(true)?, None);
        Ok(())
    }
}
