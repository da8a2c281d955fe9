//! Read/write contract used by the UI collaborators
//!
//! History, dashboard and map views consume the core only through these
//! calls.

use crate::error::StoreError;
use crate::model::PotholeReport;
use crate::store::LocalReportStore;
use crate::sync::OfflineSyncCoordinator;
use std::sync::Arc;
use tracing::error;

pub struct ReportService {
    store: Arc<LocalReportStore>,
    sync: Arc<OfflineSyncCoordinator>,
}

impl ReportService {
    pub fn new(store: Arc<LocalReportStore>, sync: Arc<OfflineSyncCoordinator>) -> Self {
        Self { store, sync }
    }

    pub fn get_all_reports(&self) -> Vec<PotholeReport> {
        self.store.list_all()
    }

    pub fn get_reports_for_user(&self, user_id: &str) -> Vec<PotholeReport> {
        self.store.list_by_user(user_id)
    }

    /// A user's reports, most recent capture first.
    pub fn history_for_user(&self, user_id: &str) -> Vec<PotholeReport> {
        let mut reports = self.store.list_by_user(user_id);
        reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        reports
    }

    pub fn save_report(&self, report: PotholeReport) -> Result<(), StoreError> {
        self.store.append(report)
    }

    /// Trigger a sync of all pending reports; `true` when the whole batch
    /// was reconciled.
    pub fn sync_offline_reports(&self) -> bool {
        match self.sync.sync_pending() {
            Ok(outcome) => outcome.is_success(),
            Err(e) => {
                error!(error = %e, "Sync aborted by a store failure");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::store::MemoryBackend;
    use crate::sync::{Connectivity, RemoteReportSink};

    struct AcceptAll;

    impl RemoteReportSink for AcceptAll {
        fn push(&self, _report: &PotholeReport) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    fn report(id: &str, user_id: &str, timestamp: i64) -> PotholeReport {
        PotholeReport {
            id: id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_id.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            confidence: 0.5,
            image_snapshot: String::new(),
            timestamp,
            synced: false,
        }
    }

    fn service(online: bool) -> anyhow::Result<ReportService> {
        let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
        let sync = Arc::new(OfflineSyncCoordinator::new(store.clone(), Arc::new(AcceptAll), Connectivity::new(online)));
        Ok(ReportService::new(store, sync))
    }

    #[test]
    fn test_history_is_newest_first() -> anyhow::Result<()> {
        let service = service(true)?;
        service.save_report(report("old", "u", 10))?;
        service.save_report(report("new", "u", 30))?;
        service.save_report(report("mid", "u", 20))?;
        service.save_report(report("other", "v", 40))?;

        let ids: Vec<_> = service.history_for_user("u").into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(service.get_all_reports().len(), 4);
        assert_eq!(service.get_reports_for_user("v").len(), 1);
        Ok(())
    }

    #[test]
    fn test_sync_offline_reports_reports_batch_result() -> anyhow::Result<()> {
        let offline = service(false)?;
        offline.save_report(report("a", "u", 1))?;
        assert!(!offline.sync_offline_reports());

        let online = service(true)?;
        online.save_report(report("a", "u", 1))?;
        assert!(online.sync_offline_reports());
        assert!(online.get_all_reports().iter().all(|r| r.synced));
        Ok(())
    }
}
