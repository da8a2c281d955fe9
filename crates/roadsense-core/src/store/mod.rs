//! Durable keyed collection of pothole reports
//!
//! The store is logically single-writer: every mutation takes the inner
//! lock, is applied to a copy, persisted, and only then committed. A failed
//! persist leaves both memory and the backend untouched.

pub mod backend;
pub mod seed;

pub use backend::{FileBackend, MemoryBackend, StateBackend};
pub use seed::SeedPolicy;

use crate::clock::{Clock, SystemClock};
use crate::error::{BackendError, StoreError};
use crate::model::{PotholeReport, User};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Backend key holding the user directory
pub const USERS_KEY: &str = "roadsense_users";
/// Backend key holding all reports
pub const REPORTS_KEY: &str = "roadsense_reports";

struct Inner {
    backend: Box<dyn StateBackend>,
    reports: Vec<PotholeReport>,
    users: Vec<User>,
}

impl Inner {
    fn persist_reports(&mut self, reports: &[PotholeReport]) -> Result<(), StoreError> {
        let json = serde_json::to_string(reports).map_err(BackendError::from)?;
        self.backend.write(REPORTS_KEY, &json)?;
        Ok(())
    }
}

/// Report store shared between the recorder and the sync coordinator.
pub struct LocalReportStore {
    inner: Mutex<Inner>,
}

impl LocalReportStore {
    /// Load whatever state the backend holds. Missing documents are empty.
    pub fn open<B: StateBackend + 'static>(backend: B) -> Result<Self, StoreError> {
        let users = load_document::<User>(&backend, USERS_KEY)?.unwrap_or_default();
        let reports = load_document::<PotholeReport>(&backend, REPORTS_KEY)?.unwrap_or_default();

        info!(reports = reports.len(), users = users.len(), "Opened report store");

        Ok(Self {
            inner: Mutex::new(Inner {
                backend: Box::new(backend),
                reports: dedupe(reports),
                users,
            }),
        })
    }

    /// Open the store, seeding it first if neither collection was ever written.
    pub fn initialize<B: StateBackend + 'static>(mut backend: B, policy: SeedPolicy) -> Result<Self, StoreError> {
        let never_written = backend.read(USERS_KEY)?.is_none() && backend.read(REPORTS_KEY)?.is_none();

        if never_written && policy == SeedPolicy::Demo {
            let mut rng = rand::thread_rng();
            let users = seed::demo_users();
            let reports = seed::demo_reports(SystemClock.now_millis(), &mut rng);

            backend.write(USERS_KEY, &serde_json::to_string(&users).map_err(BackendError::from)?)?;
            backend.write(REPORTS_KEY, &serde_json::to_string(&reports).map_err(BackendError::from)?)?;
            info!(users = users.len(), reports = reports.len(), "Seeded demo data");
        }

        Self::open(backend)
    }

    /// Add a new report. Newest reports are kept first.
    pub fn append(&self, report: PotholeReport) -> Result<(), StoreError> {
        if !report.has_valid_confidence() {
            return Err(StoreError::InvalidConfidence {
                id: report.id,
                confidence: report.confidence,
            });
        }

        let mut inner = self.lock();
        if inner.reports.iter().any(|r| r.id == report.id) {
            return Err(StoreError::DuplicateId(report.id));
        }

        let mut next = Vec::with_capacity(inner.reports.len() + 1);
        next.push(report);
        next.extend(inner.reports.iter().cloned());

        inner.persist_reports(&next)?;
        inner.reports = next;

        debug!(id = %inner.reports[0].id, total = inner.reports.len(), "Appended report");
        Ok(())
    }

    /// Apply a field-level mutation to one report.
    ///
    /// The mutator may not change the id, and may only move `synced`
    /// from false to true. A mutation that changes nothing is not persisted.
    pub fn update<F>(&self, id: &str, mutator: F) -> Result<PotholeReport, StoreError>
    where
        F: FnOnce(&mut PotholeReport),
    {
        let mut inner = self.lock();
        let index = inner
            .reports
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let original = &inner.reports[index];
        let mut updated = original.clone();
        mutator(&mut updated);

        if updated.id != original.id || (original.synced && !updated.synced) {
            return Err(StoreError::InvalidMutation(id.to_string()));
        }
        if !updated.has_valid_confidence() {
            return Err(StoreError::InvalidConfidence {
                id: id.to_string(),
                confidence: updated.confidence,
            });
        }
        if &updated == original {
            return Ok(updated);
        }

        let mut next = inner.reports.clone();
        next[index] = updated.clone();
        inner.persist_reports(&next)?;
        inner.reports = next;

        Ok(updated)
    }

    pub fn get(&self, id: &str) -> Option<PotholeReport> {
        self.lock().reports.iter().find(|r| r.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().reports.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored report, newest first.
    pub fn list_all(&self) -> Vec<PotholeReport> {
        self.lock().reports.clone()
    }

    /// Reports belonging to `user_id`. No ordering is promised.
    pub fn list_by_user(&self, user_id: &str) -> Vec<PotholeReport> {
        self.lock()
            .reports
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Reports not yet reconciled with the remote.
    pub fn pending(&self) -> Vec<PotholeReport> {
        self.lock().reports.iter().filter(|r| !r.synced).cloned().collect()
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    /// Case-insensitive lookup by e-mail address.
    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_document<T: serde::de::DeserializeOwned>(
    backend: &dyn StateBackend,
    key: &str,
) -> Result<Option<Vec<T>>, StoreError> {
    match backend.read(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(BackendError::from)?)),
        None => Ok(None),
    }
}

fn dedupe(reports: Vec<PotholeReport>) -> Vec<PotholeReport> {
    let mut seen = HashSet::new();
    let before = reports.len();
    let kept: Vec<_> = reports.into_iter().filter(|r| seen.insert(r.id.clone())).collect();

    if kept.len() != before {
        warn!(dropped = before - kept.len(), "Dropped duplicate report ids while loading");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, user: &str, synced: bool) -> PotholeReport {
        PotholeReport {
            id: id.to_string(),
            user_id: user.to_string(),
            user_name: format!("name-{user}"),
            latitude: 40.7128,
            longitude: -74.0060,
            confidence: 0.9,
            image_snapshot: String::new(),
            timestamp: 1_000,
            synced,
        }
    }

    #[test]
    fn test_duplicate_append_is_rejected() -> anyhow::Result<()> {
        let store = LocalReportStore::open(MemoryBackend::new())?;
        store.append(report("a", "u1", false))?;

        let err = store.append(report("a", "u2", true)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(ref id) if id == "a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").map(|r| r.user_id), Some("u1".to_string()));
        Ok(())
    }

    #[test]
    fn test_out_of_range_confidence_is_rejected() -> anyhow::Result<()> {
        let store = LocalReportStore::open(MemoryBackend::new())?;
        let mut bad = report("a", "u1", false);
        bad.confidence = 1.5;

        assert!(matches!(store.append(bad), Err(StoreError::InvalidConfidence { .. })));
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_list_by_user_filters() -> anyhow::Result<()> {
        let store = LocalReportStore::open(MemoryBackend::new())?;
        store.append(report("a", "u1", false))?;
        store.append(report("b", "u2", false))?;
        store.append(report("c", "u1", true))?;

        let mut ids: Vec<_> = store.list_by_user("u1").into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(store.list_all().len(), 3);
        assert_eq!(store.pending().len(), 2);
        Ok(())
    }

    #[test]
    fn test_update_missing_id() -> anyhow::Result<()> {
        let store = LocalReportStore::open(MemoryBackend::new())?;
        let err = store.update("nope", |r| r.synced = true).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        Ok(())
    }

    #[test]
    fn test_synced_flag_is_monotone() -> anyhow::Result<()> {
        let store = LocalReportStore::open(MemoryBackend::new())?;
        store.append(report("a", "u1", true))?;

        let err = store.update("a", |r| r.synced = false).unwrap_err();
        assert!(matches!(err, StoreError::InvalidMutation(_)));

        let err = store.update("a", |r| r.id = "b".to_string()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidMutation(_)));
        assert_eq!(store.get("a").map(|r| r.synced), Some(true));
        Ok(())
    }

    #[test]
    fn test_noop_update_does_not_write() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let store = LocalReportStore::open(backend.clone())?;
        store.append(report("a", "u1", true))?;
        let writes = backend.write_count();

        store.update("a", |r| r.synced = true)?;
        assert_eq!(backend.write_count(), writes);
        Ok(())
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let store = LocalReportStore::open(backend.clone())?;
        store.append(report("a", "u1", false))?;

        backend.set_capacity(Some(1));
        assert!(matches!(store.append(report("b", "u1", false)), Err(StoreError::Backend(_))));
        assert!(matches!(store.update("a", |r| r.synced = true), Err(StoreError::Backend(_))));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").map(|r| r.synced), Some(false));
        Ok(())
    }

    #[test]
    fn test_seeding_only_on_first_start() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let store = LocalReportStore::initialize(backend.clone(), SeedPolicy::Demo)?;
        assert_eq!(store.len(), seed::DEMO_REPORT_COUNT);
        assert!(store.find_user_by_email("ADMIN@roadsense.com").is_some());
        assert!(store.list_all().iter().all(|r| r.synced && r.has_valid_confidence()));

        store.append(report("mine", "2", false))?;
        drop(store);

        let reopened = LocalReportStore::initialize(backend, SeedPolicy::Demo)?;
        assert_eq!(reopened.len(), seed::DEMO_REPORT_COUNT + 1);
        Ok(())
    }

    #[test]
    fn test_empty_policy_does_not_seed() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let store = LocalReportStore::initialize(backend.clone(), SeedPolicy::Empty)?;

        assert!(store.is_empty());
        assert!(store.users().is_empty());
        assert_eq!(backend.write_count(), 0);
        Ok(())
    }
}
