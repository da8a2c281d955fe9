// tests/core_tests.rs
use roadsense_core::{
    Connectivity, FileBackend, LocalReportStore, MemoryBackend, OfflineSyncCoordinator, PotholeReport,
    RemoteError, RemoteReportSink, SeedPolicy, StoreError,
    store::REPORTS_KEY,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Remote that counts submissions per id and can be told to refuse
#[derive(Default)]
struct CountingRemote {
    received: Mutex<HashMap<String, usize>>,
    refuse: Mutex<bool>,
}

impl CountingRemote {
    fn total(&self) -> usize {
        self.received.lock().unwrap().values().sum()
    }

    fn max_per_id(&self) -> usize {
        self.received.lock().unwrap().values().copied().max().unwrap_or(0)
    }
}

impl RemoteReportSink for CountingRemote {
    fn push(&self, report: &PotholeReport) -> Result<(), RemoteError> {
        if *self.refuse.lock().unwrap() {
            return Err(RemoteError::Unreachable("timeout".to_string()));
        }
        *self.received.lock().unwrap().entry(report.id.clone()).or_default() += 1;
        Ok(())
    }
}

fn report(id: &str, user_id: &str, confidence: f64, synced: bool) -> PotholeReport {
    PotholeReport {
        id: id.to_string(),
        user_id: user_id.to_string(),
        user_name: format!("{user_id} name"),
        latitude: 40.7128,
        longitude: -74.0060,
        confidence,
        image_snapshot: "data:image/jpeg;base64,".to_string(),
        timestamp: 1_700_000_000_000,
        synced,
    }
}

#[test]
fn test_offline_write_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    {
        let store = LocalReportStore::initialize(FileBackend::new(dir.path())?, SeedPolicy::Empty)?;
        store.append(report("offline-1", "U1", 0.9, false))?;
    }

    let reloaded = LocalReportStore::open(FileBackend::new(dir.path())?)?;
    let stored = reloaded.get("offline-1").expect("report persisted");
    assert!(!stored.synced);
    assert_eq!(reloaded.len(), 1);
    Ok(())
}

#[test]
fn test_sync_with_nothing_pending_is_a_noop() -> anyhow::Result<()> {
    let backend = MemoryBackend::new();
    let store = Arc::new(LocalReportStore::open(backend.clone())?);
    store.append(report("a", "U1", 0.9, true))?;
    store.append(report("b", "U2", 0.88, true))?;

    let before = backend.raw(REPORTS_KEY);
    let writes = backend.write_count();

    let remote = Arc::new(CountingRemote::default());
    let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(true));
    let outcome = coordinator.sync_pending()?;

    assert_eq!(outcome.attempted, 0);
    assert!(outcome.is_success());
    assert_eq!(backend.raw(REPORTS_KEY), before);
    assert_eq!(backend.write_count(), writes);
    assert_eq!(remote.total(), 0);
    Ok(())
}

#[test]
fn test_sync_twice_submits_each_report_once() -> anyhow::Result<()> {
    let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
    for i in 0..4 {
        store.append(report(&format!("p-{i}"), "U1", 0.9, false))?;
    }
    store.append(report("done", "U1", 0.9, true))?;

    let remote = Arc::new(CountingRemote::default());
    let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(true));

    let first = coordinator.sync_pending()?;
    let flags_after_once: Vec<_> = store.list_all().into_iter().map(|r| (r.id, r.synced)).collect();
    let second = coordinator.sync_pending()?;
    let flags_after_twice: Vec<_> = store.list_all().into_iter().map(|r| (r.id, r.synced)).collect();

    assert_eq!(first.synced.len(), 4);
    assert_eq!(second.attempted, 0);
    assert_eq!(flags_after_once, flags_after_twice);
    assert_eq!(remote.total(), 4);
    assert_eq!(remote.max_per_id(), 1);
    Ok(())
}

#[test]
fn test_refused_reports_are_retried_later() -> anyhow::Result<()> {
    let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
    store.append(report("p", "U1", 0.9, false))?;

    let remote = Arc::new(CountingRemote::default());
    *remote.refuse.lock().unwrap() = true;
    let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(true));

    let first = coordinator.sync_pending()?;
    assert_eq!(first.failed, vec!["p"]);
    assert_eq!(store.get("p").map(|r| r.synced), Some(false));

    *remote.refuse.lock().unwrap() = false;
    let second = coordinator.sync_pending()?;
    assert_eq!(second.synced, vec!["p"]);
    assert_eq!(store.get("p").map(|r| r.synced), Some(true));
    assert_eq!(remote.total(), 1);
    Ok(())
}

#[test]
fn test_duplicate_id_leaves_size_unchanged() -> anyhow::Result<()> {
    let store = LocalReportStore::open(MemoryBackend::new())?;
    store.append(report("same", "U1", 0.9, false))?;

    let err = store.append(report("same", "U1", 0.95, false)).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(_)));
    assert_eq!(store.len(), 1);
    Ok(())
}

#[test]
fn test_offline_detection_then_reconnect_scenario() -> anyhow::Result<()> {
    let store = Arc::new(LocalReportStore::open(MemoryBackend::new())?);
    let remote = Arc::new(CountingRemote::default());
    let coordinator = OfflineSyncCoordinator::new(store.clone(), remote.clone(), Connectivity::new(false));

    store.append(report("u1-report", "U1", 0.91, coordinator.is_online()))?;
    let created = store.get("u1-report").expect("stored");
    assert!(!created.synced);

    let outcome = coordinator.connectivity_changed(true)?.expect("reconnect triggers sync");
    assert_eq!(outcome.synced, vec!["u1-report"]);

    let synced = store.get("u1-report").expect("still stored");
    assert!(synced.synced);
    assert_eq!(PotholeReport { synced: false, ..synced }, created);
    Ok(())
}
