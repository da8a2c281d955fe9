//! Offline-first reconciliation of locally stored reports

pub mod connectivity;
pub mod coordinator;

pub use connectivity::Connectivity;
pub use coordinator::{OfflineSyncCoordinator, SyncReport};

use crate::error::RemoteError;
use crate::model::PotholeReport;

/// Remote counterpart that accepts reports.
///
/// Implementations are expected to be at-most-once per report id: pushing
/// an id the remote already holds must not create a second record.
pub trait RemoteReportSink: Send + Sync {
    fn push(&self, report: &PotholeReport) -> Result<(), RemoteError>;
}
