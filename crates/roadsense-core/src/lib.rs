//! RoadSense core library
//!
//! Report data model, the offline-first local store and the sync contract
//! that reconciles locally recorded reports with a remote counterpart.

pub mod clock;
pub mod error;
pub mod location;
pub mod model;
pub mod service;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use error::{BackendError, RemoteError, StoreError};
pub use location::{FixedLocation, GeoPoint, LocationSource};
pub use model::{PotholeReport, User, UserRole};
pub use service::ReportService;
pub use store::{FileBackend, LocalReportStore, MemoryBackend, SeedPolicy, StateBackend};
pub use sync::{Connectivity, OfflineSyncCoordinator, RemoteReportSink, SyncReport};
