//! Remote gateway and the scheduler that drives reconciliation against it.

pub mod gateway;
pub mod scheduler;

pub use gateway::{HttpGateway, RemoteGateway};
pub use scheduler::{
    Notice, NoticeLevel, PeriodicHandle, SchedulerSettings, SyncOutcome, SyncReport,
    SyncScheduler, SyncStatus,
};
