//! Single-flight scheduler that runs reconciliation on demand and on an interval.
//!
//! A trigger arriving while a sync is `Running` is dropped, not queued. Failures
//! pass through `Failed(reason)` back to `Idle`; the periodic loop keeps ticking
//! and the next tick retries from scratch.

use std::{
    fmt,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    core::{mutate_store, reconcile, SharedStore},
    domain::{normalize, Quote, RawEntry},
    errors::{QuoteError, Result},
};

use super::gateway::RemoteGateway;

pub type StatusListener = Box<dyn Fn(&SyncStatus) + Send + Sync>;
pub type NoticeListener = Box<dyn Fn(&Notice) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Running,
    Failed(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Running => write!(f, "running"),
            SyncStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible, non-blocking message about a sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Counts describing one completed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub malformed: usize,
    pub overwritten: usize,
    pub added: usize,
    pub total: usize,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync was already running; nothing was done.
    Skipped,
    Failed(QuoteError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub batch_limit: usize,
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        Self {
            batch_limit: config.batch_limit,
            interval: Duration::from_secs(config.sync_interval_secs.max(1)),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        }
    }
}

pub struct SyncScheduler {
    store: SharedStore,
    gateway: Arc<dyn RemoteGateway>,
    settings: SchedulerSettings,
    status: Mutex<SyncStatus>,
    last_report: Mutex<Option<SyncReport>>,
    status_listeners: RwLock<Vec<StatusListener>>,
    notice_listeners: RwLock<Vec<NoticeListener>>,
}

impl SyncScheduler {
    pub fn new(
        store: SharedStore,
        gateway: Arc<dyn RemoteGateway>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            settings,
            status: Mutex::new(SyncStatus::Idle),
            last_report: Mutex::new(None),
            status_listeners: RwLock::new(Vec::new()),
            notice_listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    pub fn status(&self) -> SyncStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report
            .lock()
            .ok()
            .and_then(|report| report.clone())
    }

    pub fn on_sync_status_changed(&self, listener: impl Fn(&SyncStatus) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.status_listeners.write() {
            listeners.push(Box::new(listener));
        }
    }

    pub fn on_notice(&self, listener: impl Fn(&Notice) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.notice_listeners.write() {
            listeners.push(Box::new(listener));
        }
    }

    /// Runs one sync unless one is already in flight.
    pub async fn trigger(&self) -> SyncOutcome {
        if !self.begin() {
            debug!("sync already running; trigger ignored");
            return SyncOutcome::Skipped;
        }

        let running = RunningGuard::new(self);
        let result = self.run_once().await;
        running.disarm();

        match result {
            Ok(report) => {
                info!(
                    fetched = report.fetched,
                    malformed = report.malformed,
                    overwritten = report.overwritten,
                    added = report.added,
                    total = report.total,
                    "sync completed"
                );
                if let Ok(mut last) = self.last_report.lock() {
                    *last = Some(report.clone());
                }
                self.transition(SyncStatus::Idle);
                self.announce(NoticeLevel::Success, "Quotes synced with server!".into());
                SyncOutcome::Completed(report)
            }
            Err(err) => {
                warn!(error = %err, "sync failed; local quotes left untouched");
                self.transition(SyncStatus::Failed(err.to_string()));
                self.announce(NoticeLevel::Error, format!("Sync failed: {}", err));
                self.transition(SyncStatus::Idle);
                SyncOutcome::Failed(err)
            }
        }
    }

    /// Syncs immediately, then once per interval, until `shutdown` flips to `true` or is dropped.
    pub async fn run_periodic(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval = ?self.settings.interval, "periodic sync started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.trigger().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("periodic sync stopped");
    }

    /// Spawns [`run_periodic`](Self::run_periodic) on the current Tokio runtime.
    pub fn spawn_periodic(self: &Arc<Self>) -> PeriodicHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(self).run_periodic(receiver));
        PeriodicHandle { shutdown, task }
    }

    fn begin(&self) -> bool {
        {
            let mut status = match self.status.lock() {
                Ok(status) => status,
                Err(poisoned) => poisoned.into_inner(),
            };
            if *status == SyncStatus::Running {
                return false;
            }
            *status = SyncStatus::Running;
        }
        self.emit_status(&SyncStatus::Running);
        true
    }

    fn transition(&self, next: SyncStatus) {
        match self.status.lock() {
            Ok(mut status) => *status = next.clone(),
            Err(poisoned) => *poisoned.into_inner() = next.clone(),
        }
        self.emit_status(&next);
    }

    async fn run_once(&self) -> Result<SyncReport> {
        let limit = self.settings.batch_limit;
        let timeout = self.settings.request_timeout;
        let raw = time::timeout(timeout, self.gateway.fetch_batch(limit))
            .await
            .map_err(|_| QuoteError::Gateway(format!("fetch timed out after {:?}", timeout)))??;
        self.apply_batch(&raw)
    }

    fn apply_batch(&self, raw: &[RawEntry]) -> Result<SyncReport> {
        let limit = self.settings.batch_limit;
        let fetched = raw.len().min(limit);
        let mut malformed = 0;
        let remote: Vec<Quote> = raw
            .iter()
            .take(limit)
            .filter_map(|entry| match entry.as_ref().map_err(Clone::clone).and_then(normalize) {
                Ok(quote) => Some(quote),
                Err(err) => {
                    malformed += 1;
                    debug!(error = %err, "skipping remote record");
                    None
                }
            })
            .collect();

        mutate_store(&self.store, |store| {
            let outcome = reconcile(store.all(), &remote);
            let (overwritten, added) = (outcome.overwritten, outcome.added);
            store.replace_all(outcome.merged)?;
            Ok(SyncReport {
                fetched,
                malformed,
                overwritten,
                added,
                total: store.len(),
                finished_at: Utc::now(),
            })
        })
    }

    fn emit_status(&self, status: &SyncStatus) {
        if let Ok(listeners) = self.status_listeners.read() {
            for listener in listeners.iter() {
                listener(status);
            }
        }
    }

    fn announce(&self, level: NoticeLevel, message: String) {
        let notice = Notice { level, message };
        if let Ok(listeners) = self.notice_listeners.read() {
            for listener in listeners.iter() {
                listener(&notice);
            }
        }
    }
}

/// Puts the scheduler back to `Idle` if a trigger is dropped mid-flight.
struct RunningGuard<'a> {
    scheduler: &'a SyncScheduler,
    armed: bool,
}

impl<'a> RunningGuard<'a> {
    fn new(scheduler: &'a SyncScheduler) -> Self {
        Self {
            scheduler,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("sync cancelled before completion");
            self.scheduler.transition(SyncStatus::Idle);
        }
    }
}

/// Handle to a spawned periodic sync loop.
pub struct PeriodicHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PeriodicHandle {
    /// Signals the loop to stop and waits for it. An in-flight sync finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "periodic sync task ended abnormally");
        }
    }
}
