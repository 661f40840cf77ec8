use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::product_manager::{ProductManager, SweepReport};
use crate::utils::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherStats {
    pub job_id: Option<Uuid>,
    pub interval_secs: u64,
    pub runs: u64,
    pub successes: u64,
    pub failures: u64,
    /// Ticks that found the previous sweep still running.
    pub skipped: u64,
    pub started_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_run_time_ms: u64,
    pub last_report: Option<SweepReport>,
}

impl Default for WatcherStats {
    fn default() -> Self {
        Self {
            job_id: None,
            interval_secs: 0,
            runs: 0,
            successes: 0,
            failures: 0,
            skipped: 0,
            started_at: Utc::now(),
            last_run: None,
            last_success: None,
            last_error: None,
            last_run_time_ms: 0,
            last_report: None,
        }
    }
}

/// Periodic sweeps over every tracked product.
pub struct PriceWatcher {
    scheduler: JobScheduler,
    manager: Arc<Mutex<ProductManager>>,
    stats: Arc<RwLock<WatcherStats>>,
}

impl PriceWatcher {
    pub async fn new(manager: Arc<Mutex<ProductManager>>) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            manager,
            stats: Arc::new(RwLock::new(WatcherStats::default())),
        })
    }

    /// Run one sweep now, then one every `interval` until [`shutdown`](Self::shutdown).
    pub async fn start(&mut self, interval: Duration) -> Result<()> {
        {
            let mut stats = self.stats.write().await;
            stats.interval_secs = interval.as_secs();
            stats.started_at = Utc::now();
        }

        tracing::info!("Running initial sweep");
        {
            let mut manager = self.manager.lock().await;
            Self::execute_sweep(&mut manager, &self.stats).await;
        }

        let manager = Arc::clone(&self.manager);
        let stats = Arc::clone(&self.stats);

        let job = Job::new_repeated_async(interval, move |_uuid, _l| {
            let manager = Arc::clone(&manager);
            let stats = Arc::clone(&stats);

            Box::pin(async move {
                Self::scheduled_tick(manager, stats).await;
            })
        })?;

        let job_id = self.scheduler.add(job).await?;
        self.stats.write().await.job_id = Some(job_id);

        self.scheduler.start().await?;
        tracing::info!("Price watcher started, checking every {}s", interval.as_secs());
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        self.manager.lock().await.notifiers().shutdown().await;
        tracing::info!("Price watcher shutdown");
        Ok(())
    }

    pub async fn stats(&self) -> WatcherStats {
        self.stats.read().await.clone()
    }

    /// One scheduled tick. Skipped when a sweep is already in progress.
    pub async fn tick(&self) {
        Self::scheduled_tick(Arc::clone(&self.manager), Arc::clone(&self.stats)).await;
    }

    async fn scheduled_tick(manager: Arc<Mutex<ProductManager>>, stats: Arc<RwLock<WatcherStats>>) {
        let mut manager = match manager.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("Previous sweep still running, skipping this tick");
                stats.write().await.skipped += 1;
                return;
            }
        };

        Self::execute_sweep(&mut manager, &stats).await;
    }

    async fn execute_sweep(manager: &mut ProductManager, stats: &RwLock<WatcherStats>) {
        let started = Utc::now();
        let start_time = tokio::time::Instant::now();

        let result = manager.check_all().await;

        let mut stats = stats.write().await;
        stats.runs += 1;
        stats.last_run = Some(started);
        stats.last_run_time_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(report) => {
                stats.successes += 1;
                stats.last_success = Some(started);
                stats.last_error = None;
                stats.last_report = Some(report);
            }
            Err(e) => {
                tracing::error!("Sweep aborted: {}", e);
                stats.failures += 1;
                stats.last_error = Some(e.to_string());
            }
        }
    }
}
