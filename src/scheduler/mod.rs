//! # Scheduler Module
//!
//! Two ways to keep reconciliation running periodically:
//!
//! - [`RecurringScheduler`] registers maintenance tasks with an external
//!   [`SchedulerService`], for deployments where a platform scheduler owns
//!   task execution. Exactly one pending task exists under the well-known
//!   key at any time; stale duplicates are cleaned up before each
//!   registration.
//! - [`MaintenanceLoop`] owns a periodic ticker inside the process, for
//!   daemon deployments. This is the primary orchestration; the external
//!   scheduler path exists for platforms without an always-on process.
//!
//! Scheduler failures are propagated, not absorbed: a failed registration
//! has no self-healing path and the caller must see it.

mod memory;
mod ticker;

pub use memory::InMemoryScheduler;
pub use ticker::MaintenanceLoop;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::MaintenanceConfig;
use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::{ScheduledTask, TaskId, MAINTENANCE_TASK_KEY};
use crate::driver::MaintenanceDriver;

/// External scheduler contract
///
/// Mutations (`create_task`, `delete_task`) are staged and take effect on
/// [`commit`](SchedulerService::commit); `find_tasks_by_key` reads
/// committed state only.
#[async_trait]
pub trait SchedulerService: Send + Sync {
    /// All committed tasks registered under the given key
    async fn find_tasks_by_key(&self, key: &str) -> ReconcilerResult<Vec<ScheduledTask>>;

    /// Stage the removal of one task
    async fn delete_task(&self, id: TaskId) -> ReconcilerResult<()>;

    /// Stage the creation of one task
    async fn create_task(&self, task: ScheduledTask) -> ReconcilerResult<()>;

    /// Apply every staged mutation
    async fn commit(&self) -> ReconcilerResult<()>;
}

/// Keeps a maintenance task registered with an external scheduler
///
/// Collaborators are injected at construction; the delay values come from
/// [`MaintenanceConfig`].
pub struct RecurringScheduler {
    scheduler: Arc<dyn SchedulerService>,
    driver: Arc<MaintenanceDriver>,
    bootstrap_delay: Duration,
    recurring_delay: Duration,
}

impl RecurringScheduler {
    pub fn new(
        scheduler: Arc<dyn SchedulerService>,
        driver: Arc<MaintenanceDriver>,
        maintenance: &MaintenanceConfig,
    ) -> Self {
        Self {
            scheduler,
            driver,
            bootstrap_delay: maintenance.bootstrap_delay,
            recurring_delay: maintenance.recurring_delay,
        }
    }

    /// Startup entry point: run one immediate pass, then register the first
    /// scheduled task
    pub async fn initialize(&self) -> ReconcilerResult<()> {
        let outcome = self.driver.run_once(false).await;
        info!(
            "Startup reconciliation pass complete ({} live, {} configured, replaced: {})",
            outcome.live_count, outcome.configured_count, outcome.replaced
        );

        self.register_next(self.bootstrap_delay).await
    }

    /// Ensure exactly one pending maintenance task exists, due after the
    /// recurring delay
    pub async fn schedule_next(&self) -> ReconcilerResult<()> {
        self.register_next(self.recurring_delay).await
    }

    /// Task body invoked by the external scheduler
    ///
    /// The next task is registered before the pass runs, so continuation of
    /// the chain never depends on what happens inside the pass body.
    pub async fn run_scheduled(&self) -> ReconcilerResult<()> {
        self.schedule_next().await?;
        self.driver.run_once(false).await;
        Ok(())
    }

    async fn register_next(&self, delay: Duration) -> ReconcilerResult<()> {
        let pending = self.scheduler.find_tasks_by_key(MAINTENANCE_TASK_KEY).await?;
        for task in &pending {
            debug!("Deleting stale maintenance task {}", task.id);
            self.scheduler.delete_task(task.id).await?;
        }
        self.scheduler.commit().await?;

        let remaining = self.scheduler.find_tasks_by_key(MAINTENANCE_TASK_KEY).await?;
        if remaining.is_empty() {
            let delay = chrono::Duration::from_std(delay)
                .map_err(|e| ReconcilerError::scheduler(format!("Delay out of range: {}", e)))?;
            let task = ScheduledTask::maintenance(Utc::now() + delay);

            debug!("Registering maintenance task {} due at {}", task.id, task.execute_at);
            self.scheduler.create_task(task).await?;
            self.scheduler.commit().await?;
        }

        Ok(())
    }
}
