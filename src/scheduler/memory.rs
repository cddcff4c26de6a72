//! In-memory scheduler backend
//!
//! Mirrors the commit discipline of a transactional scheduler store:
//! `create_task` and `delete_task` stage operations that stay invisible to
//! `find_tasks_by_key` until `commit` applies them, in staging order.
//! Used by the daemon tests and as the default backend when no external
//! scheduler is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::SchedulerService;
use crate::core::error::ReconcilerResult;
use crate::core::types::{ScheduledTask, TaskId};

enum StagedOp {
    Create(ScheduledTask),
    Delete(TaskId),
}

#[derive(Default)]
pub struct InMemoryScheduler {
    committed: DashMap<TaskId, ScheduledTask>,
    staged: Mutex<Vec<StagedOp>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged operations not yet committed
    pub fn staged_len(&self) -> usize {
        self.staged.lock().len()
    }
}

#[async_trait]
impl SchedulerService for InMemoryScheduler {
    async fn find_tasks_by_key(&self, key: &str) -> ReconcilerResult<Vec<ScheduledTask>> {
        let mut tasks: Vec<ScheduledTask> = self
            .committed
            .iter()
            .filter(|entry| entry.value().key == key)
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by_key(|task| task.execute_at);
        Ok(tasks)
    }

    async fn delete_task(&self, id: TaskId) -> ReconcilerResult<()> {
        self.staged.lock().push(StagedOp::Delete(id));
        Ok(())
    }

    async fn create_task(&self, task: ScheduledTask) -> ReconcilerResult<()> {
        self.staged.lock().push(StagedOp::Create(task));
        Ok(())
    }

    async fn commit(&self) -> ReconcilerResult<()> {
        let ops = std::mem::take(&mut *self.staged.lock());
        for op in ops {
            match op {
                StagedOp::Create(task) => {
                    self.committed.insert(task.id, task);
                }
                StagedOp::Delete(id) => {
                    self.committed.remove(&id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_staged_create_is_invisible_until_commit() {
        let scheduler = InMemoryScheduler::new();
        scheduler
            .create_task(ScheduledTask::new("reports.daily", Utc::now()))
            .await
            .unwrap();

        assert!(scheduler
            .find_tasks_by_key("reports.daily")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(scheduler.staged_len(), 1);

        scheduler.commit().await.unwrap();
        assert_eq!(
            scheduler
                .find_tasks_by_key("reports.daily")
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(scheduler.staged_len(), 0);
    }

    #[tokio::test]
    async fn test_committed_delete_removes_task() {
        let scheduler = InMemoryScheduler::new();
        let task = ScheduledTask::new("reports.daily", Utc::now());
        let id = task.id;
        scheduler.create_task(task).await.unwrap();
        scheduler.commit().await.unwrap();

        scheduler.delete_task(id).await.unwrap();
        // Still visible while the delete is only staged
        assert_eq!(
            scheduler
                .find_tasks_by_key("reports.daily")
                .await
                .unwrap()
                .len(),
            1
        );

        scheduler.commit().await.unwrap();
        assert!(scheduler
            .find_tasks_by_key("reports.daily")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_commit_applies_operations_in_order() {
        let scheduler = InMemoryScheduler::new();
        let task = ScheduledTask::new("reports.daily", Utc::now());
        let id = task.id;

        scheduler.create_task(task).await.unwrap();
        scheduler.delete_task(id).await.unwrap();
        scheduler.commit().await.unwrap();

        assert!(scheduler
            .find_tasks_by_key("reports.daily")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_find_filters_by_key() {
        let scheduler = InMemoryScheduler::new();
        scheduler
            .create_task(ScheduledTask::new("reports.daily", Utc::now()))
            .await
            .unwrap();
        scheduler
            .create_task(ScheduledTask::new("cleanup.hourly", Utc::now()))
            .await
            .unwrap();
        scheduler.commit().await.unwrap();

        assert_eq!(
            scheduler
                .find_tasks_by_key("reports.daily")
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            scheduler
                .find_tasks_by_key("cleanup.hourly")
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(scheduler.find_tasks_by_key("missing").await.unwrap().is_empty());
    }
}
