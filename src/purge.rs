//! Scheduled removal of expired soft-deleted tasks.
//!
//! Soft-deleted tasks are kept for `retention_days`. Once a day, at 02:00
//! UTC, every task deleted before `now - retention_days` is removed for good.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::store::TaskStore;

/// Hour of the day (UTC) at which the purge runs.
pub const PURGE_HOUR: i64 = 2;

pub struct PurgeJob {
    store: Arc<dyn TaskStore>,
    retention_days: i64,
}

impl PurgeJob {
    pub fn new(store: Arc<dyn TaskStore>, retention_days: i64) -> Self {
        log::info!(
            "Task purge job initialized with a retention period of {} days.",
            retention_days
        );
        Self {
            store,
            retention_days,
        }
    }

    /// `now - retention_days`, or an error if that is not a representable date.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        Duration::try_days(self.retention_days)
            .and_then(|retention| now.checked_sub_signed(retention))
            .ok_or_else(|| {
                AppError::InternalFault(format!(
                    "Retention of {} days is out of range",
                    self.retention_days
                ))
            })
    }

    /// Permanently deletes tasks soft-deleted before the cutoff for `now`.
    /// Returns how many were removed; zero is a normal outcome.
    pub async fn purge_deleted_tasks(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        log::info!("Starting scheduled task: purging old soft-deleted tasks.");
        let cutoff = self.cutoff(now)?;
        log::debug!("Calculated cutoff date for task purge: {}", cutoff);

        let purged = self.store.purge_deleted_before(cutoff).await?;
        if purged > 0 {
            log::info!("Successfully purged {} old soft-deleted tasks.", purged);
        } else {
            log::info!("No old soft-deleted tasks found to purge.");
        }
        Ok(purged)
    }

    /// Runs the job every day at `PURGE_HOUR`, one run at a time, for as long
    /// as the runtime lives. A failed run is logged and the next one still
    /// happens.
    pub fn spawn(self) -> JoinHandle<()> {
        actix_web::rt::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_run_after(now);
                log::debug!("Next task purge scheduled for {}", next);
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                if let Err(e) = self.purge_deleted_tasks(Utc::now()).await {
                    log::error!("Task purge failed: {}", e);
                }
            }
        })
    }
}

/// The first `PURGE_HOUR:00:00` UTC strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc() + Duration::hours(PURGE_HOUR);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, NewUser, TaskStatus};
    use crate::store::{MemoryStore, UserStore};
    use chrono::TimeZone;

    #[test]
    fn test_next_run_after() {
        let before = Utc.with_ymd_and_hms(2025, 6, 1, 1, 30, 0).unwrap();
        assert_eq!(
            next_run_after(before),
            Utc.with_ymd_and_hms(2025, 6, 1, 2, 0, 0).unwrap()
        );

        let exactly = Utc.with_ymd_and_hms(2025, 6, 1, 2, 0, 0).unwrap();
        assert_eq!(
            next_run_after(exactly),
            Utc.with_ymd_and_hms(2025, 6, 2, 2, 0, 0).unwrap()
        );

        let end_of_month = Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap();
        assert_eq!(
            next_run_after(end_of_month),
            Utc.with_ymd_and_hms(2025, 7, 1, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_cutoff_uses_retention_days() {
        let job = PurgeJob::new(Arc::new(MemoryStore::new()), 30);
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 2, 0, 0).unwrap();
        assert_eq!(
            job.cutoff(now).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 31, 2, 0, 0).unwrap()
        );
    }

    #[actix_rt::test]
    async fn test_unrepresentable_cutoff_fails_the_run_without_panicking() {
        let store = Arc::new(MemoryStore::new());
        let job = PurgeJob::new(store.clone(), 100_000_000);
        assert!(matches!(
            job.cutoff(Utc::now()),
            Err(AppError::InternalFault(_))
        ));
        assert!(job.purge_deleted_tasks(Utc::now()).await.is_err());

        let job = PurgeJob::new(store, i64::MAX);
        assert!(job.cutoff(Utc::now()).is_err());
    }

    #[actix_rt::test]
    async fn test_purge_removes_only_expired_soft_deleted_tasks() {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .insert_user(NewUser {
                name: "A".into(),
                email: "a@x.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let now = Utc::now();

        let mut ids = Vec::new();
        for (title, deleted_days_ago) in [("old", Some(31)), ("recent", Some(10)), ("active", None)]
        {
            let mut task = store
                .insert_task(NewTask {
                    title: title.into(),
                    description: "...".into(),
                    status: TaskStatus::Done,
                    owner_id: user.id,
                })
                .await
                .unwrap();
            if let Some(days) = deleted_days_ago {
                task.soft_delete(now - Duration::days(days));
                store.save_task(&task).await.unwrap();
            }
            ids.push(task.id);
        }

        let job = PurgeJob::new(store.clone(), 30);
        assert_eq!(job.purge_deleted_tasks(now).await.unwrap(), 1);
        assert!(store.find_task_even_if_deleted(ids[0]).await.unwrap().is_none());
        assert!(store.find_task_even_if_deleted(ids[1]).await.unwrap().is_some());
        assert!(store.find_task(ids[2]).await.unwrap().is_some());

        // Nothing left to purge is not an error.
        assert_eq!(job.purge_deleted_tasks(now).await.unwrap(), 0);
    }
}
