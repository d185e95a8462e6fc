//! Debounced background saving of a breakdown.
//!
//! Every [`AutoSaver::schedule`] replaces the pending payload and restarts the
//! idle timer; when the timer runs out the latest payload is written (last
//! writer wins). A failed write leaves the payload pending, reports
//! [`SaveStatus::Failed`], and is retried on the next schedule or flush. The
//! caller's in-memory state is never rolled back.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

use crate::db::{EstimateRepository, RepositoryError};
use crate::models::NewSavedBreakdown;

/// Idle period used when the caller has no preference.
pub const DEFAULT_IDLE: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing has been scheduled yet.
    Idle,
    /// Edits are waiting for the idle timer.
    Unsaved,
    Saving,
    Saved { id: i64 },
    /// The last write failed; the payload is still pending.
    Failed(String),
}

#[derive(Debug, Error)]
pub enum AutoSaveError {
    #[error("nothing has been scheduled for saving")]
    NothingToSave,

    #[error("save failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("auto-save worker has stopped")]
    WorkerStopped,
}

enum Command {
    Schedule(Box<NewSavedBreakdown>),
    Flush(oneshot::Sender<Result<i64, AutoSaveError>>),
    Shutdown(oneshot::Sender<Option<i64>>),
}

/// Handle to the background save task.
pub struct AutoSaver {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    worker: JoinHandle<()>,
}

impl AutoSaver {
    /// Starts the worker. `existing_id` continues a breakdown that is already
    /// stored; otherwise the first save creates a new record.
    pub fn spawn(
        repo: Arc<dyn EstimateRepository>,
        idle: Duration,
        existing_id: Option<i64>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let initial = match existing_id {
            Some(id) => SaveStatus::Saved { id },
            None => SaveStatus::Idle,
        };
        let (status_tx, status) = watch::channel(initial);

        let worker = Worker {
            repo,
            idle,
            saved_id: existing_id,
            queued: None,
            deadline: None,
            status: status_tx,
        };
        let worker = tokio::spawn(worker.run(receiver));

        Self {
            commands,
            status,
            worker,
        }
    }

    /// Replaces the pending payload and restarts the idle timer.
    pub fn schedule(
        &self,
        payload: NewSavedBreakdown,
    ) {
        if self.commands.send(Command::Schedule(Box::new(payload))).is_err() {
            error!("auto-save worker has stopped; edit not scheduled");
        }
    }

    /// Writes the pending payload now and returns the stored id.
    ///
    /// With nothing pending, returns the id of the last successful save.
    pub async fn flush(&self) -> Result<i64, AutoSaveError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .map_err(|_| AutoSaveError::WorkerStopped)?;
        response.await.map_err(|_| AutoSaveError::WorkerStopped)?
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Saves anything pending, stops the worker, and returns the last stored id.
    pub async fn shutdown(self) -> Option<i64> {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Shutdown(reply)).is_err() {
            return None;
        }
        let id = response.await.ok().flatten();
        if let Err(e) = self.worker.await {
            error!(error = %e, "auto-save worker panicked");
        }
        id
    }
}

struct Worker {
    repo: Arc<dyn EstimateRepository>,
    idle: Duration,
    saved_id: Option<i64>,
    queued: Option<Box<NewSavedBreakdown>>,
    deadline: Option<Instant>,
    status: watch::Sender<SaveStatus>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        debug!(idle_ms = self.idle.as_millis() as u64, "auto-save worker started");
        loop {
            let deadline = self.deadline;
            let timer = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Schedule(payload)) => {
                        self.queued = Some(payload);
                        self.deadline = Some(Instant::now() + self.idle);
                        self.status.send_replace(SaveStatus::Unsaved);
                    }
                    Some(Command::Flush(reply)) => {
                        let result = self.save().await;
                        let _ = reply.send(result);
                    }
                    Some(Command::Shutdown(reply)) => {
                        if self.queued.is_some() {
                            let _ = self.save().await;
                        }
                        let _ = reply.send(self.saved_id);
                        break;
                    }
                    None => {
                        if self.queued.is_some() {
                            let _ = self.save().await;
                        }
                        break;
                    }
                },
                _ = timer => {
                    let _ = self.save().await;
                }
            }
        }
        debug!("auto-save worker stopped");
    }

    async fn save(&mut self) -> Result<i64, AutoSaveError> {
        self.deadline = None;
        let Some(payload) = self.queued.as_deref() else {
            return self.saved_id.ok_or(AutoSaveError::NothingToSave);
        };

        self.status.send_replace(SaveStatus::Saving);
        let result = match self.saved_id {
            Some(id) => self.repo.update_breakdown(id, payload).await,
            None => self.repo.create_breakdown(payload.clone()).await,
        };

        match result {
            Ok(saved) => {
                info!(id = saved.id, grand_total = %saved.grand_total, "breakdown saved");
                self.saved_id = Some(saved.id);
                self.queued = None;
                self.status.send_replace(SaveStatus::Saved { id: saved.id });
                Ok(saved.id)
            }
            Err(e) => {
                error!(error = %e, "saving breakdown failed; keeping edits in memory");
                self.status.send_replace(SaveStatus::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::{CostBreakdown, SavedBreakdown};

    /// Counts writes and can be told to fail them.
    #[derive(Default)]
    struct FlakyRepository {
        inner: MemoryRepository,
        creates: AtomicUsize,
        updates: AtomicUsize,
        failing: AtomicBool,
    }

    impl FlakyRepository {
        fn check(&self) -> Result<(), RepositoryError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(RepositoryError::Connection("backend unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl EstimateRepository for FlakyRepository {
        async fn create_breakdown(
            &self,
            breakdown: NewSavedBreakdown,
        ) -> Result<SavedBreakdown, RepositoryError> {
            self.check()?;
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create_breakdown(breakdown).await
        }

        async fn get_breakdown(
            &self,
            id: i64,
        ) -> Result<SavedBreakdown, RepositoryError> {
            self.inner.get_breakdown(id).await
        }

        async fn update_breakdown(
            &self,
            id: i64,
            breakdown: &NewSavedBreakdown,
        ) -> Result<SavedBreakdown, RepositoryError> {
            self.check()?;
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update_breakdown(id, breakdown).await
        }

        async fn delete_breakdown(
            &self,
            id: i64,
        ) -> Result<(), RepositoryError> {
            self.inner.delete_breakdown(id).await
        }

        async fn list_breakdowns(
            &self,
            project_name: Option<&str>,
        ) -> Result<Vec<SavedBreakdown>, RepositoryError> {
            self.inner.list_breakdowns(project_name).await
        }
    }

    fn payload(grand_total: Decimal) -> NewSavedBreakdown {
        NewSavedBreakdown {
            project_name: "Kitchen".to_string(),
            address: String::new(),
            base_area: None,
            waste_percent: dec!(10),
            breakdown: CostBreakdown::default(),
            subtotal: grand_total,
            total_tax: Decimal::ZERO,
            grand_total,
        }
    }

    async fn wait_for_saved(saver: &AutoSaver) -> i64 {
        let mut status = saver.subscribe();
        let saved = status
            .wait_for(|s| matches!(s, SaveStatus::Saved { .. }))
            .await
            .expect("worker alive")
            .clone();
        match saved {
            SaveStatus::Saved { id } => id,
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_save_of_the_latest_payload() {
        let repo = Arc::new(FlakyRepository::default());
        let saver = AutoSaver::spawn(repo.clone(), Duration::from_millis(500), None);

        for total in [dec!(100), dec!(200), dec!(300)] {
            saver.schedule(payload(total));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(saver.status(), SaveStatus::Unsaved);
        assert_eq!(repo.creates.load(Ordering::SeqCst), 0);

        let id = wait_for_saved(&saver).await;

        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.get_breakdown(id).await.unwrap().grand_total, dec!(300));
    }

    #[tokio::test(start_paused = true)]
    async fn later_saves_update_the_same_record() {
        let repo = Arc::new(FlakyRepository::default());
        let saver = AutoSaver::spawn(repo.clone(), Duration::from_millis(500), None);

        saver.schedule(payload(dec!(100)));
        let first = saver.flush().await.unwrap();
        saver.schedule(payload(dec!(150)));
        let second = saver.flush().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.updates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.get_breakdown(first).await.unwrap().grand_total, dec!(150));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_keeps_payload_for_retry() {
        let repo = Arc::new(FlakyRepository::default());
        repo.failing.store(true, Ordering::SeqCst);
        let saver = AutoSaver::spawn(repo.clone(), Duration::from_millis(500), None);

        saver.schedule(payload(dec!(100)));
        let err = saver.flush().await.unwrap_err();
        assert!(matches!(err, AutoSaveError::Repository(RepositoryError::Connection(_))));
        assert!(matches!(saver.status(), SaveStatus::Failed(_)));

        repo.failing.store(false, Ordering::SeqCst);
        let id = saver.flush().await.unwrap();

        assert_eq!(repo.get_breakdown(id).await.unwrap().grand_total, dec!(100));
        assert_eq!(saver.status(), SaveStatus::Saved { id });
    }

    #[tokio::test(start_paused = true)]
    async fn flush_with_nothing_pending() {
        let repo = Arc::new(FlakyRepository::default());
        let saver = AutoSaver::spawn(repo.clone(), Duration::from_millis(500), None);

        assert!(matches!(saver.flush().await, Err(AutoSaveError::NothingToSave)));
        assert_eq!(saver.status(), SaveStatus::Idle);

        let resumed = AutoSaver::spawn(repo, Duration::from_millis(500), Some(7));
        assert_eq!(resumed.flush().await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_writes_pending_edits() {
        let repo = Arc::new(FlakyRepository::default());
        let saver = AutoSaver::spawn(repo.clone(), Duration::from_secs(60), None);

        saver.schedule(payload(dec!(42)));
        let id = saver.shutdown().await.expect("saved on shutdown");

        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.get_breakdown(id).await.unwrap().grand_total, dec!(42));
    }
}
