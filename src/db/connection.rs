use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Opens the file, applies connection pragmas and brings the schema current.
fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL mode unavailable for {}: {err}", path.display());
    }
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

/// Drains tasks until every sender is gone.
fn run_worker(mut conn: Connection, tasks: mpsc::Receiver<DbTask>) {
    for task in tasks {
        task(&mut conn);
    }
    info!("Database thread shutting down");
}

struct DatabaseInner {
    path: PathBuf,
    // Both are `Option` only so `drop` can close the queue before joining.
    tasks: Option<mpsc::Sender<DbTask>>,
    worker: Option<JoinHandle<()>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        drop(self.tasks.take());
        if let Some(handle) = self.worker.take() {
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Handle to the SQLite store.
///
/// Every statement runs on one dedicated worker thread, so writes for a given
/// key are applied in the order they were submitted and a reader never sees a
/// half-written row. Clones share the same worker, which exits once the last
/// clone is dropped.
#[derive(Clone)]
pub struct Database {
    inner: std::sync::Arc<DatabaseInner>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (task_tx, task_rx) = mpsc::channel::<DbTask>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);
        let thread_path = db_path.clone();

        let worker = thread::Builder::new()
            .name("weather-db".into())
            .spawn(move || match open_connection(&thread_path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        run_worker(conn, task_rx);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn database worker thread")?;

        let ready = ready_rx
            .recv()
            .context("database worker exited before signaling readiness");
        if let Err(err) = ready.and_then(|init| init) {
            let _ = worker.join();
            return Err(err);
        }

        info!("Database initialized at {}", db_path.display());

        Ok(Self {
            inner: std::sync::Arc::new(DatabaseInner {
                path: db_path,
                tasks: Some(task_tx),
                worker: Some(worker),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Run `task` on the worker thread and await its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tasks = self
            .inner
            .tasks
            .as_ref()
            .ok_or_else(|| anyhow!("database is shutting down"))?;
        let (reply_tx, reply_rx) = oneshot::channel();

        tasks
            .send(Box::new(move |conn| {
                // The caller may have been cancelled; its result is then moot.
                let _ = reply_tx.send(task(conn));
            }))
            .map_err(|_| anyhow!("database worker is no longer running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}
