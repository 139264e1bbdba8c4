use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

const ENABLE_LOGS: bool = true;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Request {
    Run(Job),
    Close,
}

/// Handle to the thread that owns the connection. Dropping the last
/// [`Database`] clone closes the connection and joins the thread.
struct Worker {
    requests: mpsc::Sender<Request>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let thread = self
            .thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(thread) = thread else {
            return;
        };

        if self.requests.send(Request::Close).is_err() {
            crate::log_error!("Storage thread was gone before close");
        }
        if thread.join().is_err() {
            crate::log_error!("Storage thread panicked");
        }
    }
}

/// Session storage: one SQLite connection owned by a worker thread.
///
/// Queries are closures run on that thread in arrival order, so the tracker's
/// whole-collection writes never interleave.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    location: Arc<PathBuf>,
}

impl Database {
    pub fn new(location: PathBuf) -> Result<Self> {
        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create storage directory {}", parent.display())
            })?;
        }

        let file = location.clone();
        Self::start(location, move || {
            let conn = Connection::open(&file)?;
            if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                crate::log_warn!("Storage stays in rollback-journal mode: {err}");
            }
            Ok(conn)
        })
    }

    /// Throwaway storage for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        Self::start(PathBuf::from(":memory:"), Connection::open_in_memory)
    }

    fn start<F>(location: PathBuf, open: F) -> Result<Self>
    where
        F: FnOnce() -> rusqlite::Result<Connection> + Send + 'static,
    {
        let (requests, inbox) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread = thread::Builder::new()
            .name("studytrack-db".into())
            .spawn(move || {
                let opened = open()
                    .context("failed to open session storage")
                    .and_then(|mut conn| {
                        run_migrations(&mut conn).context("failed to migrate session storage")?;
                        Ok(conn)
                    });

                let mut conn = match opened {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Ok(Request::Run(job)) = inbox.recv() {
                    job(&mut conn);
                }
                crate::log_debug!("Storage thread closing");
            })
            .context("failed to start storage thread")?;

        ready_rx
            .recv()
            .context("storage thread stopped before it was ready")??;

        crate::log_info!("Session storage ready at {}", location.display());

        Ok(Self {
            worker: Arc::new(Worker {
                requests,
                thread: Mutex::new(Some(thread)),
            }),
            location: Arc::new(location),
        })
    }

    pub fn path(&self) -> &Path {
        self.location.as_path()
    }

    /// Run `task` on the storage thread. `action` names the work in errors,
    /// e.g. "list study sessions".
    pub async fn execute<F, T>(&self, action: &'static str, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, answer) = oneshot::channel();

        let job: Job = Box::new(move |conn| {
            if reply.send(task(conn)).is_err() {
                crate::log_warn!("Result of '{action}' had no one waiting for it");
            }
        });

        self.worker
            .requests
            .send(Request::Run(job))
            .map_err(|_| anyhow!("cannot {action}: storage thread has stopped"))?;

        answer
            .await
            .map_err(|_| anyhow!("storage thread stopped during {action}"))?
            .with_context(|| format!("failed to {action}"))
    }
}
