//! Deadline-bounded attribute reads
//!
//! A sysfs read is normally instantaneous, but a misbehaving driver can
//! block it indefinitely. [`TimeoutReader`] performs reads on a worker thread
//! and gives up after a fixed deadline. The worker that missed the deadline
//! is abandoned and a fresh one takes over on the next read, so one hung
//! attribute does not stall every later read.
//!
//! The path that timed out stays quarantined until its abandoned worker
//! comes back: reads of it fail at once instead of abandoning another
//! thread. A permanently hung attribute therefore costs one thread, not one
//! per tick.

use crate::SysfsReader;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type ReadReply = io::Result<String>;

struct ReadJob {
    path: PathBuf,
    reply: Sender<ReadReply>,
}

/// Wraps a reader so that `read_to_string` fails with
/// `io::ErrorKind::TimedOut` once the deadline passes.
///
/// Directory listing and existence checks are passed straight through; they
/// only happen during discovery.
pub struct TimeoutReader {
    inner: Arc<dyn SysfsReader>,
    timeout: Duration,
    /// `None` after the worker was abandoned; respawned on the next read
    worker: Mutex<Option<Sender<ReadJob>>>,
    /// Timed-out paths and the reply channel of their outstanding read
    quarantine: Mutex<HashMap<PathBuf, Receiver<ReadReply>>>,
}

impl TimeoutReader {
    pub fn new(inner: Arc<dyn SysfsReader>, timeout: Duration) -> io::Result<Self> {
        let worker = spawn_worker(Arc::clone(&inner))?;
        Ok(Self {
            inner,
            timeout,
            worker: Mutex::new(Some(worker)),
            quarantine: Mutex::new(HashMap::new()),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of paths whose timed-out read has not returned yet
    pub fn quarantined(&self) -> usize {
        self.quarantine().len()
    }

    fn worker(&self) -> MutexGuard<'_, Option<Sender<ReadJob>>> {
        self.worker.lock().unwrap_or_else(|poisoned| {
            log::warn!("Timeout reader mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn quarantine(&self) -> MutexGuard<'_, HashMap<PathBuf, Receiver<ReadReply>>> {
        self.quarantine.lock().unwrap_or_else(|poisoned| {
            log::warn!("Timeout reader quarantine was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fails fast while an earlier read of `path` is still hung, and lifts
    /// the quarantine once that read has returned
    fn check_quarantine(&self, path: &Path) -> io::Result<()> {
        let mut quarantine = self.quarantine();
        let Some(pending) = quarantine.get(path) else {
            return Ok(());
        };
        match pending.try_recv() {
            Err(TryRecvError::Empty) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("an earlier read of {} has not returned", path.display()),
            )),
            _ => {
                quarantine.remove(path);
                log::debug!("Read of {} returned, lifting quarantine", path.display());
                Ok(())
            }
        }
    }

    /// Hand a job to the current worker, starting one if needed
    fn dispatch(&self, job: ReadJob) -> io::Result<()> {
        let mut worker = self.worker();
        if worker.is_none() {
            *worker = Some(spawn_worker(Arc::clone(&self.inner))?);
        }
        let sent = worker
            .as_ref()
            .map(|sender| sender.send(job).is_ok())
            .unwrap_or(false);
        if !sent {
            *worker = None;
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "sysfs reader thread has stopped",
            ));
        }
        Ok(())
    }

    /// Drop the current worker; it exits once its pending read returns
    fn abandon_worker(&self) {
        *self.worker() = None;
    }
}

fn spawn_worker(inner: Arc<dyn SysfsReader>) -> io::Result<Sender<ReadJob>> {
    let (tx, rx) = channel::unbounded::<ReadJob>();
    std::thread::Builder::new()
        .name("sysfs-reader".to_string())
        .spawn(move || {
            // Exits once every sender is gone, i.e. after being abandoned
            for job in rx {
                // The requester may have given up already
                let _ = job.reply.send(inner.read_to_string(&job.path));
            }
        })?;
    Ok(tx)
}

impl SysfsReader for TimeoutReader {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_dir(dir)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.check_quarantine(path)?;

        let (reply, response) = channel::bounded(1);
        self.dispatch(ReadJob {
            path: path.to_path_buf(),
            reply,
        })?;

        match response.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::debug!(
                    "Read of {} exceeded {:?}, abandoning reader thread",
                    path.display(),
                    self.timeout
                );
                self.abandon_worker();
                self.quarantine().insert(path.to_path_buf(), response);
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("read timed out after {:?}", self.timeout),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.abandon_worker();
                Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "sysfs reader thread exited mid-read",
                ))
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
}
