//! Formation lease adapters.
//!
//! The lease guarantees at most one formation cycle runs at a time.
//! [`MutexLease`] covers a single process; [`FileLease`] extends the
//! guarantee to every process sharing a data directory, leaning on the
//! OS to drop the flock if the holder dies.

use crate::error::{AnchorError, AnchorResult};
use crate::ports::outbound::{FormationLease, LeaseHandle};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

const LOCK_FILE: &str = "FORMATION_LOCK";

/// In-process lease for single-node deployments and tests.
#[derive(Default)]
pub struct MutexLease {
    inner: Arc<Mutex<()>>,
}

impl MutexLease {
    pub fn new() -> Self {
        Self::default()
    }
}

struct MutexLeaseHandle {
    _guard: OwnedMutexGuard<()>,
}

impl LeaseHandle for MutexLeaseHandle {}

#[async_trait]
impl FormationLease for MutexLease {
    async fn try_acquire(&self) -> AnchorResult<Option<Box<dyn LeaseHandle>>> {
        match self.inner.clone().try_lock_owned() {
            Ok(guard) => Ok(Some(Box::new(MutexLeaseHandle { _guard: guard }))),
            Err(_) => Ok(None),
        }
    }
}

/// File-backed lease shared by every process pointed at the same data
/// directory.
pub struct FileLease {
    lock_path: PathBuf,
}

impl FileLease {
    pub fn new(data_dir: impl AsRef<Path>) -> AnchorResult<Self> {
        let dir = data_dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| AnchorError::Store {
            reason: format!("cannot create data directory {}: {}", dir.display(), e),
        })?;
        Ok(Self {
            lock_path: dir.join(LOCK_FILE),
        })
    }
}

struct FileLeaseHandle {
    file: File,
    path: PathBuf,
}

impl LeaseHandle for FileLeaseHandle {}

impl Drop for FileLeaseHandle {
    fn drop(&mut self) {
        // The file stays in place: removing it would let a waiter that
        // already opened the old inode lock a file nobody else sees.
        if let Err(e) = self.file.unlock() {
            warn!("[lease] Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

#[async_trait]
impl FormationLease for FileLease {
    async fn try_acquire(&self) -> AnchorResult<Option<Box<dyn LeaseHandle>>> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.lock_path)
            .map_err(|e| AnchorError::Store {
                reason: format!("cannot open lease file {}: {}", self.lock_path.display(), e),
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                let pid = std::process::id();
                // Only the holder truncates; losers never get here.
                let _ = file.set_len(0);
                if let Err(e) = writeln!(file, "{pid}") {
                    warn!("[lease] Could not record holder pid: {}", e);
                }
                debug!(
                    "[lease] Acquired formation lease at {} (pid {})",
                    self.lock_path.display(),
                    pid
                );
                Ok(Some(Box::new(FileLeaseHandle {
                    file,
                    path: self.lock_path.clone(),
                })))
            }
            Err(_) => {
                debug!(
                    "[lease] Formation lease at {} is held elsewhere",
                    self.lock_path.display()
                );
                Ok(None)
            }
        }
    }
}
