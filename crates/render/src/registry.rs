// crates/render/src/registry.rs
//! Bookkeeping for live render jobs.
//!
//! The registry holds an entry for a job id iff that job's process is
//! currently live; absence means "never submitted" or "already
//! resolved". Deregistration is the single point of truth for the race
//! between cancellation and natural process exit: whichever path removes
//! the entry owns the job's one terminal event, and the loser treats the
//! missing entry as a no-op.

use std::collections::HashMap;
use std::sync::RwLock;

use animatic_types::JobId;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A job with this id is already live. Resubmission is rejected
    /// rather than replacing the existing process.
    #[error("job id already live: {0}")]
    DuplicateJob(JobId),
}

/// Registry-side handle for one live job.
///
/// The `Child` itself is owned exclusively by the supervisor task; the
/// entry only carries the cancellation side of its kill channel.
pub struct JobEntry {
    kill_tx: oneshot::Sender<()>,
}

impl JobEntry {
    pub fn new(kill_tx: oneshot::Sender<()>) -> Self {
        Self { kill_tx }
    }

    /// Ask the supervisor task to terminate the process. Returns false
    /// when the supervisor is already gone (the process exited first).
    pub fn kill(self) -> bool {
        self.kill_tx.send(()).is_ok()
    }
}

/// Map from job id to live-job entry.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a newly spawned job. Rejects an id that is already live.
    pub fn register(&self, id: JobId, entry: JobEntry) -> Result<(), RegistryError> {
        let mut jobs = self.write_jobs();
        if jobs.contains_key(&id) {
            return Err(RegistryError::DuplicateJob(id));
        }
        jobs.insert(id, entry);
        Ok(())
    }

    /// Whether a job with this id is currently live.
    pub fn contains(&self, id: &str) -> bool {
        self.read_jobs().contains_key(id)
    }

    /// Remove and return the entry for `id`, if it is still live.
    pub fn deregister(&self, id: &str) -> Option<JobEntry> {
        self.write_jobs().remove(id)
    }

    /// Remove every live entry, for shutdown.
    pub fn drain(&self) -> Vec<(JobId, JobEntry)> {
        self.write_jobs().drain().collect()
    }

    pub fn len(&self) -> usize {
        self.read_jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_jobs().is_empty()
    }

    fn read_jobs(&self) -> std::sync::RwLockReadGuard<'_, HashMap<JobId, JobEntry>> {
        // A poisoned lock only means a writer panicked; the map is still
        // consistent for our insert/remove usage.
        self.jobs.read().unwrap_or_else(|e| {
            tracing::error!("job registry lock poisoned: {e}");
            e.into_inner()
        })
    }

    fn write_jobs(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.write().unwrap_or_else(|e| {
            tracing::error!("job registry lock poisoned: {e}");
            e.into_inner()
        })
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> (JobEntry, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (JobEntry::new(tx), rx)
    }

    #[test]
    fn test_register_and_contains() {
        let registry = JobRegistry::new();
        assert!(!registry.contains("j1"));

        let (e, _rx) = entry();
        registry.register("j1".to_string(), e).unwrap();
        assert!(registry.contains("j1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let registry = JobRegistry::new();
        let (e1, _rx1) = entry();
        let (e2, _rx2) = entry();

        registry.register("j1".to_string(), e1).unwrap();
        let err = registry.register("j1".to_string(), e2).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateJob(id) if id == "j1"));
        // The original entry is untouched.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_is_single_shot() {
        let registry = JobRegistry::new();
        let (e, _rx) = entry();
        registry.register("j1".to_string(), e).unwrap();

        assert!(registry.deregister("j1").is_some());
        assert!(registry.deregister("j1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_kill_reaches_supervisor() {
        let registry = JobRegistry::new();
        let (e, mut rx) = entry();
        registry.register("j1".to_string(), e).unwrap();

        let entry = registry.deregister("j1").unwrap();
        assert!(entry.kill());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_kill_after_supervisor_gone() {
        let (e, rx) = entry();
        drop(rx);
        assert!(!e.kill());
    }

    #[test]
    fn test_drain_clears_everything() {
        let registry = JobRegistry::new();
        let (e1, _rx1) = entry();
        let (e2, _rx2) = entry();
        registry.register("a".to_string(), e1).unwrap();
        registry.register("b".to_string(), e2).unwrap();

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }
}
