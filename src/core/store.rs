use crate::core::model::{JobId, JobRecord};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory job table shared by the dispatcher, the workers and the
/// pollers. Each call is one critical section, so a mutation is observed
/// either entirely or not at all.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> JobId {
        let mut jobs = self.jobs.write().await;
        let mut id = Uuid::new_v4();
        while jobs.contains_key(&id) {
            id = Uuid::new_v4();
        }
        jobs.insert(id, JobRecord::new());
        id
    }

    pub async fn get(&self, id: JobId) -> Option<JobRecord> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).cloned()
    }

    /// Project a record without cloning it.
    pub async fn view<R>(&self, id: JobId, f: impl FnOnce(&JobRecord) -> R) -> Option<R> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).map(f)
    }

    /// Apply `f` to the record if it still exists. `None` means the id is
    /// unknown and nothing was changed.
    pub async fn mutate<R>(&self, id: JobId, f: impl FnOnce(&mut JobRecord) -> R) -> Option<R> {
        let mut jobs = self.jobs.write().await;
        jobs.get_mut(&id).map(f)
    }

    pub async fn remove(&self, id: JobId) -> Option<JobRecord> {
        let mut jobs = self.jobs.write().await;
        jobs.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
