use crate::job::Job;
use uuid::Uuid;

/// An ordered sequence of jobs sharing a building-ID scope (spec §3). Every job in a
/// pipeline is intended to run against the pipeline's `building_ids`; jobs execute
/// sequentially in non-decreasing priority order (enforced by [`crate::runner::Runner`],
/// not by this type).
#[derive(Clone, Debug)]
pub struct Pipeline {
    pub id: Uuid,
    pub building_ids: Vec<i64>,
    pub jobs: Vec<Job>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Set by [`crate::queue::PipelineQueue::enqueue`] on insertion; `None` before that.
    pub enqueued_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Pipeline {
    pub fn new(building_ids: Vec<i64>, jobs: Vec<Job>) -> Self {
        Self {
            id: Uuid::new_v4(),
            building_ids,
            jobs,
            created_at: chrono::Utc::now(),
            enqueued_at: None,
        }
    }

    pub fn add_job(&mut self, job: Job) {
        self.jobs.push(job);
    }
}
