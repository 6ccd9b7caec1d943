use crate::pipeline::Pipeline;
use std::collections::VecDeque;
use std::sync::RwLock;

/// Thread-safe FIFO of pipelines (spec §4.4). Reads (`peek`, `len`, `is_empty`) take a
/// shared lock; writes (`enqueue`, `dequeue`, `clear`) take an exclusive lock, so all
/// operations are linearisable under concurrent use. `dequeue` on an empty queue returns
/// `None` immediately rather than blocking — the worker pool uses a channel for blocking
/// delivery, not the queue itself (spec §4.4/§4.7).
#[derive(Default)]
pub struct PipelineQueue {
    inner: RwLock<VecDeque<Pipeline>>,
}

impl PipelineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `pipeline.enqueued_at = now` and appends it to the tail of the queue.
    pub fn enqueue(&self, mut pipeline: Pipeline) {
        pipeline.enqueued_at = Some(chrono::Utc::now());
        self.inner.write().unwrap().push_back(pipeline);
    }

    /// Removes and returns the head of the queue, or `None` if empty.
    pub fn dequeue(&self) -> Option<Pipeline> {
        self.inner.write().unwrap().pop_front()
    }

    /// Returns a clone of the head of the queue without removing it.
    pub fn peek(&self) -> Option<Pipeline> {
        self.inner.read().unwrap().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }
}
