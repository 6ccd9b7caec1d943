use crate::pipeline::Pipeline;
use crate::queue::PipelineQueue;
use crate::runner::{Runner, StatementExecutor};
use city2tabula_sql::Config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Result of running a worker pool to completion: how many pipelines failed after
/// exhausting retries. A failed pipeline never aborts its peers (spec §4.7/§5).
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolOutcome {
    pub failed_pipelines: usize,
}

/// Drains `queue` into a freshly created, already-closed channel of the given
/// capacity (spec §4.7: "the orchestrator pre-loads the channel before closing
/// it; no back-pressure beyond channel capacity is modelled"). Capacity is sized
/// to the queue's length so every pipeline is always accepted without blocking.
pub fn channel_from_queue(queue: &PipelineQueue) -> tokio::sync::mpsc::Receiver<Pipeline> {
    let capacity = queue.len().max(1);
    let (tx, rx) = tokio::sync::mpsc::channel(capacity);
    while let Some(pipeline) = queue.dequeue() {
        tx.try_send(pipeline)
            .expect("channel capacity sized to queue length at construction time");
    }
    // Dropping `tx` here closes the channel: once drained, `rx.recv()` returns `None`.
    rx
}

/// Runs `worker_count` concurrent consumers draining `pipelines` until the channel
/// closes and is fully drained (spec §4.7). Each worker owns its own [`Runner`] and
/// shares no in-process state with its peers beyond the channel and this function's
/// join barrier, which stands in for the source's wait-group.
pub async fn run_worker_pool<E>(
    worker_count: usize,
    pipelines: tokio::sync::mpsc::Receiver<Pipeline>,
    executor: E,
    config: Arc<Config>,
) -> PoolOutcome
where
    E: StatementExecutor + Clone + 'static,
{
    let receiver = Arc::new(tokio::sync::Mutex::new(pipelines));
    let failed = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(worker_count);

    for worker_id in 0..worker_count.max(1) {
        let receiver = receiver.clone();
        let executor = executor.clone();
        let config = config.clone();
        let failed = failed.clone();

        handles.push(tokio::spawn(async move {
            let runner = Runner::new(config);
            loop {
                let next = { receiver.lock().await.recv().await };
                let Some(pipeline) = next else { break };

                if let Err(err) = runner.run_pipeline(&pipeline, &executor, worker_id).await {
                    tracing::error!(
                        worker_id,
                        pipeline_id = %pipeline.id,
                        error = %err,
                        "pipeline failed after exhausting retries; worker moves to the next pipeline"
                    );
                    failed.fetch_add(1, Ordering::SeqCst);
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    PoolOutcome {
        failed_pipelines: failed.load(Ordering::SeqCst),
    }
}
