use std::sync::Arc;

use herald_core::SubscriberId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::error::QueueError;
use crate::pipeline::DispatchPipeline;

/// Emitted exactly once, when a subscriber row is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberCreated {
    pub subscriber_id: SubscriberId,
}

/// Sending half of the bounded dispatch channel.
///
/// Enqueueing never waits: a full or closed queue drops the event and
/// reports it, leaving the subscriber row in place.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::Sender<SubscriberCreated>,
}

impl DispatchQueue {
    /// Create a queue holding at most `capacity` undelivered events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SubscriberCreated>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, event: SubscriberCreated) -> Result<(), QueueError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(event) => {
                warn!(subscriber_id = %event.subscriber_id, "dispatch queue full, dropping event");
                QueueError::Full(event.subscriber_id)
            }
            TrySendError::Closed(event) => {
                warn!(subscriber_id = %event.subscriber_id, "dispatch queue closed, dropping event");
                QueueError::Closed(event.subscriber_id)
            }
        })
    }
}

/// Consumes [`SubscriberCreated`] events and runs one dispatch per event.
///
/// At most `max_concurrent` dispatches run at once. Each runs in its own
/// task so a slow integration only holds up its own subscriber.
pub struct DispatchWorker {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
    tracker: TaskTracker,
}

impl DispatchWorker {
    pub fn spawn(
        pipeline: Arc<DispatchPipeline>,
        mut rx: mpsc::Receiver<SubscriberCreated>,
        max_concurrent: usize,
    ) -> Self {
        let tracker = TaskTracker::new();
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task_tracker = tracker.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => {
                        let Some(event) = event else {
                            debug!("dispatch queue closed");
                            break;
                        };
                        run(&pipeline, &semaphore, &task_tracker, event).await;
                    }
                    _ = shutdown_rx.recv() => {
                        // Stop accepting, then drain what was already queued.
                        rx.close();
                        while let Some(event) = rx.recv().await {
                            run(&pipeline, &semaphore, &task_tracker, event).await;
                        }
                        break;
                    }
                }
            }
        });

        info!(max_concurrent, "dispatch worker started");
        Self {
            shutdown_tx,
            handle,
            tracker,
        }
    }

    /// Number of dispatches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting events and wait for every queued and in-flight
    /// dispatch to finish.
    pub async fn shutdown(self) {
        // The loop may already have exited if every sender was dropped.
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            error!(error = %e, "dispatch worker task failed");
        }
        self.tracker.close();
        self.tracker.wait().await;
        info!("dispatch worker shutdown complete");
    }
}

async fn run(
    pipeline: &Arc<DispatchPipeline>,
    semaphore: &Arc<Semaphore>,
    tracker: &TaskTracker,
    event: SubscriberCreated,
) {
    let Ok(permit) = Arc::clone(semaphore).acquire_owned().await else {
        return;
    };
    let pipeline = Arc::clone(pipeline);
    tracker.spawn(async move {
        let _permit = permit;
        match pipeline.dispatch(&event.subscriber_id).await {
            Ok(report) => debug!(
                subscriber_id = %event.subscriber_id,
                attempts = report.attempts.len(),
                "dispatch finished"
            ),
            Err(e) => error!(
                subscriber_id = %event.subscriber_id,
                error = %e,
                "dispatch failed"
            ),
        }
    });
}
