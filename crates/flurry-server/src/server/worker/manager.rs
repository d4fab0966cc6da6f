//! Handle to the issuing worker.
//!
//! [`WorkerHandle`] is the only way into the worker: sessions submit
//! [`WorkRequest::Next`] through it and the service stops the worker through
//! it. Once shutdown has begun the handle refuses new work with
//! [`Error::ServiceShutdown`], while requests already queued are still
//! answered.

use crate::server::worker::{request::WorkRequest, task::worker_loop};
use flurry::TimeSource;
use flurry_proto::{
    Error, Result,
    types::{Generator, SnowflakeId, SnowflakeIdTy},
};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Number of requests that may wait for the worker before senders are held
/// back.
pub const WORK_QUEUE_DEPTH: usize = 64;

/// Submits work to the single issuing worker.
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkRequest>,
    closed: CancellationToken,
}

impl WorkerHandle {
    /// Spawns the worker task, which takes ownership of `generator`.
    pub fn spawn<T>(generator: Generator<T>) -> Self
    where
        T: TimeSource<SnowflakeIdTy> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(WORK_QUEUE_DEPTH);
        tokio::spawn(worker_loop(rx, generator));

        Self {
            tx,
            closed: CancellationToken::new(),
        }
    }

    /// Requests one ID and waits for it, including any stall of the generator.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if shutdown has begun.
    /// - [`Error::ChannelError`] if the worker is gone.
    /// - [`Error::IdGeneration`] if the generator refused to issue.
    pub async fn next_id(&self) -> Result<SnowflakeId> {
        if self.closed.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let (response, rx) = oneshot::channel();
        self.tx
            .send(WorkRequest::Next { response })
            .await
            .map_err(|_| Error::ChannelError {
                context: "worker channel closed".to_string(),
            })?;

        rx.await.map_err(|_| Error::ChannelError {
            context: "worker dropped the request".to_string(),
        })?
    }

    /// Stops the worker after it has answered everything already queued.
    ///
    /// Waits for the acknowledgement without a deadline: a request queued
    /// ahead of `Shutdown` may be waiting on the clock, and it is answered
    /// before the worker stops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if the worker is already gone.
    pub async fn shutdown(&self) -> Result<()> {
        self.closed.cancel();

        let (response, ack) = oneshot::channel();
        self.tx
            .send(WorkRequest::Shutdown { response })
            .await
            .map_err(|_| Error::ChannelError {
                context: "worker channel closed before shutdown".to_string(),
            })?;

        tracing::debug!("waiting for the worker to acknowledge shutdown");
        ack.await.map_err(|_| Error::ChannelError {
            context: "worker dropped the shutdown acknowledgement".to_string(),
        })?;
        tracing::trace!("worker shutdown acknowledged");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing::{ManualClock, SimClock};
    use core::time::Duration;
    use std::sync::Arc;
    use tokio::time::{Instant, sleep};

    #[tokio::test]
    async fn issues_through_the_worker() {
        let clock = ManualClock::at(10_000);
        let worker = WorkerHandle::spawn(Generator::<ManualClock>::new(1234, clock.clone()));

        let a = worker.next_id().await.unwrap();
        let b = worker.next_id().await.unwrap();
        clock.advance(1);
        let c = worker.next_id().await.unwrap();

        assert_eq!(a.into_components(), (10_000, 1234, 0));
        assert_eq!(b.into_components(), (10_000, 1234, 1));
        assert_eq!(c.into_components(), (10_001, 1234, 0));
    }

    #[tokio::test]
    async fn refuses_work_after_shutdown() {
        let worker = WorkerHandle::spawn(Generator::<ManualClock>::new(1, ManualClock::at(5)));
        worker.next_id().await.unwrap();

        worker.shutdown().await.unwrap();

        assert!(matches!(
            worker.next_id().await,
            Err(Error::ServiceShutdown)
        ));
        assert!(matches!(
            worker.shutdown().await,
            Err(Error::ChannelError { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_requests_never_share_an_id() {
        let worker = Arc::new(WorkerHandle::spawn(Generator::<ManualClock>::new(
            9,
            ManualClock::at(42),
        )));

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let worker = worker.clone();
                tokio::spawn(async move { worker.next_id().await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.timestamp() == 42));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_a_request_stalled_on_the_clock() {
        let clock = SimClock::at(100_000);
        let worker = Arc::new(WorkerHandle::spawn(Generator::<SimClock>::new(
            3,
            clock.clone(),
        )));
        let first = worker.next_id().await.unwrap();

        // A minute behind the last issued ID.
        clock.set(40_000);
        let pending = tokio::spawn({
            let worker = Arc::clone(&worker);
            async move { worker.next_id().await }
        });
        sleep(Duration::from_millis(1)).await;

        let started = Instant::now();
        worker.shutdown().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(59));

        let id = pending.await.unwrap().unwrap();
        assert_eq!(id.machine_id(), 3);
        assert!(id.timestamp() >= 100_000);
        assert!(id > first);
    }
}
