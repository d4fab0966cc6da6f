//! Connection handling for the ID daemon.
//!
//! [`IdService`] accepts connections from any stream of transports, serves
//! each one as a request/reply session on its own task, and funnels every
//! request into the single issuing worker.
//!
//! ## Shutdown
//!
//! 1. Stop accepting connections and cancel the shared token. Idle sessions
//!    close; a session with a request in hand answers it first.
//! 2. Wait for sessions to drain. There is no deadline: a session holding a
//!    request stays open until the worker answers it, however long the clock
//!    takes to catch up.
//! 3. Stop the worker once it has answered everything queued.

use crate::server::{service::session::run_session, worker::manager::WorkerHandle};
use core::{future::Future, pin::pin, time::Duration};
use flurry::TimeSource;
use flurry_proto::{
    Error, Result,
    types::{Generator, SnowflakeIdTy},
};
use futures::{Stream, StreamExt};
use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    time::{Instant, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// How often the drain checks for open sessions.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How often a slow drain is reported.
const DRAIN_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Serves IDs over any number of concurrent connections, all backed by one
/// issuing worker.
#[derive(Clone)]
pub struct IdService {
    worker: Arc<WorkerHandle>,
    shutdown_token: CancellationToken,
    sessions_inflight: Arc<AtomicUsize>,
    next_session: Arc<AtomicU64>,
}

impl IdService {
    /// Creates the service and spawns the worker that takes ownership of
    /// `generator`.
    pub fn new<T>(generator: Generator<T>) -> Self
    where
        T: TimeSource<SnowflakeIdTy> + Send + 'static,
    {
        Self {
            worker: Arc::new(WorkerHandle::spawn(generator)),
            shutdown_token: CancellationToken::new(),
            sessions_inflight: Arc::new(AtomicUsize::new(0)),
            next_session: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of sessions currently open.
    pub fn sessions_inflight(&self) -> usize {
        self.sessions_inflight.load(Ordering::Relaxed)
    }

    /// Accepts connections from `incoming` until `signal` completes or the
    /// stream ends, then shuts down gracefully.
    ///
    /// A failed accept is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker could not be shut down cleanly.
    pub async fn serve_with_incoming_shutdown<I, IO, IE, F>(
        &self,
        incoming: I,
        signal: F,
    ) -> Result<()>
    where
        I: Stream<Item = core::result::Result<IO, IE>>,
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        IE: core::fmt::Display,
        F: Future<Output = ()>,
    {
        let mut incoming = pin!(incoming);
        let mut signal = pin!(signal);

        loop {
            tokio::select! {
                () = &mut signal => break,
                conn = incoming.next() => match conn {
                    Some(Ok(io)) => self.spawn_session(io),
                    Some(Err(e)) => tracing::warn!("failed to accept connection: {e}"),
                    None => {
                        tracing::debug!("listener closed");
                        break;
                    }
                },
            }
        }

        self.shutdown().await
    }

    fn spawn_session<IO>(&self, io: IO)
    where
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let guard = SessionGuard::enter(Arc::clone(&self.sessions_inflight));
        let worker = Arc::clone(&self.worker);
        let shutdown = self.shutdown_token.clone();

        let fut = async move {
            let _guard = guard;
            tracing::debug!("session opened");
            match run_session(io, &worker, &shutdown).await {
                Ok(served) => tracing::debug!(served, "session closed"),
                Err(Error::ServiceShutdown) => tracing::debug!("session closed by shutdown"),
                Err(e) => tracing::warn!("session failed: {e}"),
            }
        };

        tokio::spawn(fut.instrument(tracing::debug_span!("session", id = session_id)));
    }

    /// Initiates a graceful shutdown.
    ///
    /// New requests are refused and idle sessions close at once. Sessions
    /// that have already read a request are waited for until they reply, and
    /// the call returns once the worker acknowledges termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker was already gone.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Refusing new requests");
        self.shutdown_token.cancel();

        tracing::info!(
            "Draining in-flight sessions ({} active)",
            self.sessions_inflight()
        );
        let mut last_report = Instant::now();
        while self.sessions_inflight() > 0 {
            sleep(DRAIN_POLL_INTERVAL).await;
            if last_report.elapsed() >= DRAIN_REPORT_INTERVAL {
                tracing::warn!(
                    "Still draining ({} sessions waiting on the worker)",
                    self.sessions_inflight()
                );
                last_report = Instant::now();
            }
        }
        tracing::debug!("All in-flight sessions drained");

        self.worker.shutdown().await?;
        tracing::info!("Worker shutdown complete");
        Ok(())
    }
}

/// Counts a session as in flight until dropped.
struct SessionGuard(Arc<AtomicUsize>);

impl SessionGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
