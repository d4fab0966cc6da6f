use crate::server::worker::request::WorkRequest;
use core::time::Duration;
use flurry::{Poll, TimeSource};
use flurry_proto::{
    Result,
    types::{Generator, SnowflakeId, SnowflakeIdTy},
};
use tokio::{sync::mpsc, time::sleep};

/// Worker task that owns the [`Generator`] and answers [`WorkRequest`]s.
///
/// Requests are handled strictly one after another, so every issued ID comes
/// from a single sequencing state and a stalled generator holds up everything
/// queued behind it. The loop ends on [`WorkRequest::Shutdown`] or when every
/// sender is gone.
///
/// This function is designed to be spawned as a Tokio task.
pub async fn worker_loop<T>(mut rx: mpsc::Receiver<WorkRequest>, mut generator: Generator<T>)
where
    T: TimeSource<SnowflakeIdTy>,
{
    let machine_id = generator.machine_id();
    tracing::debug!(machine_id, "worker started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Next { response } => {
                let result = issue(&mut generator).await;
                if let Err(e) = &result {
                    tracing::error!(machine_id, "failed to issue ID: {e}");
                }
                if response.send(result).is_err() {
                    tracing::debug!(machine_id, "requester went away before the reply");
                }
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!(machine_id, "worker received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!(machine_id, "worker failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::debug!(machine_id, "worker stopped");
}

/// Issues one ID, sleeping on the Tokio timer for as long as the generator is
/// stalled.
///
/// The wait has no upper bound: a clock that stepped back an hour stalls
/// issuance for an hour.
///
/// # Errors
///
/// Returns [`flurry_proto::Error::IdGeneration`] if the clock has run past the
/// timestamp field.
// Use `&mut` so this `Send` future doesn't require `Generator: Sync`.
#[allow(clippy::needless_pass_by_ref_mut)]
pub async fn issue<T>(generator: &mut Generator<T>) -> Result<SnowflakeId>
where
    T: TimeSource<SnowflakeIdTy>,
{
    loop {
        let poll = generator.poll_id()?;
        match poll {
            Poll::Ready { id } => return Ok(id),
            Poll::Pending { yield_for, stall } => {
                tracing::trace!(?stall, yield_for, "generator stalled");
                sleep(Duration::from_millis(yield_for)).await;
            }
        }
    }
}
