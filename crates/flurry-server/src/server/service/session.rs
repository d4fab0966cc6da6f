use crate::server::worker::manager::WorkerHandle;
use flurry_proto::{
    Result,
    codec::{encode_reply, frame_codec},
};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::{codec::Framed, sync::CancellationToken};

/// Serves one connection until the peer hangs up or shutdown begins.
///
/// Each inbound frame is one request; its payload is ignored. The reply to a
/// request is written before the next frame is read. `shutdown` is only
/// observed while waiting for a request, so a request that has been read is
/// always answered.
///
/// Returns the number of IDs served.
///
/// # Errors
///
/// Transport failures (including an oversized request frame) and worker
/// failures end the session with an error; the connection is closed when
/// `io` is dropped.
pub async fn run_session<IO>(
    io: IO,
    worker: &WorkerHandle,
    shutdown: &CancellationToken,
) -> Result<u64>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, frame_codec());
    let mut served = 0;

    loop {
        let frame = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            frame = framed.next() => frame,
        };

        // Peer closed the connection.
        let Some(frame) = frame else { break };
        let _request = frame?;

        let id = worker.next_id().await?;
        framed.send(encode_reply(id)).await?;
        served += 1;
    }

    Ok(served)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing::ManualClock;
    use flurry_proto::{IdClient, types::Generator};
    use tokio::io::duplex;

    #[tokio::test]
    async fn replies_to_each_request_in_turn() {
        let worker = WorkerHandle::spawn(Generator::<ManualClock>::new(77, ManualClock::at(3)));
        let shutdown = CancellationToken::new();
        let (client_io, server_io) = duplex(256);

        let client = async move {
            let mut client = IdClient::new(client_io);
            let mut ids = Vec::new();
            for _ in 0..5 {
                ids.push(client.next_id().await.unwrap());
            }
            ids
        };

        let (served, ids) = tokio::join!(run_session(server_io, &worker, &shutdown), client);

        assert_eq!(served.unwrap(), 5);
        for (seq, id) in ids.iter().enumerate() {
            assert_eq!(id.into_components(), (3, 77, seq as u64));
        }
    }

    #[tokio::test]
    async fn idle_session_ends_on_shutdown() {
        let worker = WorkerHandle::spawn(Generator::<ManualClock>::new(1, ManualClock::at(3)));
        let shutdown = CancellationToken::new();
        let (_client_io, server_io) = duplex(256);

        shutdown.cancel();
        let served = run_session(server_io, &worker, &shutdown).await.unwrap();
        assert_eq!(served, 0);
    }
}
