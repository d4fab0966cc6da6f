use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, ToSocketAddrs},
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::{
    Error, Result,
    codec::{decode_reply, frame_codec},
    types::SnowflakeId,
};

/// A request/reply session with an ID daemon.
///
/// Each call sends one request frame and waits for its reply before
/// returning, so a session never has more than one request in flight.
///
/// ```no_run
/// # async fn run() -> flurry_proto::Result<()> {
/// let mut client = flurry_proto::IdClient::connect("127.0.0.1:23138").await?;
/// let id = client.next_id().await?;
/// println!("{id}");
/// # Ok(())
/// # }
/// ```
pub struct IdClient<S = TcpStream> {
    framed: Framed<S, LengthDelimitedCodec>,
}

impl IdClient<TcpStream> {
    /// Connects to a daemon over TCP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the connection cannot be established.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S> IdClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already connected stream.
    pub fn new(io: S) -> Self {
        Self {
            framed: Framed::new(io, frame_codec()),
        }
    }

    /// Requests one ID with an empty payload.
    ///
    /// # Errors
    ///
    /// See [`IdClient::request`].
    pub async fn next_id(&mut self) -> Result<SnowflakeId> {
        self.request(Bytes::new()).await
    }

    /// Sends `payload` as a request and decodes the reply. The daemon ignores
    /// the payload content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on transport failure, [`Error::ConnectionClosed`]
    /// if the daemon hangs up before replying, and [`Error::MalformedReply`]
    /// if the reply is not exactly one packed ID.
    pub async fn request(&mut self, payload: Bytes) -> Result<SnowflakeId> {
        self.framed.send(payload).await?;
        let frame = self.framed.next().await.ok_or(Error::ConnectionClosed)??;
        decode_reply(&frame)
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_reply;
    use tokio::io::duplex;

    #[tokio::test]
    async fn request_round_trips_through_frames() {
        let (client_io, server_io) = duplex(256);
        let mut server = Framed::new(server_io, frame_codec());

        let serve = async move {
            let mut payloads = Vec::new();
            for raw in [7_u64, 8] {
                let frame = server.next().await.unwrap().unwrap();
                payloads.push(frame.freeze());
                server
                    .send(encode_reply(SnowflakeId::from_raw(raw)))
                    .await
                    .unwrap();
            }
            payloads
        };

        let mut client = IdClient::new(client_io);
        let ask = async move {
            let a = client.next_id().await.unwrap();
            let b = client.request(Bytes::from_static(b"x")).await.unwrap();
            (a, b)
        };

        let (payloads, (a, b)) = tokio::join!(serve, ask);
        assert_eq!(a.to_raw(), 7);
        assert_eq!(b.to_raw(), 8);
        assert!(payloads[0].is_empty());
        assert_eq!(payloads[1].as_ref(), b"x");
    }

    #[tokio::test]
    async fn short_reply_is_malformed() {
        let (client_io, server_io) = duplex(256);
        let mut server = Framed::new(server_io, frame_codec());

        let serve = async move {
            server.next().await.unwrap().unwrap();
            server.send(Bytes::from_static(&[1, 2, 3])).await.unwrap();
        };
        let mut client = IdClient::new(client_io);

        let ((), res) = tokio::join!(serve, client.next_id());
        assert!(matches!(res, Err(Error::MalformedReply { len: 3 })));
    }

    #[tokio::test]
    async fn hang_up_before_reply_is_reported() {
        let (client_io, server_io) = duplex(256);
        let mut server = Framed::new(server_io, frame_codec());

        let serve = async move {
            server.next().await.unwrap().unwrap();
            drop(server);
        };
        let mut client = IdClient::new(client_io);

        let ((), res) = tokio::join!(serve, client.next_id());
        assert!(matches!(res, Err(Error::ConnectionClosed)));
    }
}
