//! Error types for the ID service and its clients.
//!
//! ## Error Cases
//! - `Io`: The socket failed while reading or writing a frame.
//! - `ChannelError`: An internal communication failure between tasks.
//! - `IdGeneration`: The generator refused to issue (clock out of range).
//! - `MalformedReply`: A reply frame was not exactly 8 bytes.
//! - `ConnectionClosed`: The peer hung up mid-exchange.
//! - `ServiceShutdown`: A request arrived while the service was shutting down.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the ID service.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Transport failure on the underlying connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// Underlying Snowflake ID generation failed.
    #[error("ID error: {0}")]
    IdGeneration(#[from] flurry::Error),

    /// The server replied with something other than one packed ID.
    #[error("Malformed reply: expected 8 bytes, got {len}")]
    MalformedReply { len: usize },

    /// The connection closed before a reply arrived.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}
