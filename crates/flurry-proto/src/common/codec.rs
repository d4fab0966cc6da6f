//! Framing and reply encoding.

use bytes::Bytes;
use tokio_util::codec::LengthDelimitedCodec;

use crate::{
    Error, Result,
    types::{MAX_REQUEST_FRAME, SNOWFLAKE_ID_SIZE, SnowflakeId},
};

/// Builds the frame codec shared by both ends of a connection: a 4-byte
/// big-endian length prefix followed by the payload.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(MAX_REQUEST_FRAME)
        .new_codec()
}

/// Serializes an ID into a reply payload.
pub fn encode_reply(id: SnowflakeId) -> Bytes {
    Bytes::copy_from_slice(&id.to_be_bytes())
}

/// Parses a reply payload.
///
/// # Errors
///
/// Returns [`Error::MalformedReply`] unless the payload is exactly
/// [`SNOWFLAKE_ID_SIZE`] bytes.
pub fn decode_reply(payload: &[u8]) -> Result<SnowflakeId> {
    let bytes: [u8; SNOWFLAKE_ID_SIZE] = payload
        .try_into()
        .map_err(|_| Error::MalformedReply { len: payload.len() })?;
    Ok(SnowflakeId::from_be_bytes(bytes))
}
