//! Shared wire protocol for the flurry ID service.
//!
//! The daemon and its clients speak a strict request/reply protocol over TCP.
//! Every message is one length-delimited frame (a 4-byte big-endian length
//! followed by the payload):
//!
//! - **request**: any payload, including an empty one. The content is
//!   ignored; each frame asks for exactly one ID.
//! - **reply**: exactly 8 bytes, the packed ID as a big-endian `u64`.
//!
//! A client sends its next request only after reading the previous reply.

mod client;
mod common;

pub use client::*;
pub use common::*;
// Public re-export so downstream crates can access `flurry` via
// `flurry_proto::flurry`
pub use flurry;
