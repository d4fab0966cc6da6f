//! TCP service implementation and session handling.
//!
//! ## Structure
//!
//! - [`handler`] - Accept loop, session bookkeeping and shutdown (`IdService`).
//! - [`session`] - The per-connection request/reply loop.

pub mod handler;
pub mod session;
