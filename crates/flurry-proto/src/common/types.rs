//! # Common Snowflake ID Types and Constants
//!
//! The types and constants the daemon and its clients must agree on for the
//! binary protocol to line up.
//!
//! ## Type Aliases
//!
//! - [`SnowflakeId`] - The ID type issued by the service ([`FlurryId`])
//! - [`SnowflakeIdTy`] - The primitive integer backing the ID (`u64`)
//! - [`Clock`] - The system clock used for timestamp embedding
//! - [`Generator`] - The generator owned by the issuing worker
//!
//! ## Constants
//!
//! - [`SNOWFLAKE_ID_SIZE`] - Size (in bytes) of a serialized ID
//! - [`EPOCH`] - Epoch offset used for timestamp generation
//! - [`DEFAULT_PORT`] - Port the daemon listens on unless configured
//!
//! > The ID layout is fixed at compile time. Changing it breaks every deployed
//! > client, so it is not configurable at runtime.

use flurry::{BasicSnowflakeGenerator, FLURRY_EPOCH, FlurryId, WallClock};

/// The Snowflake ID type issued by the service.
pub type SnowflakeId = FlurryId;

/// The primitive integer type that backs a [`SnowflakeId`].
pub type SnowflakeIdTy = <SnowflakeId as flurry::SnowflakeId>::Ty;

/// The number of bytes in a serialized [`SnowflakeId`]. Every reply frame
/// carries exactly this many bytes, big-endian.
pub const SNOWFLAKE_ID_SIZE: usize = FlurryId::WIRE_SIZE;

/// The system clock used by the generator for timestamp encoding.
pub type Clock = WallClock;

/// The epoch offset used as the zero-point for timestamp calculations.
pub const EPOCH: core::time::Duration = FLURRY_EPOCH;

/// The generator owned by the issuing worker.
///
/// The clock is a type parameter so the service can be driven by a simulated
/// clock in tests.
pub type Generator<T = Clock> = BasicSnowflakeGenerator<SnowflakeId, T>;

/// Port the daemon binds unless configured otherwise.
pub const DEFAULT_PORT: u16 = 23138;

/// Upper bound on an inbound request frame. The payload is ignored, so
/// anything larger is treated as a broken peer.
pub const MAX_REQUEST_FRAME: usize = 64 * 1024;
