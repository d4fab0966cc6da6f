//! Time-ordered 64-bit identifiers for a single designated issuing machine.
//!
//! An identifier packs three fields, most-significant first:
//!
//! ```text
//!  Bit Index:  63             25 24             10 9              0
//!              +----------------+-----------------+---------------+
//!  Field:      | timestamp (39) | machine ID (15) | sequence (10) |
//!              +----------------+-----------------+---------------+
//!              |<----- MSB ---------- 64 bits --------- LSB ----->|
//! ```
//!
//! The timestamp counts milliseconds since [`FLURRY_EPOCH`]. A generator
//! ([`BasicSnowflakeGenerator`]) owns the sequencing state for one machine ID
//! and guarantees that the `(timestamp, sequence)` pairs it emits are strictly
//! increasing, even when the wall clock steps backwards.
//!
//! ```
//! use flurry::{BasicSnowflakeGenerator, FlurryId, WallClock};
//!
//! let generator = BasicSnowflakeGenerator::<FlurryId, _>::new(7, WallClock::default());
//! let id = generator
//!     .next_id(|ms| std::thread::sleep(std::time::Duration::from_millis(ms)))
//!     .unwrap();
//! assert_eq!(id.machine_id(), 7);
//! ```

mod error;
mod generator;
mod id;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
