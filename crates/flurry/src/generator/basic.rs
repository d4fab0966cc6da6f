use core::{cell::Cell, cmp::Ordering};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::{Poll, SnowflakeGenerator, Stall},
    id::{SnowflakeId, ToU64},
    time::TimeSource,
};

/// A non-concurrent Snowflake ID generator for a single issuing loop.
///
/// The generator owns the sequencing state of one machine ID: the timestamp
/// and sequence of the last issued ID. It is **not thread-safe**; issuance is
/// expected to be serialized by whoever owns it.
///
/// Every call samples the clock. Three outcomes are possible:
///
/// - the clock moved forward: issue with sequence `0`;
/// - same millisecond: issue with the next sequence, or stall with
///   [`Stall::SequenceExhausted`] once the sequence field is spent;
/// - the clock moved backwards: stall with [`Stall::ClockBehind`] until it
///   catches up with the last issued timestamp.
///
/// A stall never changes the state, so the `(timestamp, sequence)` pairs of
/// issued IDs are strictly increasing over the generator's lifetime.
pub struct BasicSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource<ID::Ty>,
{
    state: Cell<ID>,
    time: T,
}

impl<ID, T> BasicSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource<ID::Ty>,
{
    /// Creates a new [`BasicSnowflakeGenerator`] for a given machine ID.
    ///
    /// The last issued timestamp and sequence start at zero. `time` is
    /// sampled on every generation.
    ///
    /// # Example
    /// ```
    /// use flurry::{BasicSnowflakeGenerator, FlurryId, WallClock};
    ///
    /// let generator = BasicSnowflakeGenerator::<FlurryId, _>::new(1234, WallClock::default());
    /// let id = generator.next_id(|_| std::thread::yield_now()).unwrap();
    /// assert_eq!(id.machine_id(), 1234);
    /// ```
    pub fn new(machine_id: ID::Ty, time: T) -> Self {
        Self::from_components(ID::ZERO, machine_id, ID::ZERO, time)
    }

    /// Creates a new generator from explicit component values.
    ///
    /// `timestamp` and `sequence` are taken as the last issued ones, so the
    /// next ID will sort after `(timestamp, sequence)`.
    pub fn from_components(
        timestamp: ID::Ty,
        machine_id: ID::Ty,
        sequence: ID::Ty,
        time: T,
    ) -> Self {
        let id = ID::from_components(timestamp, machine_id, sequence);
        Self {
            state: Cell::new(id),
            time,
        }
    }

    /// Returns the machine ID stamped into every issued ID.
    pub fn machine_id(&self) -> ID::Ty {
        self.state.get().machine_id()
    }

    /// Returns the state as an ID: the last issued timestamp and sequence.
    pub fn last_issued(&self) -> ID {
        self.state.get()
    }

    /// Generates a new ID, calling `wait` with a millisecond hint whenever the
    /// generator has to stall.
    ///
    /// # Example
    /// ```
    /// use flurry::{BasicSnowflakeGenerator, FlurryId, WallClock};
    /// use std::{thread, time::Duration};
    ///
    /// let generator = BasicSnowflakeGenerator::<FlurryId, _>::new(0, WallClock::default());
    /// let id = generator
    ///     .next_id(|ms| thread::sleep(Duration::from_millis(ms)))
    ///     .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestampOverflow`] if the clock has run past the
    /// timestamp field.
    pub fn next_id(&self, wait: impl FnMut(ID::Ty)) -> Result<ID> {
        <Self as SnowflakeGenerator<ID, T>>::next_id(self, wait)
    }

    /// Attempts to generate a new ID without blocking.
    ///
    /// # Example
    /// ```
    /// use flurry::{BasicSnowflakeGenerator, FlurryId, Poll, WallClock};
    ///
    /// let generator = BasicSnowflakeGenerator::<FlurryId, _>::new(0, WallClock::default());
    ///
    /// let id = loop {
    ///     match generator.poll_id().unwrap() {
    ///         Poll::Ready { id } => break id,
    ///         Poll::Pending { yield_for, .. } => {
    ///             std::thread::sleep(std::time::Duration::from_millis(yield_for));
    ///         }
    ///     }
    /// };
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestampOverflow`] if the clock has run past the
    /// timestamp field.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll<ID>> {
        let now = self.time.current_millis();
        if now > ID::max_timestamp() {
            return Err(Error::TimestampOverflow {
                timestamp: now.to_u64(),
            });
        }

        let state = self.state.get();
        let current_ts = state.timestamp();

        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if state.has_sequence_room() {
                    let updated = state.increment_sequence();
                    self.state.set(updated);
                    Ok(Poll::Ready { id: updated })
                } else {
                    Ok(Poll::Pending {
                        yield_for: ID::ONE,
                        stall: Stall::SequenceExhausted,
                    })
                }
            }
            Ordering::Greater => {
                let updated = state.rollover_to_timestamp(now);
                self.state.set(updated);
                Ok(Poll::Ready { id: updated })
            }
            Ordering::Less => Ok(Self::cold_clock_behind(now, current_ts)),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: ID::Ty, current_ts: ID::Ty) -> Poll<ID> {
        let yield_for = current_ts - now;
        #[cfg(feature = "tracing")]
        tracing::warn!(%now, last = %current_ts, "clock moved backwards, holding issuance");
        Poll::Pending {
            yield_for,
            stall: Stall::ClockBehind,
        }
    }
}

impl<ID, T> SnowflakeGenerator<ID, T> for BasicSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource<ID::Ty>,
{
    fn new(machine_id: ID::Ty, time: T) -> Self {
        Self::new(machine_id, time)
    }

    fn machine_id(&self) -> ID::Ty {
        self.machine_id()
    }

    fn poll_id(&self) -> Result<Poll<ID>> {
        self.poll_id()
    }
}
