use crate::{error::Result, generator::Poll, id::SnowflakeId, time::TimeSource};

/// A minimal interface for generating Snowflake IDs.
pub trait SnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource<ID::Ty>,
{
    /// Creates a new generator.
    fn new(machine_id: ID::Ty, time: T) -> Self;

    /// Returns the machine ID stamped into every issued ID.
    fn machine_id(&self) -> ID::Ty;

    /// Attempts to generate the next available ID without blocking.
    ///
    /// The returned [`Poll`] contains either:
    /// - the newly generated ID, or
    /// - a duration to wait before polling again.
    ///
    /// # Errors
    ///
    /// Returns an error if the clock has run past the timestamp field.
    fn poll_id(&self) -> Result<Poll<ID>>;

    /// Generates the next ID, calling `wait(yield_for)` for as long as the
    /// generator is stalled.
    ///
    /// The clock is re-sampled after every wait, so a blocked call only
    /// returns once the clock has caught up.
    ///
    /// # Errors
    ///
    /// Returns an error if the clock has run past the timestamp field.
    fn next_id(&self, mut wait: impl FnMut(ID::Ty)) -> Result<ID> {
        loop {
            match self.poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for, .. } => wait(yield_for),
            }
        }
    }
}
