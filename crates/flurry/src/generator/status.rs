use crate::id::SnowflakeId;

/// Represents the result of a single attempt to generate a Snowflake ID.
///
/// - [`Poll::Ready`] indicates a new ID was generated and the generator state
///   advanced.
/// - [`Poll::Pending`] means the generator cannot issue right now. The caller
///   should wait `yield_for` milliseconds and poll again. State is untouched.
///
/// # Example
///
/// ```
/// use flurry::{BasicSnowflakeGenerator, FlurryId, Poll, SnowflakeId, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = BasicSnowflakeGenerator::<FlurryId, _>::from_components(
///     1,
///     0,
///     FlurryId::max_sequence(),
///     FixedTime,
/// );
/// match generator.poll_id().unwrap() {
///     Poll::Ready { id } => println!("ID: {}", id.timestamp()),
///     Poll::Pending { yield_for, stall } => println!("{stall:?}, back off {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<ID: SnowflakeId> {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: ID,
    },
    /// No ID could be generated yet.
    Pending {
        /// How long to wait, in milliseconds, before polling again.
        yield_for: ID::Ty,
        /// Why the generator is stalled.
        stall: Stall,
    },
}

/// The transient waiting states of a generator.
///
/// Neither is an error; both resolve on their own once the clock moves
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stall {
    /// The clock reads earlier than the last issued timestamp.
    ClockBehind,
    /// All sequence values of the current millisecond have been issued.
    SequenceExhausted,
}
