use core::fmt;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `flurry` can emit.
///
/// Clock regression and sequence exhaustion are *not* errors: the generator
/// reports them as [`Poll::Pending`] and the caller waits. The only failure is
/// a clock that has run past what the timestamp field can represent.
///
/// [`Poll::Pending`]: crate::Poll::Pending
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Error {
    /// The current time offset no longer fits in the timestamp field.
    ///
    /// Packing it anyway would wrap the timestamp and break ordering, so the
    /// generator refuses to issue.
    TimestampOverflow {
        /// The offending offset, in milliseconds since the epoch.
        timestamp: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampOverflow { timestamp } => write!(
                f,
                "timestamp offset {timestamp}ms exceeds the {}-bit timestamp field",
                crate::FlurryId::TIMESTAMP_BITS
            ),
        }
    }
}

impl core::error::Error for Error {}
