use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

/// Flurry epoch: Monday, May 14, 2012 12:53:20 UTC (Unix second 1337000000).
///
/// The 39-bit timestamp field covers roughly 17.4 years past this instant.
pub const FLURRY_EPOCH: Duration = Duration::from_secs(1_337_000_000);

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the system clock or a simulated time
/// source in tests.
///
/// The timestamp type `T` is generic (typically `u64`), and the unit is
/// expected to be **milliseconds** relative to a configurable origin.
///
/// # Example
///
/// ```
/// use flurry::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> T;
}

impl<T, S> TimeSource<T> for &S
where
    S: TimeSource<T> + ?Sized,
{
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

/// A time source that samples the system wall clock on every call, offset from
/// a fixed epoch.
///
/// Unlike a monotonic clock, this follows every adjustment made to the system
/// time, including backwards steps from NTP or a resumed VM. The generator is
/// what keeps issued timestamps from going backwards.
///
/// A wall clock that reads earlier than the epoch reports `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClock {
    epoch: Duration,
}

impl Default for WallClock {
    /// Constructs a wall clock aligned to [`FLURRY_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(FLURRY_EPOCH)
    }
}

impl WallClock {
    /// Constructs a wall clock using a custom epoch as the origin (t = 0),
    /// specified as a [`Duration`] since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }

    /// Returns the configured origin.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl TimeSource<u64> for WallClock {
    fn current_millis(&self) -> u64 {
        let since_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let offset = since_unix.saturating_sub(self.epoch).as_millis();
        u64::try_from(offset).unwrap_or(u64::MAX)
    }
}

/// Converts a timestamp offset (milliseconds since [`FLURRY_EPOCH`]) back into
/// a wall-clock instant.
///
/// For display only; the generator never reads this back.
pub fn to_absolute_time(timestamp: u64) -> SystemTime {
    UNIX_EPOCH + FLURRY_EPOCH + Duration::from_millis(timestamp)
}
