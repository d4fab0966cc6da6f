use core::{
    fmt,
    hash::Hash,
    ops::{Add, Sub},
};
use std::time::SystemTime;

use crate::time::to_absolute_time;

/// Trait for converting numeric-like values into a `u64`.
///
/// Lets errors report a clock reading whatever scalar type backs the ID.
pub trait ToU64 {
    fn to_u64(self) -> u64;
}

impl ToU64 for u64 {
    fn to_u64(self) -> u64 {
        self
    }
}

/// A trait representing a layout-compatible Snowflake ID.
///
/// This abstracts the behavior of an ID with separate bit fields for
/// timestamp, machine ID, and sequence, so the generator can be written once
/// against any layout.
///
/// # Example
///
/// ```
/// use flurry::{FlurryId, SnowflakeId};
///
/// let id = FlurryId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.machine_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
pub trait SnowflakeId:
    Sized + Copy + Clone + fmt::Display + fmt::Debug + PartialOrd + Ord + PartialEq + Eq + Hash
{
    /// Scalar type for all bit fields (typically `u64`)
    type Ty: Copy
        + Clone
        + Add<Output = Self::Ty>
        + Sub<Output = Self::Ty>
        + Ord
        + PartialOrd
        + Eq
        + PartialEq
        + Hash
        + ToU64
        + fmt::Debug
        + fmt::Display;

    /// Zero value (used for resetting the sequence)
    const ZERO: Self::Ty;

    /// One value (used for incrementing the sequence)
    const ONE: Self::Ty;

    /// Returns the timestamp portion of the ID.
    fn timestamp(&self) -> Self::Ty;

    /// Returns the maximum possible value for the timestamp field.
    fn max_timestamp() -> Self::Ty;

    /// Returns the machine ID portion of the ID.
    fn machine_id(&self) -> Self::Ty;

    /// Returns the maximum possible value for the machine_id field.
    fn max_machine_id() -> Self::Ty;

    /// Returns the sequence portion of the ID.
    fn sequence(&self) -> Self::Ty;

    /// Returns the maximum possible value for the sequence field.
    fn max_sequence() -> Self::Ty;

    /// Constructs a new Snowflake ID from its components.
    fn from_components(timestamp: Self::Ty, machine_id: Self::Ty, sequence: Self::Ty) -> Self;

    /// Converts this type into its raw type representation
    fn to_raw(&self) -> Self::Ty;

    /// Converts a raw type into this type
    fn from_raw(raw: Self::Ty) -> Self;

    /// Returns true if the current sequence value can be incremented.
    fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns the next sequence value.
    fn next_sequence(&self) -> Self::Ty {
        self.sequence() + Self::ONE
    }

    /// Returns a new ID with the sequence incremented.
    fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.machine_id(), self.next_sequence())
    }

    /// Returns a new ID for a newer timestamp with sequence reset to zero.
    fn rollover_to_timestamp(&self, ts: Self::Ty) -> Self {
        Self::from_components(ts, self.machine_id(), Self::ZERO)
    }
}

/// A 64-bit Snowflake ID with a 39/15/10 layout.
///
/// - 39 bits timestamp (ms since [`FLURRY_EPOCH`], ~17.4 years of range)
/// - 15 bits machine ID (`0..=32767`)
/// - 10 bits sequence (`0..=1023` per millisecond)
///
/// ```text
///  Bit Index:  63             25 24             10 9              0
///              +----------------+-----------------+---------------+
///  Field:      | timestamp (39) | machine ID (15) | sequence (10) |
///              +----------------+-----------------+---------------+
///              |<----- MSB ---------- 64 bits --------- LSB ----->|
/// ```
///
/// On the wire the ID travels as 8 big-endian bytes, see
/// [`FlurryId::to_be_bytes`].
///
/// [`FLURRY_EPOCH`]: crate::FLURRY_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlurryId {
    id: u64,
}

impl FlurryId {
    /// Width of the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 39;

    /// Width of the machine ID field.
    pub const MACHINE_ID_BITS: u32 = 15;

    /// Width of the sequence field.
    pub const SEQUENCE_BITS: u32 = 10;

    /// Bitmask for extracting the 39-bit timestamp field. Occupies bits 25
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Bitmask for extracting the 15-bit machine ID field. Occupies bits 10
    /// through 24.
    pub const MACHINE_ID_MASK: u64 = (1 << Self::MACHINE_ID_BITS) - 1;

    /// Bitmask for extracting the 10-bit sequence field. Occupies bits 0
    /// through 9.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 25).
    pub const TIMESTAMP_SHIFT: u32 = Self::MACHINE_ID_SHIFT + Self::MACHINE_ID_BITS;

    /// Number of bits to shift the machine ID to its correct position (bit 10).
    pub const MACHINE_ID_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Size of the wire representation in bytes.
    pub const WIRE_SIZE: usize = core::mem::size_of::<u64>();

    /// Packs the three fields into an ID.
    ///
    /// Out-of-range values are masked to their field width. Use
    /// [`SnowflakeId::from_components`] to have debug builds assert instead.
    pub const fn from(timestamp: u64, machine_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let machine_id = (machine_id & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | machine_id | sequence,
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the machine ID from the packed ID.
    pub const fn machine_id(&self) -> u64 {
        (self.id >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Splits the ID into `(timestamp, machine_id, sequence)`.
    pub const fn into_components(self) -> (u64, u64, u64) {
        (self.timestamp(), self.machine_id(), self.sequence())
    }

    /// Returns the raw packed value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw packed value.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the wire form: the packed value in network byte order.
    pub const fn to_be_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        self.id.to_be_bytes()
    }

    /// Reads an ID from its wire form.
    pub const fn from_be_bytes(bytes: [u8; Self::WIRE_SIZE]) -> Self {
        Self {
            id: u64::from_be_bytes(bytes),
        }
    }

    /// Reconstructs the wall-clock instant the timestamp field refers to.
    ///
    /// For display only; the generator never reads this back.
    pub fn datetime(&self) -> SystemTime {
        to_absolute_time(self.timestamp())
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl SnowflakeId for FlurryId {
    type Ty = u64;

    const ZERO: Self::Ty = 0;
    const ONE: Self::Ty = 1;

    fn timestamp(&self) -> Self::Ty {
        self.timestamp()
    }

    fn max_timestamp() -> Self::Ty {
        Self::TIMESTAMP_MASK
    }

    fn machine_id(&self) -> Self::Ty {
        self.machine_id()
    }

    fn max_machine_id() -> Self::Ty {
        Self::MACHINE_ID_MASK
    }

    fn sequence(&self) -> Self::Ty {
        self.sequence()
    }

    fn max_sequence() -> Self::Ty {
        Self::SEQUENCE_MASK
    }

    fn from_components(timestamp: Self::Ty, machine_id: Self::Ty, sequence: Self::Ty) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(machine_id <= Self::MACHINE_ID_MASK, "machine_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, machine_id, sequence)
    }

    fn to_raw(&self) -> Self::Ty {
        self.id
    }

    fn from_raw(raw: Self::Ty) -> Self {
        Self { id: raw }
    }
}

impl From<FlurryId> for u64 {
    fn from(id: FlurryId) -> Self {
        id.id
    }
}

const _: () = assert!(
    FlurryId::TIMESTAMP_BITS + FlurryId::MACHINE_ID_BITS + FlurryId::SEQUENCE_BITS == u64::BITS
);

impl fmt::Display for FlurryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for FlurryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlurryId")
            .field("id", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FLURRY_EPOCH;
    use core::time::Duration;

    #[test]
    fn flurry_id_fields_and_bounds() {
        let ts = FlurryId::max_timestamp();
        let mid = FlurryId::max_machine_id();
        let seq = FlurryId::max_sequence();

        assert_eq!(ts, (1 << 39) - 1);
        assert_eq!(mid, 32767);
        assert_eq!(seq, 1023);

        let id = FlurryId::from(ts, mid, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.machine_id(), mid);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.to_raw(), u64::MAX);
        assert_eq!(<FlurryId as SnowflakeId>::from_components(ts, mid, seq), id);
    }

    #[test]
    fn decode_inverts_encode() {
        let samples = [
            (0, 0, 0),
            (10_000, 1234, 0),
            (1, FlurryId::MACHINE_ID_MASK, 1),
            (FlurryId::TIMESTAMP_MASK, 0, FlurryId::SEQUENCE_MASK),
            (0x2a_5555_5555, 0x2aaa, 0x155),
        ];
        for (t, m, s) in samples {
            let id = <FlurryId as SnowflakeId>::from_components(t, m, s);
            assert_eq!(id.into_components(), (t, m, s));
            assert_eq!(FlurryId::from_raw(id.to_raw()), id);
        }
    }

    #[test]
    fn fields_land_in_their_bit_ranges() {
        assert_eq!(FlurryId::from(1, 0, 0).to_raw(), 1 << 25);
        assert_eq!(FlurryId::from(0, 1, 0).to_raw(), 1 << 10);
        assert_eq!(FlurryId::from(0, 0, 1).to_raw(), 1);
        assert_eq!(FlurryId::TIMESTAMP_SHIFT, 25);
        assert_eq!(FlurryId::MACHINE_ID_SHIFT, 10);
    }

    #[test]
    fn raw_order_follows_timestamp_then_sequence() {
        let a = FlurryId::from(100, 5, 1023);
        let b = FlurryId::from(101, 0, 0);
        let c = FlurryId::from(101, 0, 1);
        assert!(a < b && b < c);
        assert!(a.to_raw() < b.to_raw() && b.to_raw() < c.to_raw());
    }

    #[test]
    fn wire_form_is_big_endian() {
        let id = FlurryId::from_raw(0x0102_0304_0506_0708);
        assert_eq!(id.to_be_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(FlurryId::from_be_bytes([1, 2, 3, 4, 5, 6, 7, 8]), id);
        assert_eq!(FlurryId::WIRE_SIZE, 8);
    }

    #[test]
    fn datetime_adds_the_epoch_back() {
        let id = FlurryId::from(10_000, 1234, 0);
        let expected = std::time::UNIX_EPOCH + FLURRY_EPOCH + Duration::from_secs(10);
        assert_eq!(id.datetime(), expected);
    }

    #[test]
    fn padded_string_and_display() {
        let id = FlurryId::from_raw(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.to_padded_string(), "00000000000000000042");
        let dbg = format!("{id:?}");
        assert!(dbg.contains("sequence: 42"));
    }

    #[test]
    #[should_panic(expected = "timestamp overflow")]
    fn timestamp_overflow_panics() {
        let ts = FlurryId::max_timestamp() + 1;
        <FlurryId as SnowflakeId>::from_components(ts, 0, 0);
    }

    #[test]
    #[should_panic(expected = "machine_id overflow")]
    fn machine_id_overflow_panics() {
        let mid = FlurryId::max_machine_id() + 1;
        <FlurryId as SnowflakeId>::from_components(0, mid, 0);
    }

    #[test]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        let seq = FlurryId::max_sequence() + 1;
        <FlurryId as SnowflakeId>::from_components(0, 0, seq);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_is_transparent() {
        let id = FlurryId::from_raw(123_456);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "123456");
        assert_eq!(serde_json::from_str::<FlurryId>(&json).unwrap(), id);
    }
}
