//! Human- and machine-readable renderings of an issued ID.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use core::fmt::Display;
use flurry_proto::types::SnowflakeId;
use serde::Serialize;

/// `ctime(3)`-style date, e.g. `Mon May 14 12:53:30 2012`.
const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// How each ID is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One labelled field per line, followed by a blank line.
    Full,
    /// The date on one line, then `msec, machine, seq`.
    Compact,
    /// One JSON object per line.
    Json,
}

/// An ID broken into the fields shown to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub id: u64,
    /// Milliseconds since the ID epoch.
    pub timestamp: u64,
    pub machine_id: u64,
    pub sequence: u64,
    /// Whole seconds since the Unix epoch.
    pub unix_seconds: i64,
    /// Millisecond within `unix_seconds`.
    pub millis: u32,
    /// RFC 3339 rendering of the absolute time.
    pub datetime: String,
}

/// Renders `id` with dates shown in `tz`.
///
/// # Errors
///
/// Fails if the JSON rendering cannot be serialized.
pub fn render<Tz>(id: SnowflakeId, format: Format, tz: &Tz) -> anyhow::Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let datetime = DateTime::<Utc>::from(id.datetime()).with_timezone(tz);
    let unix_seconds = datetime.timestamp();
    let millis = datetime.timestamp_subsec_millis();
    let ctime = datetime.format(CTIME_FORMAT);

    let rendered = match format {
        Format::Full => format!(
            "id:          {}\n\
             machine:     {}\n\
             datetime:    {}\n\
             timestamp:   {}\n\
             (msec, seq): ({}, {})\n",
            id.to_raw(),
            id.machine_id(),
            ctime,
            unix_seconds,
            millis,
            id.sequence(),
        ),
        Format::Compact => format!(
            "{}\n{}, {}, {}",
            ctime,
            millis,
            id.machine_id(),
            id.sequence(),
        ),
        Format::Json => {
            let decoded = Decoded {
                id: id.to_raw(),
                timestamp: id.timestamp(),
                machine_id: id.machine_id(),
                sequence: id.sequence(),
                unix_seconds,
                millis,
                datetime: datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            };
            serde_json::to_string(&decoded)?
        }
    };

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_seconds_in() -> SnowflakeId {
        SnowflakeId::from(10_000, 1234, 0)
    }

    #[test]
    fn full_lists_every_field() {
        let out = render(ten_seconds_in(), Format::Full, &Utc).unwrap();
        assert_eq!(
            out,
            "id:          335545583616\n\
             machine:     1234\n\
             datetime:    Mon May 14 12:53:30 2012\n\
             timestamp:   1337000010\n\
             (msec, seq): (0, 0)\n"
        );
    }

    #[test]
    fn compact_is_date_then_fields() {
        let id = SnowflakeId::from(10_250, 7, 3);
        let out = render(id, Format::Compact, &Utc).unwrap();
        assert_eq!(out, "Mon May 14 12:53:30 2012\n250, 7, 3");
    }

    #[test]
    fn json_round_trips_through_serde() {
        let out = render(ten_seconds_in(), Format::Json, &Utc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["id"], 335_545_583_616_u64);
        assert_eq!(value["timestamp"], 10_000);
        assert_eq!(value["machine_id"], 1234);
        assert_eq!(value["sequence"], 0);
        assert_eq!(value["unix_seconds"], 1_337_000_010_i64);
        assert_eq!(value["millis"], 0);
        assert_eq!(value["datetime"], "2012-05-14T12:53:30.000Z");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn millisecond_carries_into_full_rendering() {
        let id = SnowflakeId::from(10_999, 2, 5);
        let out = render(id, Format::Full, &Utc).unwrap();
        assert!(out.contains("timestamp:   1337000010\n"));
        assert!(out.contains("(msec, seq): (999, 5)\n"));
    }

    #[test]
    fn epoch_itself_renders() {
        let out = render(SnowflakeId::from(0, 0, 0), Format::Compact, &Utc).unwrap();
        assert_eq!(out, "Mon May 14 12:53:20 2012\n0, 0, 0");
    }
}
