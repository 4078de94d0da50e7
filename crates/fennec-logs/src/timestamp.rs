//! Timestamps for session file names.
//!
//! `adb logcat -v time` prints lines like
//! `05-16 11:18:46.355 I/SyncAdapter(14434): Got onPerformSync. ...`
//! without a year. The derived value is milliseconds since the Unix epoch,
//! interpreting the stamp in local time of the current year.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
use tracing::trace;

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock stuck at one instant. Used for replays and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// Clock fixed at `millis` since the Unix epoch.
    pub fn from_millis(millis: i64) -> Option<Self> {
        Local.timestamp_millis_opt(millis).single().map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Parse the leading `MM-DD HH:MM:SS.mmm` stamp of a logcat line.
///
/// Everything before the first `delimiter` is the stamp. Returns `None` when
/// the stamp is malformed or does not exist in local time.
pub fn parse_logcat_timestamp(line: &str, delimiter: &str, year: i32) -> Option<i64> {
    let stamp = line
        .split_once(delimiter)
        .map_or(line, |(head, _)| head);
    let (seconds, millis) = stamp.split_once('.')?;
    let millis: i64 = millis.trim().parse().ok()?;

    let naive =
        NaiveDateTime::parse_from_str(&format!("{year}-{seconds}"), "%Y-%m-%d %H:%M:%S").ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;

    Some(local.timestamp() * 1000 + millis)
}

/// Derive a millisecond timestamp from a line, falling back to the clock.
pub fn derive_timestamp(line: &str, delimiter: &str, clock: &dyn Clock) -> i64 {
    let now = clock.now();
    match parse_logcat_timestamp(line, delimiter, now.year()) {
        Some(millis) => millis,
        None => {
            trace!(line = line.trim_end(), "Unparseable timestamp, using current time");
            now.timestamp_millis()
        }
    }
}

/// `<directory>/<prefix>-<timestamp>.txt`
pub fn log_filename(directory: &Path, prefix: &str, timestamp: i64) -> PathBuf {
    directory.join(format!("{prefix}-{timestamp}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "05-16 11:18:46.355 I/SyncAdapter(14434): Got onPerformSync. Extras bundle is Bundle[{}]\n";

    fn local_millis(year: i32, month: u32, day: u32, h: u32, m: u32, s: u32) -> i64 {
        Local
            .with_ymd_and_hms(year, month, day, h, m, s)
            .earliest()
            .unwrap()
            .timestamp()
            * 1000
    }

    #[test]
    fn test_parse_logcat_timestamp() {
        let millis = parse_logcat_timestamp(LINE, " I/", 2012).unwrap();
        assert_eq!(millis, local_millis(2012, 5, 16, 11, 18, 46) + 355);
    }

    #[test]
    fn test_millis_remainder_is_an_integer() {
        let line = "05-16 11:18:46.5 I/SyncAdapter(1): x";
        let millis = parse_logcat_timestamp(line, " I/", 2012).unwrap();
        assert_eq!(millis, local_millis(2012, 5, 16, 11, 18, 46) + 5);
    }

    #[test]
    fn test_parse_rejects_malformed_stamps() {
        assert!(parse_logcat_timestamp("garbage I/Tag: hi", " I/", 2012).is_none());
        assert!(parse_logcat_timestamp("13-45 11:18:46.355 I/Tag: hi", " I/", 2012).is_none());
        assert!(parse_logcat_timestamp("05-16 11:18:46.abc I/Tag: hi", " I/", 2012).is_none());
        assert!(parse_logcat_timestamp("05-16 11:18:46 I/Tag: hi", " I/", 2012).is_none());
    }

    #[test]
    fn test_other_level_needs_matching_delimiter() {
        let line = "05-16 11:18:46.355 D/AlarmManager(  207): Added alarm";
        assert!(parse_logcat_timestamp(line, " I/", 2012).is_none());
        assert!(parse_logcat_timestamp(line, " D/", 2012).is_some());
    }

    #[test]
    fn test_derive_uses_clock_year() {
        let clock = FixedClock(Local.with_ymd_and_hms(2013, 1, 2, 3, 4, 5).earliest().unwrap());
        let millis = derive_timestamp(LINE, " I/", &clock);
        assert_eq!(millis, local_millis(2013, 5, 16, 11, 18, 46) + 355);
    }

    #[test]
    fn test_derive_falls_back_to_clock() {
        let clock = FixedClock::from_millis(1_337_191_588_829).unwrap();
        let millis = derive_timestamp("no timestamp here", " I/", &clock);
        assert_eq!(millis, 1_337_191_588_829);
    }

    #[test]
    fn test_system_clock_fallback_is_recent() {
        let before = Local::now().timestamp_millis();
        let millis = derive_timestamp("??", " I/", &SystemClock);
        assert!(millis >= before);
    }

    #[test]
    fn test_log_filename() {
        let path = log_filename(Path::new("/tmp/logs"), "FxSync", 1000);
        assert_eq!(path, PathBuf::from("/tmp/logs/FxSync-1000.txt"));
    }
}
