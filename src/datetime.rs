//! UTC datetimes with millisecond precision, as stored in BSON.

use std::{
    fmt::{self, Display},
    time::{Duration, SystemTime},
};

use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// A BSON UTC datetime: signed milliseconds since the Unix epoch.
///
/// The epoch is the fixed point `1970-01-01T00:00:00Z`; values before it are negative. No local
/// time zone is ever applied.
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dt = bson_wire::DateTime::parse_rfc3339_str("1998-02-12T00:01:00.023Z")?;
/// assert_eq!(dt.timestamp_millis(), 887_241_660_023);
/// assert_eq!(dt.try_to_rfc3339_string()?, "1998-02-12T00:01:00.023Z");
/// # Ok(())
/// # }
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Default)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// The Unix epoch.
    pub const UNIX_EPOCH: Self = Self::from_millis(0);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC.
    pub const fn from_millis(date: i64) -> Self {
        Self(date)
    }

    /// Returns a [`DateTime`] which corresponds to the current date and time.
    pub fn now() -> DateTime {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert the given [`std::time::SystemTime`] to a [`DateTime`], saturating at
    /// [`DateTime::MIN`] and [`DateTime::MAX`].
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis())
                .map(Self::from_millis)
                .unwrap_or(Self::MAX),
            Err(e) => i64::try_from(e.duration().as_millis())
                .map(|millis| Self::from_millis(-millis))
                .unwrap_or(Self::MIN),
        }
    }

    /// Convert this [`DateTime`] to a [`std::time::SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            SystemTime::UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            // widen before taking the absolute value: i64::MIN.abs() overflows
            SystemTime::UNIX_EPOCH - Duration::from_millis((self.0 as i128).unsigned_abs() as u64)
        }
    }

    /// Returns the number of non-leap-milliseconds since January 1, 1970 UTC.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Adds `millis` milliseconds, saturating at [`DateTime::MIN`] and [`DateTime::MAX`].
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self::from_millis(self.0.saturating_add(millis))
    }

    /// Convert this [`DateTime`] to an RFC 3339 formatted string.
    pub fn try_to_rfc3339_string(self) -> Result<String> {
        let dt = self
            .to_time_opt()
            .ok_or_else(|| Error::datetime(format!("{} ms is out of range", self.0)))?;
        dt.format(&Rfc3339).map_err(Error::datetime)
    }

    /// Parse an RFC 3339 formatted string, truncating it to millisecond precision.
    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        let odt = time::OffsetDateTime::parse(s.as_ref(), &Rfc3339).map_err(Error::datetime)?;
        let millis = odt.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis)
            .map(Self::from_millis)
            .map_err(Error::datetime)
    }

    /// Returns the time elapsed since `earlier`, or `None` if `earlier` is later than this one.
    pub fn checked_duration_since(self, earlier: Self) -> Option<Duration> {
        if earlier.0 > self.0 {
            return None;
        }
        Some(Duration::from_millis((self.0 as i128 - earlier.0 as i128) as u64))
    }

    fn to_time_opt(self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::UNIX_EPOCH.checked_add(time::Duration::milliseconds(self.0))
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.to_time_opt() {
            Some(dt) => tup.field(&dt),
            _ => tup.field(&self.0),
        };
        tup.finish()
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_to_rfc3339_string() {
            Ok(s) => f.write_str(&s),
            Err(_) => Display::fmt(&self.0, f),
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<DateTime> for SystemTime {
    fn from(dt: DateTime) -> Self {
        dt.to_system_time()
    }
}
