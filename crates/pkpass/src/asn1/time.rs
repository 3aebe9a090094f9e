//! Calendar arithmetic and the two ASN.1 time types.
//!
//! [`to_components`] breaks a Unix timestamp into a proleptic Gregorian UTC
//! date without consulting any system calendar. The day count is taken
//! relative to 2000-03-01 so that February 29 falls at the very end of each
//! 400/100/4/1-year cycle, which reduces leap handling to clamping the last
//! cycle index of each level.
//!
//! [`Time`] chooses between `UTCTime` and `GeneralizedTime` exactly as RFC
//! 5280 requires: years 1950 through 2049 use the two-digit form, everything
//! else uses the four-digit form.

use crate::{Error, Result};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// `UTCTime` universal tag.
pub const TAG_UTC_TIME: u8 = 0x17;

/// `GeneralizedTime` universal tag.
pub const TAG_GENERALIZED_TIME: u8 = 0x18;

const SECONDS_PER_DAY: i64 = 86_400;

/// 2000-03-01T00:00:00Z.
const LEAPOCH: i64 = 946_684_800 + SECONDS_PER_DAY * (31 + 29);

const DAYS_PER_400Y: i64 = 365 * 400 + 97;
const DAYS_PER_100Y: i64 = 365 * 100 + 24;
const DAYS_PER_4Y: i64 = 365 * 4 + 1;

/// Month lengths starting from March; February is last.
const MONTH_DAYS: [i64; 12] = [31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 29];

/// A broken-down UTC instant with one-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcComponents {
    pub year: i64,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Decomposes seconds since the Unix epoch into UTC calendar components.
///
/// Negative timestamps are handled by flooring every division: a negative
/// remainder is corrected by adding one full period and decrementing the
/// quotient.
///
/// # Examples
///
/// ```
/// use pkpass::asn1::time::to_components;
///
/// let c = to_components(951_782_400);
/// assert_eq!((c.year, c.month, c.day), (2000, 2, 29));
/// ```
pub fn to_components(unix_seconds: i64) -> UtcComponents {
    let secs = unix_seconds.saturating_sub(LEAPOCH);

    let mut days = secs / SECONDS_PER_DAY;
    let mut remsecs = secs % SECONDS_PER_DAY;
    if remsecs < 0 {
        remsecs += SECONDS_PER_DAY;
        days -= 1;
    }

    let mut qc_cycles = days / DAYS_PER_400Y;
    let mut remdays = days % DAYS_PER_400Y;
    if remdays < 0 {
        remdays += DAYS_PER_400Y;
        qc_cycles -= 1;
    }

    let mut c_cycles = remdays / DAYS_PER_100Y;
    if c_cycles == 4 {
        c_cycles -= 1;
    }
    remdays -= c_cycles * DAYS_PER_100Y;

    let mut q_cycles = remdays / DAYS_PER_4Y;
    if q_cycles == 25 {
        q_cycles -= 1;
    }
    remdays -= q_cycles * DAYS_PER_4Y;

    let mut remyears = remdays / 365;
    if remyears == 4 {
        remyears -= 1;
    }
    remdays -= remyears * 365;

    let mut years = remyears + 4 * q_cycles + 100 * c_cycles + 400 * qc_cycles;

    let mut months: i64 = 0;
    while months < 11 && MONTH_DAYS[months as usize] <= remdays {
        remdays -= MONTH_DAYS[months as usize];
        months += 1;
    }

    if months >= 10 {
        months -= 12;
        years += 1;
    }

    UtcComponents {
        year: years + 2000,
        month: (months + 3) as u8,
        day: (remdays + 1) as u8,
        hour: (remsecs / 3600) as u8,
        minute: (remsecs / 60 % 60) as u8,
        second: (remsecs % 60) as u8,
    }
}

impl UtcComponents {
    /// Converts back to seconds since the Unix epoch.
    pub fn to_unix(&self) -> i64 {
        let month = i64::from(self.month);
        let y = if month <= 2 { self.year - 1 } else { self.year };
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let mp = (month + 9) % 12;
        let doy = (153 * mp + 2) / 5 + i64::from(self.day) - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        let days = era * DAYS_PER_400Y + doe - 719_468;

        days * SECONDS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    fn validate(&self) -> Result<()> {
        let leap = (self.year % 4 == 0 && self.year % 100 != 0) || self.year % 400 == 0;
        let max_day = match self.month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if leap => 29,
            2 => 28,
            m => return Err(Error::Der(format!("month {m} out of range"))),
        };
        if self.day == 0 || self.day > max_day {
            return Err(Error::Der(format!("day {} out of range", self.day)));
        }
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return Err(Error::Der(format!(
                "time {:02}:{:02}:{:02} out of range",
                self.hour, self.minute, self.second
            )));
        }
        Ok(())
    }
}

impl fmt::Display for UtcComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// An ASN.1 `Time` (the `CHOICE { utcTime, generalTime }` of RFC 5280).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Time {
    /// `YYMMDDHHMMSSZ`, years 1950-2049.
    Utc(UtcComponents),
    /// `YYYYMMDDHHMMSSZ`, years 0-1949 and 2050-9999.
    Generalized(UtcComponents),
}

impl Time {
    /// Picks the encoding for `components` by year.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Der`] for years outside 0..=9999, which neither type
    /// can represent.
    pub fn new(components: UtcComponents) -> Result<Self> {
        match components.year {
            1950..=2049 => Ok(Time::Utc(components)),
            0..=9999 => Ok(Time::Generalized(components)),
            y => Err(Error::Der(format!("year {y} cannot be encoded as an ASN.1 time"))),
        }
    }

    pub fn from_unix(unix_seconds: i64) -> Result<Self> {
        Self::new(to_components(unix_seconds))
    }

    /// Converts a [`SystemTime`], rounding to the nearest whole second.
    pub fn from_system_time(time: SystemTime) -> Result<Self> {
        let rounded = |secs: u64, nanos: u32| -> Result<i64> {
            let secs = i64::try_from(secs)
                .map_err(|_| Error::Der("timestamp out of range".into()))?;
            Ok(secs + i64::from(nanos >= 500_000_000))
        };
        let unix = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => rounded(d.as_secs(), d.subsec_nanos())?,
            Err(e) => {
                let d = e.duration();
                -rounded(d.as_secs(), d.subsec_nanos())?
            }
        };
        Self::from_unix(unix)
    }

    pub fn components(&self) -> UtcComponents {
        match self {
            Time::Utc(c) | Time::Generalized(c) => *c,
        }
    }

    pub fn to_unix(&self) -> i64 {
        self.components().to_unix()
    }

    pub fn tag(&self) -> u8 {
        match self {
            Time::Utc(_) => TAG_UTC_TIME,
            Time::Generalized(_) => TAG_GENERALIZED_TIME,
        }
    }

    /// The ASCII content octets, without tag and length.
    pub fn to_content_bytes(&self) -> Vec<u8> {
        let c = self.components();
        let text = match self {
            Time::Utc(_) => format!(
                "{:02}{:02}{:02}{:02}{:02}{:02}Z",
                c.year % 100,
                c.month,
                c.day,
                c.hour,
                c.minute,
                c.second
            ),
            Time::Generalized(_) => format!(
                "{:04}{:02}{:02}{:02}{:02}{:02}Z",
                c.year, c.month, c.day, c.hour, c.minute, c.second
            ),
        };
        text.into_bytes()
    }

    /// Parses DER content octets for the given tag. Only the canonical
    /// `Z`-terminated, seconds-present form is accepted.
    pub fn parse(tag: u8, content: &[u8]) -> Result<Self> {
        let year_digits = match tag {
            TAG_UTC_TIME => 2,
            TAG_GENERALIZED_TIME => 4,
            other => return Err(Error::Der(format!("tag 0x{other:02x} is not a time type"))),
        };
        let expected = year_digits + 11;
        if content.len() != expected || content[expected - 1] != b'Z' {
            return Err(Error::Der(format!(
                "malformed time {:?}",
                String::from_utf8_lossy(content)
            )));
        }
        let digits = &content[..expected - 1];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(Error::Der("non-digit in time value".into()));
        }
        let number = |range: std::ops::Range<usize>| -> i64 {
            digits[range]
                .iter()
                .fold(0, |acc, d| acc * 10 + i64::from(d - b'0'))
        };

        let (year, rest) = if year_digits == 2 {
            let yy = number(0..2);
            (if yy >= 50 { 1900 + yy } else { 2000 + yy }, 2)
        } else {
            (number(0..4), 4)
        };
        let components = UtcComponents {
            year,
            month: number(rest..rest + 2) as u8,
            day: number(rest + 2..rest + 4) as u8,
            hour: number(rest + 4..rest + 6) as u8,
            minute: number(rest + 6..rest + 8) as u8,
            second: number(rest + 8..rest + 10) as u8,
        };
        components.validate()?;

        Ok(if tag == TAG_UTC_TIME {
            Time::Utc(components)
        } else {
            Time::Generalized(components)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(c: UtcComponents) -> (i64, u8, u8) {
        (c.year, c.month, c.day)
    }

    #[test]
    fn test_epoch() {
        let c = to_components(0);
        assert_eq!(ymd(c), (1970, 1, 1));
        assert_eq!((c.hour, c.minute, c.second), (0, 0, 0));
    }

    #[test]
    fn test_leap_day_2000() {
        let c = to_components(951_782_400);
        assert_eq!(ymd(c), (2000, 2, 29));
        assert_eq!(ymd(to_components(951_782_400 + 86_400)), (2000, 3, 1));
        assert_eq!(ymd(to_components(951_782_400 - 1)), (2000, 2, 28));
    }

    #[test]
    fn test_century_without_leap_day() {
        // 2100-03-01; 2100 is not a leap year.
        let c = to_components(4_107_542_400);
        assert_eq!(ymd(c), (2100, 3, 1));
        assert_eq!(ymd(to_components(4_107_542_400 - 86_400)), (2100, 2, 28));
    }

    #[test]
    fn test_negative_timestamp() {
        let c = to_components(-1);
        assert_eq!(ymd(c), (1969, 12, 31));
        assert_eq!((c.hour, c.minute, c.second), (23, 59, 59));

        // 1900-01-01
        let c = to_components(-2_208_988_800);
        assert_eq!(ymd(c), (1900, 1, 1));
    }

    #[test]
    fn test_round_trip_samples() {
        for t in [
            -62_135_596_800, // 0001-01-01
            -2_208_988_801,
            -86_401,
            0,
            951_782_399,
            951_868_800,
            1_700_000_000,
            2_524_607_999,
            253_402_300_799, // 9999-12-31T23:59:59
        ] {
            assert_eq!(to_components(t).to_unix(), t, "timestamp {t}");
        }
    }

    #[test]
    fn test_choice_boundaries() {
        // 1949-12-31T23:59:59Z / 1950-01-01T00:00:00Z
        assert!(matches!(Time::from_unix(-631_152_001).unwrap(), Time::Generalized(_)));
        assert!(matches!(Time::from_unix(-631_152_000).unwrap(), Time::Utc(_)));
        // 2049-12-31T23:59:59Z / 2050-01-01T00:00:00Z
        assert!(matches!(Time::from_unix(2_524_607_999).unwrap(), Time::Utc(_)));
        assert!(matches!(Time::from_unix(2_524_608_000).unwrap(), Time::Generalized(_)));
    }

    #[test]
    fn test_encoding() {
        let t = Time::from_unix(951_782_400 + 3_723).unwrap();
        assert_eq!(t.tag(), TAG_UTC_TIME);
        assert_eq!(t.to_content_bytes(), b"000229010203Z");

        let t = Time::from_unix(2_524_608_000).unwrap();
        assert_eq!(t.tag(), TAG_GENERALIZED_TIME);
        assert_eq!(t.to_content_bytes(), b"20500101000000Z");
    }

    #[test]
    fn test_parse_round_trip() {
        for t in [-631_152_001, -631_152_000, 951_782_400, 2_524_608_000] {
            let time = Time::from_unix(t).unwrap();
            let parsed = Time::parse(time.tag(), &time.to_content_bytes()).unwrap();
            assert_eq!(parsed, time);
            assert_eq!(parsed.to_unix(), t);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Time::parse(TAG_UTC_TIME, b"000229010203").is_err());
        assert!(Time::parse(TAG_UTC_TIME, b"000230010203Z").is_err());
        assert!(Time::parse(TAG_UTC_TIME, b"0002290102+3Z").is_err());
        assert!(Time::parse(0x04, b"000229010203Z").is_err());
    }

    #[test]
    fn test_year_out_of_range() {
        assert!(Time::from_unix(253_402_300_800).is_err());
        assert!(Time::from_unix(-62_167_219_201).is_err());
    }

    #[test]
    fn test_system_time_rounds_to_nearest_second() {
        use std::time::Duration;

        let t = UNIX_EPOCH + Duration::from_millis(1_700_000_000_600);
        assert_eq!(Time::from_system_time(t).unwrap().to_unix(), 1_700_000_001);
        let t = UNIX_EPOCH + Duration::from_millis(1_700_000_000_400);
        assert_eq!(Time::from_system_time(t).unwrap().to_unix(), 1_700_000_000);
        let t = UNIX_EPOCH - Duration::from_millis(1_600);
        assert_eq!(Time::from_system_time(t).unwrap().to_unix(), -2);
    }
}
