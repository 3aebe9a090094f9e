//! Calendar decomposition checked against chrono.

use chrono::{DateTime, Datelike, Timelike};
use pkpass::asn1::time::{to_components, Time, TAG_GENERALIZED_TIME, TAG_UTC_TIME};

/// 0001-01-01T00:00:00Z
const MIN_SECONDS: i64 = -62_135_596_800;
/// 9999-12-31T23:59:59Z
const MAX_SECONDS: i64 = 253_402_300_799;

fn assert_matches_chrono(t: i64) {
    let expected = DateTime::from_timestamp(t, 0).unwrap();
    let c = to_components(t);
    assert_eq!(
        (c.year, c.month, c.day, c.hour, c.minute, c.second),
        (
            i64::from(expected.year()),
            expected.month() as u8,
            expected.day() as u8,
            expected.hour() as u8,
            expected.minute() as u8,
            expected.second() as u8,
        ),
        "timestamp {t}"
    );
    assert_eq!(c.to_unix(), t, "round trip of {t}");
}

#[test]
fn test_pseudo_random_timestamps() {
    // xorshift64, fixed seed
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let span = (MAX_SECONDS - MIN_SECONDS) as u64;
    for _ in 0..20_000 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        assert_matches_chrono(MIN_SECONDS + (state % span) as i64);
    }
}

#[test]
fn test_edges() {
    for t in [
        MIN_SECONDS,
        MAX_SECONDS,
        -1,
        0,
        1,
        -86_400,
        -86_401,
        951_782_400,  // 2000-02-29
        951_868_799,  // 2000-02-29T23:59:59
        951_868_800,  // 2000-03-01
        4_107_456_000, // 2100-02-28
        4_107_542_400, // 2100-03-01, not a leap year
        -2_203_891_200, // 1900-03-01
    ] {
        assert_matches_chrono(t);
    }
}

#[test]
fn test_leap_day() {
    let c = to_components(951_782_400);
    assert_eq!((c.year, c.month, c.day), (2000, 2, 29));
    let c = to_components(951_868_800);
    assert_eq!((c.year, c.month, c.day), (2000, 3, 1));
}

#[test]
fn test_pre_epoch() {
    let c = to_components(-1);
    assert_eq!(
        (c.year, c.month, c.day, c.hour, c.minute, c.second),
        (1969, 12, 31, 23, 59, 59)
    );
}

#[test]
fn test_time_type_boundaries() {
    let cases: [(i64, u8, &[u8]); 4] = [
        (-631_152_001, TAG_GENERALIZED_TIME, b"19491231235959Z"),
        (-631_152_000, TAG_UTC_TIME, b"500101000000Z"),
        (2_524_607_999, TAG_UTC_TIME, b"491231235959Z"),
        (2_524_608_000, TAG_GENERALIZED_TIME, b"20500101000000Z"),
    ];
    for (t, tag, content) in cases {
        let time = Time::from_unix(t).unwrap();
        assert_eq!(time.tag(), tag, "timestamp {t}");
        assert_eq!(time.to_content_bytes(), content, "timestamp {t}");

        let parsed = Time::parse(tag, content).unwrap();
        assert_eq!(parsed, time);
        assert_eq!(parsed.to_unix(), t);
    }
}

#[test]
fn test_unrepresentable_years() {
    assert!(Time::from_unix(MAX_SECONDS + 1).is_err());
    assert!(Time::from_unix(MIN_SECONDS).is_ok());
}
