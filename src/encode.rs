//! Textual encoding of primitive values.
//!
//! [`encode_primitive`] maps a [`PrimitiveValue`] to the token the writer
//! emits. The mapping depends on two parameters only: the protocol version,
//! which picks legacy `\/Date(ms)\/` or ISO-8601 date/time text, and whether a
//! floating point value must always show a decimal point or exponent.
//!
//! | Type | Token |
//! |------|-------|
//! | Boolean | `true` / `false` |
//! | Byte, SByte, Int16, Int32 | bare integer |
//! | Int64, Decimal | quoted, so no precision is lost in JavaScript clients |
//! | Single, Double | bare number; `"NaN"`, `"INF"`, `"-INF"` quoted |
//! | Guid | quoted hyphenated form |
//! | Binary | quoted base64 |
//! | DateTime | `"\/Date(ms)\/"` before V3, ISO-8601 from V3 |
//! | DateTimeOffset | `"\/Date(ms+mmmm)\/"` (local clock, offset in minutes) before V3, ISO-8601 from V3 with `Z` for a zero offset |
//! | Time | quoted XML duration, e.g. `"PT1H30M"` |

use crate::{ODataVersion, PrimitiveValue};
use base64::Engine;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Timelike};
use std::io::{self, Write};

/// A value's JSON text before it reaches the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Written verbatim.
    Bare(String),
    /// Escaped and wrapped in quotes.
    Quoted(String),
}

/// Encodes `value` for the given protocol version.
///
/// When `force_decimal_marker` is set, finite floating point values always
/// contain `.` or an exponent, so `1.0` never degrades into the integer `1`.
///
/// # Examples
///
/// ```rust
/// use odata_json::encode::{encode_primitive, Token};
/// use odata_json::{ODataVersion, PrimitiveValue};
///
/// let token = encode_primitive(&PrimitiveValue::Double(1.0), ODataVersion::V3, true);
/// assert_eq!(token, Token::Bare("1.0".to_string()));
///
/// let token = encode_primitive(&PrimitiveValue::Int64(7), ODataVersion::V3, true);
/// assert_eq!(token, Token::Quoted("7".to_string()));
/// ```
#[must_use]
pub fn encode_primitive(
    value: &PrimitiveValue,
    version: ODataVersion,
    force_decimal_marker: bool,
) -> Token {
    match value {
        PrimitiveValue::Boolean(b) => Token::Bare((if *b { "true" } else { "false" }).to_string()),
        PrimitiveValue::Byte(v) => Token::Bare(v.to_string()),
        PrimitiveValue::SByte(v) => Token::Bare(v.to_string()),
        PrimitiveValue::Int16(v) => Token::Bare(v.to_string()),
        PrimitiveValue::Int32(v) => Token::Bare(v.to_string()),
        PrimitiveValue::Int64(v) => Token::Quoted(v.to_string()),
        PrimitiveValue::Single(v) => {
            encode_float(f64::from(*v), format!("{:?}", v), force_decimal_marker)
        }
        PrimitiveValue::Double(v) => encode_float(*v, format!("{:?}", v), force_decimal_marker),
        PrimitiveValue::Decimal(d) => Token::Quoted(d.to_string()),
        PrimitiveValue::Guid(g) => Token::Quoted(g.hyphenated().to_string()),
        PrimitiveValue::Binary(bytes) => {
            Token::Quoted(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        PrimitiveValue::String(s) => Token::Quoted(s.clone()),
        PrimitiveValue::DateTime(dt) => encode_date_time(dt, version),
        PrimitiveValue::DateTimeOffset(dt) => encode_date_time_offset(dt, version),
        PrimitiveValue::Time(d) => Token::Quoted(xml_duration(d)),
    }
}

// `shortest` is the shortest round-trip text of the value, as Rust's `Debug`
// renders it: always with `.0` or an exponent.
fn encode_float(value: f64, shortest: String, force_decimal_marker: bool) -> Token {
    if value.is_nan() {
        return Token::Quoted("NaN".to_string());
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "INF" } else { "-INF" };
        return Token::Quoted(text.to_string());
    }
    if force_decimal_marker {
        if has_decimal_marker(&shortest) {
            Token::Bare(shortest)
        } else {
            Token::Bare(format!("{}.0", shortest))
        }
    } else {
        match shortest.strip_suffix(".0") {
            Some(integral) => Token::Bare(integral.to_string()),
            None => Token::Bare(shortest),
        }
    }
}

/// Returns `true` if a number token contains `.` or an exponent marker.
#[inline]
#[must_use]
pub fn has_decimal_marker(token: &str) -> bool {
    token.contains(['.', 'e', 'E'])
}

fn encode_date_time(dt: &NaiveDateTime, version: ODataVersion) -> Token {
    if version.uses_legacy_dates() {
        let millis = dt.and_utc().timestamp_millis();
        Token::Bare(format!("\"\\/Date({})\\/\"", millis))
    } else {
        Token::Quoted(format!(
            "{}{}",
            dt.format("%Y-%m-%dT%H:%M:%S"),
            fraction_of_second(dt.nanosecond())
        ))
    }
}

fn encode_date_time_offset(dt: &DateTime<FixedOffset>, version: ODataVersion) -> Token {
    let offset_minutes = dt.offset().local_minus_utc() / 60;
    if version.uses_legacy_dates() {
        let sign = if offset_minutes >= 0 { "+" } else { "-" };
        // milliseconds of the local clock reading, with the offset alongside
        Token::Bare(format!(
            "\"\\/Date({}{}{:04})\\/\"",
            dt.naive_local().and_utc().timestamp_millis(),
            sign,
            offset_minutes.abs()
        ))
    } else {
        let zone = if offset_minutes == 0 {
            "Z".to_string()
        } else {
            dt.format("%:z").to_string()
        };
        Token::Quoted(format!(
            "{}{}{}",
            dt.format("%Y-%m-%dT%H:%M:%S"),
            fraction_of_second(dt.nanosecond()),
            zone
        ))
    }
}

// Seconds carry at most seven fractional digits (100ns ticks), trailing zeros dropped.
fn fraction_of_second(nanos: u32) -> String {
    let ticks = (nanos % 1_000_000_000) / 100;
    if ticks == 0 {
        return String::new();
    }
    let digits = format!("{:07}", ticks);
    format!(".{}", digits.trim_end_matches('0'))
}

/// Formats a duration as an XML Schema `duration`, e.g. `P1DT2H3M4.5S`.
///
/// # Examples
///
/// ```rust
/// use chrono::Duration;
/// use odata_json::encode::xml_duration;
///
/// assert_eq!(xml_duration(&Duration::minutes(90)), "PT1H30M");
/// assert_eq!(xml_duration(&Duration::zero()), "PT0S");
/// assert_eq!(xml_duration(&-Duration::days(1)), "-P1D");
/// ```
#[must_use]
pub fn xml_duration(duration: &Duration) -> String {
    let negative = *duration < Duration::zero();
    let magnitude = if negative { -*duration } else { *duration };
    let total_secs = magnitude.num_seconds();
    let nanos = (magnitude - Duration::seconds(total_secs))
        .num_nanoseconds()
        .unwrap_or(0);

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    let fraction = fraction_of_second(u32::try_from(nanos).unwrap_or(0));

    let mut out = String::with_capacity(16);
    if negative {
        out.push('-');
    }
    out.push('P');
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || !fraction.is_empty() {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if seconds > 0 || !fraction.is_empty() {
            out.push_str(&format!("{}{}S", seconds, fraction));
        }
    } else if days == 0 {
        out.push_str("T0S");
    }
    out
}

/// Writes `s` as a quoted JSON string.
///
/// Quotes, backslashes, control characters and the JavaScript line
/// terminators U+2028 and U+2029 are escaped; everything else is written as
/// UTF-8.
pub fn write_escaped_string<W: Write + ?Sized>(sink: &mut W, s: &str) -> io::Result<()> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let bytes = s.as_bytes();
    sink.write_all(b"\"")?;
    let mut run_start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let escape: Option<&[u8]> = match b {
            b'"' => Some(b"\\\""),
            b'\\' => Some(b"\\\\"),
            b'\n' => Some(b"\\n"),
            b'\r' => Some(b"\\r"),
            b'\t' => Some(b"\\t"),
            0x08 => Some(b"\\b"),
            0x0C => Some(b"\\f"),
            // U+2028 and U+2029 end a line in JavaScript, which breaks JSONP
            0xE2 => match bytes.get(i + 1..i + 3) {
                Some([0x80, 0xA8]) => Some(&b"\\u2028"[..]),
                Some([0x80, 0xA9]) => Some(&b"\\u2029"[..]),
                _ => None,
            },
            _ => None,
        };
        if escape.is_none() && b > 0x1F {
            continue;
        }
        if run_start < i {
            sink.write_all(&bytes[run_start..i])?;
        }
        let width = if b == 0xE2 { 3 } else { 1 };
        match escape {
            Some(seq) => sink.write_all(seq)?,
            None => sink.write_all(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[(b >> 4) as usize],
                HEX[(b & 0x0F) as usize],
            ])?,
        }
        run_start = i + width;
    }
    if run_start < bytes.len() {
        sink.write_all(&bytes[run_start..])?;
    }
    sink.write_all(b"\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decimal;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn bare(s: &str) -> Token {
        Token::Bare(s.to_string())
    }

    fn quoted(s: &str) -> Token {
        Token::Quoted(s.to_string())
    }

    fn v3(value: PrimitiveValue) -> Token {
        encode_primitive(&value, ODataVersion::V3, true)
    }

    #[test]
    fn test_integers() {
        assert_eq!(v3(PrimitiveValue::Byte(255)), bare("255"));
        assert_eq!(v3(PrimitiveValue::SByte(-8)), bare("-8"));
        assert_eq!(v3(PrimitiveValue::Int16(-300)), bare("-300"));
        assert_eq!(v3(PrimitiveValue::Int32(42)), bare("42"));
        assert_eq!(v3(PrimitiveValue::Int64(i64::MAX)), quoted("9223372036854775807"));
    }

    #[test]
    fn test_float_marker_policy() {
        assert_eq!(v3(PrimitiveValue::Double(1.0)), bare("1.0"));
        assert_eq!(v3(PrimitiveValue::Double(2.5)), bare("2.5"));
        assert_eq!(v3(PrimitiveValue::Double(1e300)), bare("1e300"));
        assert_eq!(v3(PrimitiveValue::Single(3.0)), bare("3.0"));

        let loose = |v: f64| encode_primitive(&PrimitiveValue::Double(v), ODataVersion::V3, false);
        assert_eq!(loose(1.0), bare("1"));
        assert_eq!(loose(-0.5), bare("-0.5"));
    }

    #[test]
    fn test_float_specials() {
        assert_eq!(v3(PrimitiveValue::Double(f64::NAN)), quoted("NaN"));
        assert_eq!(v3(PrimitiveValue::Double(f64::INFINITY)), quoted("INF"));
        assert_eq!(v3(PrimitiveValue::Single(f32::NEG_INFINITY)), quoted("-INF"));
    }

    #[test]
    fn test_text_types() {
        assert_eq!(
            v3(PrimitiveValue::Decimal("10.50".parse::<Decimal>().unwrap())),
            quoted("10.50")
        );
        assert_eq!(v3(PrimitiveValue::Binary(b"hello".to_vec())), quoted("aGVsbG8="));
        assert_eq!(
            v3(PrimitiveValue::Guid(Uuid::nil())),
            quoted("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_date_time_versions() {
        let dt = NaiveDate::from_ymd_opt(2012, 1, 1)
            .unwrap()
            .and_hms_milli_opt(10, 20, 30, 500)
            .unwrap();
        assert_eq!(
            encode_primitive(&PrimitiveValue::DateTime(dt), ODataVersion::V2, true),
            bare("\"\\/Date(1325413230500)\\/\"")
        );
        assert_eq!(
            encode_primitive(&PrimitiveValue::DateTime(dt), ODataVersion::V3, true),
            quoted("2012-01-01T10:20:30.5")
        );
    }

    #[test]
    fn test_date_time_offset_versions() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let dt = offset.with_ymd_and_hms(2012, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(
            encode_primitive(&PrimitiveValue::DateTimeOffset(dt), ODataVersion::V1, true),
            bare("\"\\/Date(1325379600000+0060)\\/\"")
        );
        assert_eq!(
            encode_primitive(&PrimitiveValue::DateTimeOffset(dt), ODataVersion::V3, true),
            quoted("2012-01-01T01:00:00+01:00")
        );

        let utc = FixedOffset::east_opt(0).unwrap();
        let dt = utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            encode_primitive(&PrimitiveValue::DateTimeOffset(dt), ODataVersion::V3, true),
            quoted("2012-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_negative_offset_legacy() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            encode_primitive(&PrimitiveValue::DateTimeOffset(dt), ODataVersion::V2, true),
            bare("\"\\/Date(1325376000000-0300)\\/\"")
        );
    }

    #[test]
    fn test_legacy_offset_uses_local_clock() {
        let utc = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2012, 1, 1, 12, 0, 0)
            .unwrap();
        let tokyo = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(utc, tokyo);
        let legacy =
            |dt| encode_primitive(&PrimitiveValue::DateTimeOffset(dt), ODataVersion::V2, true);
        assert_eq!(legacy(utc), bare("\"\\/Date(1325419200000+0000)\\/\""));
        assert_eq!(legacy(tokyo), bare("\"\\/Date(1325451600000+0540)\\/\""));
    }

    #[test]
    fn test_xml_duration() {
        assert_eq!(xml_duration(&Duration::seconds(1)), "PT1S");
        assert_eq!(xml_duration(&Duration::milliseconds(1500)), "PT1.5S");
        assert_eq!(
            xml_duration(&(Duration::days(1) + Duration::hours(2) + Duration::minutes(3))),
            "P1DT2H3M"
        );
        assert_eq!(xml_duration(&-Duration::seconds(5)), "-PT5S");
    }

    #[test]
    fn test_escaping() {
        let mut out = Vec::new();
        write_escaped_string(&mut out, "a\"b\\c\nd\u{1}é").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"a\\\"b\\\\c\\nd\\u0001é\"");
    }

    #[test]
    fn test_escaping_line_terminators() {
        let mut out = Vec::new();
        write_escaped_string(&mut out, "a\u{2028}b\u{2029}\u{2027}\u{2028}").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"a\\u2028b\\u2029\u{2027}\\u2028\""
        );
    }
}
