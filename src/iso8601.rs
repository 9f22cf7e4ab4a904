//! ISO-8601 date-time text to epoch milliseconds.
//!
//! Accepts what device firmwares actually emit and what Python's
//! `datetime.fromisoformat` accepts: extended or basic calendar dates
//! (`2025-10-27`, `20251027`), ISO week dates (`2025-W44-1`, `2025W441`),
//! any single separator character, `HH[:MM[:SS[.ffffff]]]` times (or the
//! basic `HHMMSS` form) with `.` or `,` as decimal mark, and `Z` or
//! `±HH[:MM[:SS[.ffffff]]]` offsets. Values without an offset are UTC.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Parse `raw` into epoch milliseconds, truncated toward zero.
/// Returns `None` for anything that is not a valid date-time, including
/// leap seconds (`23:59:60`) and offsets of a full day or more.
pub fn parse_epoch_ms(raw: &str) -> Option<i64> {
    let text = raw.trim();
    if !text.is_ascii() {
        return None;
    }

    let (date, rest) = split_date(text)?;
    let date = parse_date(date)?;

    let (time, offset_micros) = if rest.is_empty() {
        (NaiveTime::MIN, 0)
    } else {
        // first byte is the date/time separator, whatever it is
        let rest = &rest[1..];
        let (time, zone) = split_zone(rest);
        let time = parse_time(time)?;
        let offset = match zone {
            None => 0,
            Some(zone) => parse_offset_micros(zone)?,
        };
        (time, offset)
    };

    let local = NaiveDateTime::new(date, time);
    let micros = Utc.from_utc_datetime(&local).timestamp_micros() - offset_micros;
    // integer division truncates toward zero, like int() on the float timestamp
    Some(micros / 1000)
}

/// Split off the date portion, sized by its shape.
fn split_date(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    if bytes.len() < 7 {
        return None;
    }
    let len = match (bytes[4], bytes[5]) {
        (b'-', b'W') => {
            if bytes.get(8) == Some(&b'-') { 10 } else { 8 }
        }
        (b'-', _) => 10,
        (b'W', _) => {
            if bytes.get(7).is_some_and(u8::is_ascii_digit) { 8 } else { 7 }
        }
        _ => 8,
    };
    if bytes.len() < len {
        return None;
    }
    Some(text.split_at(len))
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    let year = digits(&date[..4])? as i32;
    if year < 1 {
        return None;
    }
    let rest = &date[4..];
    let rest = rest.strip_prefix('-').unwrap_or(rest);

    if let Some(week_part) = rest.strip_prefix('W') {
        let week = digits(week_part.get(..2)?)?;
        let day_part = &week_part[2..];
        let day_part = if date.as_bytes()[4] == b'-' {
            match day_part {
                "" => "",
                d => d.strip_prefix('-')?,
            }
        } else {
            day_part
        };
        let weekday = match day_part {
            "" => 1,
            d => digits(d)?,
        };
        let weekday = match weekday {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            7 => Weekday::Sun,
            _ => return None,
        };
        return NaiveDate::from_isoywd_opt(year, week, weekday);
    }

    let (month, day) = if date.as_bytes()[4] == b'-' {
        let (month, day) = rest.split_once('-')?;
        (month, day)
    } else {
        rest.split_at_checked(2)?
    };
    if month.len() != 2 || day.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, digits(month)?, digits(day)?)
}

/// Split the time from its zone designator: the first `-`, `+` or `Z`.
fn split_zone(rest: &str) -> (&str, Option<&str>) {
    match rest.find(['-', '+', 'Z']) {
        Some(pos) => (&rest[..pos], Some(&rest[pos..])),
        None => (rest, None),
    }
}

/// `HH[:MM[:SS[.f]]]` or `HH[MM[SS[.f]]]`; the separator style must not mix.
fn parse_time(text: &str) -> Option<NaiveTime> {
    let (hour, minute, second, micros) = parse_clock(text)?;
    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
}

fn parse_clock(text: &str) -> Option<(u32, u32, u32, u32)> {
    let mut comps = [0u32; 3];
    let mut rest = text;
    let mut extended = false;

    for (i, comp) in comps.iter_mut().enumerate() {
        *comp = digits(rest.get(..2)?)?;
        rest = &rest[2..];
        if i == 0 {
            extended = rest.starts_with(':');
        }
        if rest.is_empty() || i == 2 {
            break;
        }
        if extended {
            rest = rest.strip_prefix(':')?;
        }
    }

    let micros = if rest.is_empty() {
        0
    } else {
        let fraction = rest.strip_prefix(['.', ','])?;
        parse_fraction_micros(fraction)?
    };
    Some((comps[0], comps[1], comps[2], micros))
}

/// Up to six digits are significant; further digits are ignored but must
/// still be digits.
fn parse_fraction_micros(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = &fraction[..fraction.len().min(6)];
    let scale = 10u32.pow(6 - significant.len() as u32);
    Some(digits(significant)? * scale)
}

/// `Z`, or a signed `HH[:MM[:SS[.f]]]` offset strictly inside one day.
fn parse_offset_micros(zone: &str) -> Option<i64> {
    if zone == "Z" {
        return Some(0);
    }
    let (sign, body) = match zone.as_bytes()[0] {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let (hours, minutes, seconds, micros) = parse_clock(body)?;
    if hours >= 24 || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let total = (i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds))
        * MICROS_PER_SECOND
        + i64::from(micros);
    Some(sign * total)
}

fn digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_forms_match_fromisoformat() {
        // expected values are what Python 3.11 datetime.fromisoformat yields
        // (offset-less values taken as UTC), times 1000, truncated
        let cases: &[(&str, Option<i64>)] = &[
            ("2025-10-27T17:37:06.388Z", Some(1761586626388)),
            ("2025-10-27T17:37:06.388+00:00", Some(1761586626388)),
            ("20251027T173706.388Z", Some(1761586626388)),
            ("2025-10-27T17:37:06,388Z", Some(1761586626388)),
            ("2025-10-27T17Z", Some(1761584400000)),
            ("2025-10-27T17+00:00", Some(1761584400000)),
            ("2025-10-27T17:37:06.388+00", Some(1761586626388)),
            ("2025-10-27T173706", Some(1761586626000)),
            ("2025-10-27T1737", Some(1761586620000)),
            ("2025-W44-1T17:37:06.388Z", Some(1761586626388)),
            ("2025W441", Some(1761523200000)),
            ("2025-10-27T17:37:06.1234567Z", Some(1761586626123)),
            ("2025-10-27T17:37:06-03:30", Some(1761599226000)),
            ("2025-10-27x17:37", Some(1761586620000)),
            ("1970-01-01T00:00:00+01:00:30", Some(-3630000)),
            ("1970-01-02", Some(86_400_000)),
            ("2025-10-27T23:59:60Z", None),
            ("2025-10-27T24:00:00", None),
            ("2025-10-27T17:37:06+24:00", None),
            ("2025-10-27T17:3706", None),
            ("2025-10-27T17:37:06.", None),
            ("2025-10-27T17:37:06.12a", None),
            ("2025-10", None),
            ("2025-02-30", None),
            ("0000-01-01", None),
            ("yesterday", None),
            ("", None),
        ];
        for &(input, expected) in cases {
            assert_eq!(parse_epoch_ms(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_pre_epoch_truncates_toward_zero() {
        assert_eq!(parse_epoch_ms("1969-12-31T23:59:59.9996Z"), Some(0));
        assert_eq!(parse_epoch_ms("1969-12-31T23:59:59.5Z"), Some(-500));
    }

    #[test]
    fn test_non_ascii_is_rejected() {
        assert_eq!(parse_epoch_ms("2025-10-27T17:37:06\u{FFFD}"), None);
    }
}
