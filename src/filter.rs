//! Equality filters on event class, code and value

use crate::event::EventRecord;
use std::num::ParseIntError;

/// Three independent predicates; an unset field passes everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub class: Option<u16>,
    pub code: Option<u16>,
    pub value: Option<i32>,
}

impl EventFilter {
    pub fn matches(&self, record: &EventRecord) -> bool {
        self.class.is_none_or(|c| c == record.class)
            && self.code.is_none_or(|c| c == record.code)
            && self.value.is_none_or(|v| v == record.value)
    }
}

/// Parse an integer the way C's `strtol(s, NULL, 0)` reads it: `0x` prefix
/// for hex, a leading `0` for octal, decimal otherwise. A leading `-` is
/// allowed for signed targets.
pub fn parse_number<T>(s: &str) -> Result<T, String>
where
    T: TryFrom<i64>,
{
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    // from_str_radix would accept a second sign inside the digits
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("invalid number '{s}'"));
    }
    let magnitude = i64::from_str_radix(body, radix)
        .map_err(|e: ParseIntError| format!("invalid number '{s}': {e}"))?;

    let value = if negative {
        magnitude
            .checked_neg()
            .ok_or_else(|| format!("number '{s}' is out of range"))?
    } else {
        magnitude
    };
    T::try_from(value).map_err(|_| format!("number '{s}' is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Timestamp;

    fn key(code: u16, value: i32) -> EventRecord {
        EventRecord::new(Timestamp::new(1, 0), 1, code, value)
    }

    #[test]
    fn test_unset_filter_passes_everything() {
        let filter = EventFilter::default();
        assert!(filter.matches(&key(30, 1)));
        assert!(filter.matches(&EventRecord::new(Timestamp::default(), 0, 0, 0)));
    }

    #[test]
    fn test_each_predicate_applies() {
        let filter = EventFilter {
            class: Some(1),
            code: Some(30),
            value: Some(1),
        };
        assert!(filter.matches(&key(30, 1)));
        assert!(!filter.matches(&key(31, 1)));
        assert!(!filter.matches(&key(30, 0)));
        assert!(!filter.matches(&EventRecord::new(Timestamp::default(), 2, 30, 1)));
    }

    #[test]
    fn test_decision_is_stable() {
        let filter = EventFilter {
            value: Some(0),
            ..Default::default()
        };
        let record = key(30, 0);
        assert_eq!(filter.matches(&record), filter.matches(&record));
    }

    #[test]
    fn test_parse_number_bases() {
        assert_eq!(parse_number::<u16>("30"), Ok(30));
        assert_eq!(parse_number::<u16>("0x1e"), Ok(30));
        assert_eq!(parse_number::<u16>("036"), Ok(30));
        assert_eq!(parse_number::<u16>("0"), Ok(0));
        assert_eq!(parse_number::<i32>("-1"), Ok(-1));
        assert!(parse_number::<u16>("-1").is_err());
        assert!(parse_number::<u16>("0x10000").is_err());
        assert!(parse_number::<u16>("key").is_err());
        assert!(parse_number::<u16>("").is_err());
        assert!(parse_number::<u16>("0x").is_err());
        assert!(parse_number::<u16>("09").is_err());
    }

    #[test]
    fn test_parse_number_rejects_embedded_signs() {
        for input in ["0-5", "0x-5", "-0x-5", "--5", "+-5", "-+5", "0+5"] {
            assert!(parse_number::<i32>(input).is_err(), "{input} accepted");
        }
        assert!(parse_number::<i32>("--9223372036854775808").is_err());
        assert!(parse_number::<i64>("-9223372036854775807").is_ok());
    }
}
