//! Calendar-day handling. Check-in dates are stored as canonical
//! zero-padded `YYYY-MM-DD` text, never as instants, so month queries
//! are plain prefix matches and no time zone is involved.

use chrono::NaiveDate;

use crate::error::AppError;

fn all_digits(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_digit)
}

/// Parses a strict `YYYY-MM-DD` calendar day. Rejects anything that is
/// not exactly ten characters of zero-padded digits and hyphens, then
/// lets chrono reject impossible days (2025-02-30, month 13, ...).
pub fn parse_day(input: &str) -> Result<NaiveDate, AppError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && all_digits(&bytes[0..4])
        && all_digits(&bytes[5..7])
        && all_digits(&bytes[8..10]);

    if !well_formed {
        return Err(AppError::Validation(format!(
            "date must be YYYY-MM-DD, got '{}'",
            input
        )));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("'{}' is not a real calendar day", input)))
}

/// A validated `YYYY-MM` month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    /// The `YYYY-MM` prefix that selects this month's logs.
    pub fn prefix(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }
}

/// Parses a strict `YYYY-MM` month string.
pub fn parse_month(input: &str) -> Result<Month, AppError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && all_digits(&bytes[0..4])
        && all_digits(&bytes[5..7]);

    if !well_formed {
        return Err(AppError::Validation(format!(
            "month must be YYYY-MM, got '{}'",
            input
        )));
    }

    let year: i32 = input[0..4]
        .parse()
        .map_err(|_| AppError::Validation(format!("bad year in '{}'", input)))?;
    let month: u32 = input[5..7]
        .parse()
        .map_err(|_| AppError::Validation(format!("bad month in '{}'", input)))?;

    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!(
            "month out of range in '{}'",
            input
        )));
    }

    Ok(Month { year, month })
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("validated month");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("validated month");

    (next - first).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_days() {
        assert!(parse_day("2025-12-04").is_ok());
        assert!(parse_day("2024-02-29").is_ok()); // leap day
        assert!(parse_day("2025-01-31").is_ok());
    }

    #[test]
    fn rejects_malformed_days() {
        for bad in [
            "2025-1-04",   // month not zero-padded
            "2025-12-4",   // day not zero-padded
            "25-12-04",    // short year
            "2025/12/04",  // wrong separator
            "2025-12-04T", // trailing garbage
            "2025-13-01",  // month 13
            "2025-02-30",  // impossible day
            "2025-02-29",  // not a leap year
            "",
            "not-a-date",
        ] {
            assert!(parse_day(bad).is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn accepts_canonical_months() {
        let m = parse_month("2025-04").unwrap();
        assert_eq!(m.prefix(), "2025-04");
        assert_eq!(m.days(), 30);
    }

    #[test]
    fn rejects_malformed_months() {
        for bad in ["2025-4", "2025-00", "2025-13", "2025", "2025-04-01", ""] {
            assert!(parse_month(bad).is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }
}
