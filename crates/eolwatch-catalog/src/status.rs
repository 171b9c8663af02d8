//! Support status classification from a cycle's EOL field.

use chrono::NaiveDate;

use eolwatch_core::types::SupportStatus;

use crate::cycles::EolField;

/// Days before an EOL date at which a cycle is reported as SOON.
pub const DEFAULT_SOON_DAYS: u32 = 180;

/// Classify an EOL field relative to `today`.
///
/// Rules, in order:
/// - absent → `UNKNOWN`, no date
/// - boolean → `EOL` when true, `OK` when false, no date
/// - `YYYY-MM-DD` → `EOL` if strictly before today, `SOON` if within
///   `soon_days` (inclusive), `OK` otherwise; the date is returned in ISO form
/// - any other string → `UNKNOWN`, raw value kept as the date
pub fn classify(today: NaiveDate, eol: &EolField, soon_days: u32) -> (SupportStatus, Option<String>) {
    match eol {
        EolField::Absent => (SupportStatus::Unknown, None),
        EolField::Flag(true) => (SupportStatus::Eol, None),
        EolField::Flag(false) => (SupportStatus::Ok, None),
        EolField::Date(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => {
                let iso = date.format("%Y-%m-%d").to_string();
                if date < today {
                    (SupportStatus::Eol, Some(iso))
                } else if (date - today).num_days() <= i64::from(soon_days) {
                    (SupportStatus::Soon, Some(iso))
                } else {
                    (SupportStatus::Ok, Some(iso))
                }
            }
            Err(_) => (SupportStatus::Unknown, Some(raw.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 12).unwrap()
    }

    fn date_in(days: u64) -> EolField {
        let d = today().checked_add_days(Days::new(days)).unwrap();
        EolField::Date(d.format("%Y-%m-%d").to_string())
    }

    #[test]
    fn past_date_is_eol() {
        let (status, date) = classify(today(), &EolField::Date("2020-01-01".into()), 180);
        assert_eq!(status, SupportStatus::Eol);
        assert_eq!(date.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn within_threshold_is_soon() {
        assert_eq!(classify(today(), &date_in(30), 180).0, SupportStatus::Soon);
        assert_eq!(classify(today(), &date_in(180), 180).0, SupportStatus::Soon);
    }

    #[test]
    fn today_is_soon_not_eol() {
        assert_eq!(classify(today(), &date_in(0), 180).0, SupportStatus::Soon);
    }

    #[test]
    fn beyond_threshold_is_ok() {
        let (status, date) = classify(today(), &date_in(181), 180);
        assert_eq!(status, SupportStatus::Ok);
        assert!(date.is_some());
    }

    #[test]
    fn booleans() {
        assert_eq!(classify(today(), &EolField::Flag(true), 180), (SupportStatus::Eol, None));
        assert_eq!(classify(today(), &EolField::Flag(false), 180), (SupportStatus::Ok, None));
    }

    #[test]
    fn absent_is_unknown() {
        assert_eq!(classify(today(), &EolField::Absent, 180), (SupportStatus::Unknown, None));
    }

    #[test]
    fn unparsable_keeps_raw_value() {
        let (status, date) = classify(today(), &EolField::Date("soon-ish".into()), 180);
        assert_eq!(status, SupportStatus::Unknown);
        assert_eq!(date.as_deref(), Some("soon-ish"));
    }

    #[test]
    fn zero_threshold() {
        assert_eq!(classify(today(), &date_in(0), 0).0, SupportStatus::Soon);
        assert_eq!(classify(today(), &date_in(1), 0).0, SupportStatus::Ok);
    }
}
