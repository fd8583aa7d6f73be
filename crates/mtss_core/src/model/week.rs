//! Week calendar rules and week-sheet naming.
//!
//! # Responsibility
//! - Snap arbitrary dates to the Monday of their week.
//! - Produce the five weekday labels stamped into each week sheet.
//! - Parse user-typed start dates and week counts.
//!
//! # Invariants
//! - `align_to_monday(d)` is a Monday, `<= d`, and less than 7 days before `d`.
//! - Week sheets are named exactly `Week {n}` with `n` a positive integer.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

/// Number of data-entry days per week sheet (Monday to Friday).
pub const WEEKDAYS_PER_WEEK: usize = 5;

/// Day names in stamp-cell order.
pub const WEEKDAY_NAMES: [&str; WEEKDAYS_PER_WEEK] =
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Largest number of weeks one setup run may create (five school years).
pub const MAX_WEEKS_PER_RUN: u32 = 260;

/// Prefix shared by every generated week sheet name.
pub const WEEK_SHEET_PREFIX: &str = "Week ";

static WEEK_SHEET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Week (\d+)$").expect("valid week sheet regex"));
static US_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid month/day/year regex")
});
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid iso date regex"));
static LEADING_INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("valid leading integer regex"));

/// Builds the sheet name for week `number`.
pub fn week_sheet_name(number: u32) -> String {
    format!("{WEEK_SHEET_PREFIX}{number}")
}

/// Returns whether `name` follows the `Week {n}` pattern.
pub fn is_week_sheet_name(name: &str) -> bool {
    WEEK_SHEET_RE.is_match(name)
}

/// Extracts the week number from a week sheet name.
///
/// Returns `None` for non-matching names and for numbers that overflow `u32`.
pub fn parse_week_sheet_number(name: &str) -> Option<u32> {
    WEEK_SHEET_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Rolls `date` back to the Monday of its week.
///
/// Sunday belongs to the week that started six days earlier.
pub fn align_to_monday(date: NaiveDate) -> NaiveDate {
    let back = match date.weekday() {
        Weekday::Mon => 0,
        Weekday::Sun => 6,
        other => u64::from(other.number_from_monday() - 1),
    };
    date - Days::new(back)
}

/// Returns Monday through Friday starting at `monday`.
///
/// `monday` is not re-aligned; callers pass an already aligned date.
/// Returns `None` only when the week runs past the supported calendar.
pub fn week_dates(monday: NaiveDate) -> Option<[NaiveDate; WEEKDAYS_PER_WEEK]> {
    let mut dates = [monday; WEEKDAYS_PER_WEEK];
    for (offset, slot) in dates.iter_mut().enumerate() {
        *slot = monday.checked_add_days(Days::new(offset as u64))?;
    }
    Some(dates)
}

/// Formats a date as zero-padded `MM/DD/YYYY`.
pub fn format_sheet_date(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.month(), date.day(), date.year())
}

/// Week date labels ready to be written into a week sheet.
pub fn week_date_labels(monday: NaiveDate) -> Option<[String; WEEKDAYS_PER_WEEK]> {
    let dates = week_dates(monday)?;
    Some(dates.map(format_sheet_date))
}

/// Monday of the `index`-th week after `first_monday` (0-based).
pub fn nth_monday(first_monday: NaiveDate, index: u32) -> Option<NaiveDate> {
    first_monday.checked_add_days(Days::new(u64::from(index) * 7))
}

/// Parses a user-typed start date.
///
/// Accepts `M/D/YYYY` (one or two digit month/day) and ISO `YYYY-MM-DD`.
/// Surrounding whitespace is ignored. Impossible dates such as `02/30/2024`
/// are rejected.
pub fn parse_start_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if let Some(caps) = US_DATE_RE.captures(trimmed) {
        let month = caps[1].parse::<u32>().ok()?;
        let day = caps[2].parse::<u32>().ok()?;
        let year = caps[3].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(caps) = ISO_DATE_RE.captures(trimmed) {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        let day = caps[3].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

/// Parses the number of weeks to create.
///
/// Uses the leading integer of the trimmed input (`"3 weeks"` is 3).
/// Returns `None` when no integer leads the input or the value is outside
/// `1..=MAX_WEEKS_PER_RUN`.
pub fn parse_week_count(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let matched = LEADING_INT_RE.find(trimmed)?.as_str();
    let value = matched.parse::<i64>().ok()?;
    let count = u32::try_from(value).ok()?;
    (1..=MAX_WEEKS_PER_RUN).contains(&count).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::{
        align_to_monday, format_sheet_date, is_week_sheet_name, parse_start_date,
        parse_week_count, parse_week_sheet_number, week_date_labels, week_sheet_name,
        MAX_WEEKS_PER_RUN,
    };
    use chrono::{Datelike, NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wednesday_rolls_back_two_days() {
        assert_eq!(align_to_monday(date(2024, 7, 10)), date(2024, 7, 8));
    }

    #[test]
    fn sunday_rolls_back_six_days() {
        assert_eq!(align_to_monday(date(2024, 7, 14)), date(2024, 7, 8));
    }

    #[test]
    fn monday_is_unchanged() {
        assert_eq!(align_to_monday(date(2024, 7, 8)), date(2024, 7, 8));
    }

    #[test]
    fn alignment_holds_for_every_day_of_a_year() {
        let mut day = date(2023, 12, 25);
        for _ in 0..400 {
            let monday = align_to_monday(day);
            assert_eq!(monday.weekday(), Weekday::Mon);
            assert!(monday <= day);
            assert!((day - monday).num_days() < 7);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn week_labels_are_zero_padded_and_consecutive() {
        let labels = week_date_labels(date(2024, 12, 30)).unwrap();
        assert_eq!(
            labels,
            [
                "12/30/2024",
                "12/31/2024",
                "01/01/2025",
                "01/02/2025",
                "01/03/2025"
            ]
        );
        assert_eq!(format_sheet_date(date(2024, 3, 4)), "03/04/2024");
    }

    #[test]
    fn week_sheet_names_round_trip_through_pattern() {
        assert_eq!(week_sheet_name(12), "Week 12");
        assert!(is_week_sheet_name("Week 12"));
        assert!(!is_week_sheet_name("Week_Template"));
        assert!(!is_week_sheet_name("Week 3 (copy)"));
        assert!(!is_week_sheet_name("week 3"));
        assert_eq!(parse_week_sheet_number("Week 007"), Some(7));
        assert_eq!(parse_week_sheet_number("Summary"), None);
    }

    #[test]
    fn start_date_accepts_us_and_iso_forms() {
        assert_eq!(parse_start_date(" 07/10/2024 "), Some(date(2024, 7, 10)));
        assert_eq!(parse_start_date("7/4/2024"), Some(date(2024, 7, 4)));
        assert_eq!(parse_start_date("2024-07-10"), Some(date(2024, 7, 10)));
    }

    #[test]
    fn start_date_rejects_garbage_and_impossible_dates() {
        assert_eq!(parse_start_date("next monday"), None);
        assert_eq!(parse_start_date("02/30/2024"), None);
        assert_eq!(parse_start_date("13/01/2024"), None);
        assert_eq!(parse_start_date(""), None);
    }

    #[test]
    fn week_count_uses_leading_integer() {
        assert_eq!(parse_week_count("4"), Some(4));
        assert_eq!(parse_week_count(" 3 weeks"), Some(3));
        assert_eq!(parse_week_count("+2"), Some(2));
    }

    #[test]
    fn week_count_rejects_non_positive_and_non_numeric() {
        assert_eq!(parse_week_count("0"), None);
        assert_eq!(parse_week_count("-3"), None);
        assert_eq!(parse_week_count("three"), None);
        assert_eq!(parse_week_count(""), None);
        assert_eq!(parse_week_count("99999999999"), None);
    }

    #[test]
    fn week_count_is_capped_per_run() {
        assert_eq!(parse_week_count("260"), Some(MAX_WEEKS_PER_RUN));
        assert_eq!(parse_week_count("261"), None);
        assert_eq!(parse_week_count("5000000"), None);
    }
}
