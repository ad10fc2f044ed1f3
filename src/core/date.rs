#![forbid(unsafe_code)]

use time::macros::{format_description, time};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

const END_OF_DAY: Time = time!(23:59);
const MORNING: Time = time!(9:00);

/// Interprets free-text deadline input against a fixed `now`.
///
/// Empty input and "none" mean "no deadline". Relative keywords resolve to
/// fixed times of day so date-only semantics stay deterministic. Absolute
/// formats lacking a year anchor to the current year. Anything else is "not
/// understood" and also yields `None`; the caller decides what that means.
#[must_use]
pub fn parse(input: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let input = input.trim().to_lowercase();
    if input.is_empty() || input == "none" {
        return None;
    }

    let today = now.date();
    match input.as_str() {
        "today" => return Some(at(today, END_OF_DAY)),
        "tomorrow" => return Some(at(today.saturating_add(Duration::days(1)), END_OF_DAY)),
        "next week" => return Some(at(today.saturating_add(Duration::days(7)), MORNING)),
        "in 3 days" => return Some(at(today.saturating_add(Duration::days(3)), END_OF_DAY)),
        "in a week" => return Some(at(today.saturating_add(Duration::days(7)), END_OF_DAY)),
        _ => {}
    }

    parse_absolute(&input, today.year())
}

fn at(date: Date, time: Time) -> OffsetDateTime {
    PrimitiveDateTime::new(date, time).assume_utc()
}

fn parse_absolute(input: &str, default_year: i32) -> Option<OffsetDateTime> {
    let ymd_hm = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(dt) = PrimitiveDateTime::parse(input, ymd_hm) {
        return Some(dt.assume_utc());
    }

    let date_formats = [
        format_description!("[year]-[month]-[day]"),
        format_description!("[month]-[day]-[year]"),
        format_description!("[month]/[day]/[year]"),
    ];
    for format in date_formats {
        if let Ok(date) = Date::parse(input, format) {
            return Some(at(date, Time::MIDNIGHT));
        }
    }

    parse_month_day(input, default_year)
}

// "jan 2", "january 2 2026" and friends. Input is already lowercased.
fn parse_month_day(input: &str, default_year: i32) -> Option<OffsetDateTime> {
    let mut parts = input.split_whitespace();
    let month = month_from_name(parts.next()?)?;
    let day: u8 = parts.next()?.parse().ok()?;
    let year: i32 = match parts.next() {
        Some(token) => token.parse().ok()?,
        None => default_year,
    };
    if parts.next().is_some() {
        return None;
    }
    Date::from_calendar_date(year, month, day)
        .ok()
        .map(|date| at(date, Time::MIDNIGHT))
}

fn month_from_name(name: &str) -> Option<Month> {
    Some(match name {
        "jan" | "january" => Month::January,
        "feb" | "february" => Month::February,
        "mar" | "march" => Month::March,
        "apr" | "april" => Month::April,
        "may" => Month::May,
        "jun" | "june" => Month::June,
        "jul" | "july" => Month::July,
        "aug" | "august" => Month::August,
        "sep" | "sept" | "september" => Month::September,
        "oct" | "october" => Month::October,
        "nov" | "november" => Month::November,
        "dec" | "december" => Month::December,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-08-23 12:00 UTC);

    #[test]
    fn empty_and_none_clear_the_deadline() {
        assert_eq!(parse("", NOW), None);
        assert_eq!(parse("   ", NOW), None);
        assert_eq!(parse("none", NOW), None);
        assert_eq!(parse("NONE", NOW), None);
    }

    #[test]
    fn today_is_end_of_current_calendar_date() {
        assert_eq!(parse("today", NOW), Some(datetime!(2026-08-23 23:59 UTC)));
    }

    #[test]
    fn tomorrow_is_end_of_next_day() {
        assert_eq!(
            parse("Tomorrow", NOW),
            Some(datetime!(2026-08-24 23:59 UTC))
        );
    }

    #[test]
    fn next_week_is_morning_seven_days_out() {
        assert_eq!(
            parse("next week", NOW),
            Some(datetime!(2026-08-30 09:00 UTC))
        );
    }

    #[test]
    fn in_3_days_and_in_a_week() {
        assert_eq!(
            parse("in 3 days", NOW),
            Some(datetime!(2026-08-26 23:59 UTC))
        );
        assert_eq!(
            parse("in a week", NOW),
            Some(datetime!(2026-08-30 23:59 UTC))
        );
    }

    #[test]
    fn absolute_formats() {
        assert_eq!(
            parse("2026-09-01", NOW),
            Some(datetime!(2026-09-01 00:00 UTC))
        );
        assert_eq!(
            parse("2026-09-01 15:04", NOW),
            Some(datetime!(2026-09-01 15:04 UTC))
        );
        assert_eq!(
            parse("09-01-2026", NOW),
            Some(datetime!(2026-09-01 00:00 UTC))
        );
        assert_eq!(
            parse("09/01/2026", NOW),
            Some(datetime!(2026-09-01 00:00 UTC))
        );
    }

    #[test]
    fn month_name_formats_anchor_to_current_year() {
        assert_eq!(parse("Jan 2", NOW), Some(datetime!(2026-01-02 00:00 UTC)));
        assert_eq!(
            parse("january 2", NOW),
            Some(datetime!(2026-01-02 00:00 UTC))
        );
        assert_eq!(
            parse("Jan 2 2027", NOW),
            Some(datetime!(2027-01-02 00:00 UTC))
        );
    }

    #[test]
    fn unrecognized_input_is_none_not_an_error() {
        assert_eq!(parse("whenever", NOW), None);
        assert_eq!(parse("2026-13-40", NOW), None);
        assert_eq!(parse("jan 99", NOW), None);
    }
}
