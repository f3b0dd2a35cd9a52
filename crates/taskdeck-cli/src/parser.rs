use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parses a deadline in either accepted form — `2025-08-16` or `16-Aug-2025`,
/// each optionally followed by ` HH:MM` — interpreted in the configured
/// timezone. Date-only deadlines land on local midnight.
pub fn parse_deadline(raw: &str, timezone: Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    for format in ["%Y-%m-%d %H:%M", "%d-%b-%Y %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return resolve(naive, timezone);
        }
    }
    for format in ["%Y-%m-%d", "%d-%b-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return resolve(date.and_time(NaiveTime::MIN), timezone);
        }
    }

    Err(anyhow!(
        "unrecognized deadline '{raw}'; use '2025-08-16' or '16-Aug-2025', optionally with ' HH:MM'"
    ))
}

fn resolve(naive: NaiveDateTime, timezone: Tz) -> Result<DateTime<Utc>> {
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("'{naive}' does not exist in timezone {timezone}"))
}

/// Parses a comma-separated weekday list into 0=Sunday..6=Saturday indices.
pub fn parse_weekdays(raw: &str) -> Result<Vec<u8>> {
    raw.split(',')
        .map(|token| match token.trim().to_lowercase().as_str() {
            "sun" | "sunday" => Ok(0),
            "mon" | "monday" => Ok(1),
            "tue" | "tuesday" => Ok(2),
            "wed" | "wednesday" => Ok(3),
            "thu" | "thursday" => Ok(4),
            "fri" | "friday" => Ok(5),
            "sat" | "saturday" => Ok(6),
            other => Err(anyhow!(
                "unknown weekday '{other}'; use sun, mon, tue, wed, thu, fri, sat"
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_both_date_formats() {
        let iso = parse_deadline("2025-08-16", Tz::UTC).unwrap();
        let human = parse_deadline("16-Aug-2025", Tz::UTC).unwrap();
        assert_eq!(iso, human);
        assert_eq!(iso.hour(), 0);
    }

    #[test]
    fn parses_time_of_day() {
        let deadline = parse_deadline("2025-08-16 09:30", Tz::UTC).unwrap();
        assert_eq!((deadline.hour(), deadline.minute()), (9, 30));
    }

    #[test]
    fn time_of_day_is_local_to_the_configured_zone() {
        let deadline =
            parse_deadline("2025-01-16 09:00", chrono_tz::America::New_York).unwrap();
        assert_eq!(deadline.hour(), 14); // EST is UTC-5
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_deadline("next tuesday", Tz::UTC).is_err());
    }

    #[test]
    fn parses_weekday_lists() {
        assert_eq!(parse_weekdays("mon,wed,fri").unwrap(), vec![1, 3, 5]);
        assert_eq!(parse_weekdays("Sunday").unwrap(), vec![0]);
        assert!(parse_weekdays("mon,funday").is_err());
    }
}
