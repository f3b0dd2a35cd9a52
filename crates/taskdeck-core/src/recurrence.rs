//! Pure recurrence decision logic.
//!
//! Everything here is side-effect free: inputs are a template record and a
//! moment in time, outputs are decisions. Whether an instance already exists
//! for a day is deliberately not answered here; that check lives with the
//! materializer so this module stays trivially testable.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;

use crate::models::{Recurrence, Task};

/// Recurrence evaluation context: the timezone whose wall clock defines
/// "today", weekday indices, and the minute gate. Day windows and occurrence
/// day keys are all derived from this zone.
#[derive(Debug, Clone, Copy)]
pub struct RecurrencePolicy {
    pub timezone: Tz,
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

/// What a sweep tick should do for one template at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepDecision {
    /// Materialize an instance anchored at this moment.
    Due(DateTime<Utc>),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No recurrence tag at all.
    NotRecurring,
    /// Monthly cadence is rollover-only, the sweep never fires for it.
    CadenceNotSwept,
    /// No deadline means no time-of-day to match, so the record is never swept.
    NoDeadline,
    /// The clock has not landed exactly on the template's (hour, minute).
    MinuteMismatch,
    /// Weekly template whose weekday set does not include today.
    DayNotScheduled,
}

impl RecurrencePolicy {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// `[00:00:00.000, 23:59:59.999]` of the local calendar day containing
    /// `at`, expressed as UTC instants.
    pub fn day_bounds(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let date = at.with_timezone(&self.timezone).date_naive();
        let start = self.resolve_local(date.and_hms_milli_opt(0, 0, 0, 0).unwrap());
        let end = self.resolve_local(date.and_hms_milli_opt(23, 59, 59, 999).unwrap());
        (start, end)
    }

    /// The local calendar day `at` falls on.
    pub fn occurrence_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }

    /// Storage key for the occurrence day (`YYYY-MM-DD`).
    pub fn day_key(&self, at: DateTime<Utc>) -> String {
        self.occurrence_day(at).format("%Y-%m-%d").to_string()
    }

    /// Decides whether `template` is due for materialization at `now`.
    ///
    /// Daily templates are eligible every day; Weekly templates only on days
    /// in their weekday set. Either way the local clock must sit exactly on
    /// the deadline's (hour, minute): a tick that misses the minute skips
    /// that day's instance for good, it is never backfilled.
    pub fn sweep_decision(&self, template: &Task, now: DateTime<Utc>) -> SweepDecision {
        let cadence = match template.recurring {
            Some(cadence) => cadence,
            None => return SweepDecision::Skip(SkipReason::NotRecurring),
        };
        if cadence == Recurrence::Monthly {
            return SweepDecision::Skip(SkipReason::CadenceNotSwept);
        }
        let deadline = match template.deadline {
            Some(deadline) => deadline,
            None => return SweepDecision::Skip(SkipReason::NoDeadline),
        };

        let local_now = now.with_timezone(&self.timezone);
        let local_deadline = deadline.with_timezone(&self.timezone);
        if (local_now.hour(), local_now.minute())
            != (local_deadline.hour(), local_deadline.minute())
        {
            return SweepDecision::Skip(SkipReason::MinuteMismatch);
        }

        if cadence == Recurrence::Weekly {
            let today = local_now.weekday().num_days_from_sunday() as u8;
            if !template.weekdays().contains(&today) {
                return SweepDecision::Skip(SkipReason::DayNotScheduled);
            }
        }

        let time = NaiveTime::from_hms_opt(local_deadline.hour(), local_deadline.minute(), 0)
            .unwrap();
        let occurrence = self.resolve_local(local_now.date_naive().and_time(time));
        SweepDecision::Due(occurrence)
    }

    /// Next occurrence after `from`: one day for Daily, seven days for
    /// Weekly, one calendar month (day clamped) for Monthly. The local
    /// wall-clock time-of-day is preserved across DST transitions.
    pub fn next_occurrence(&self, cadence: Recurrence, from: DateTime<Utc>) -> DateTime<Utc> {
        let local = from.with_timezone(&self.timezone);
        let date = local.date_naive();
        let next_date = match cadence {
            Recurrence::Daily => date + Duration::days(1),
            Recurrence::Weekly => date + Duration::days(7),
            Recurrence::Monthly => date.checked_add_months(Months::new(1)).unwrap_or(date),
        };
        self.resolve_local(next_date.and_time(local.time()))
    }

    /// Maps a local naive datetime back to UTC. Ambiguous times (fall back)
    /// take the earlier mapping; nonexistent times (spring forward) shift one
    /// hour later, matching how the gap swallows them.
    fn resolve_local(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.timezone.from_local_datetime(&naive).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => {
                let shifted = naive + Duration::hours(1);
                self.timezone
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|local| local.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recurrence, Task};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;
    use sqlx::types::Json;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn daily_template(deadline: Option<DateTime<Utc>>) -> Task {
        Task {
            title: "Daily standup".to_string(),
            recurring: Some(Recurrence::Daily),
            deadline,
            ..Default::default()
        }
    }

    fn weekly_template(deadline: DateTime<Utc>, days: Vec<u8>) -> Task {
        Task {
            title: "Weekly review".to_string(),
            recurring: Some(Recurrence::Weekly),
            recurring_days: Some(Json(days)),
            deadline: Some(deadline),
            ..Default::default()
        }
    }

    #[test]
    fn daily_is_due_exactly_on_the_minute() {
        let policy = RecurrencePolicy::default();
        let template = daily_template(Some(utc(2024, 1, 10, 9, 0)));

        // A later day at the same minute is still due.
        let now = utc(2024, 2, 3, 9, 0);
        assert_eq!(
            policy.sweep_decision(&template, now),
            SweepDecision::Due(utc(2024, 2, 3, 9, 0))
        );
    }

    #[rstest]
    #[case(utc(2024, 1, 10, 9, 1), SkipReason::MinuteMismatch)]
    #[case(utc(2024, 1, 10, 8, 59), SkipReason::MinuteMismatch)]
    #[case(utc(2024, 1, 10, 21, 0), SkipReason::MinuteMismatch)]
    fn daily_skips_off_minute(#[case] now: DateTime<Utc>, #[case] reason: SkipReason) {
        let policy = RecurrencePolicy::default();
        let template = daily_template(Some(utc(2024, 1, 10, 9, 0)));
        assert_eq!(policy.sweep_decision(&template, now), SweepDecision::Skip(reason));
    }

    #[test]
    fn template_without_deadline_is_never_swept() {
        let policy = RecurrencePolicy::default();
        let template = daily_template(None);
        assert_eq!(
            policy.sweep_decision(&template, utc(2024, 1, 10, 9, 0)),
            SweepDecision::Skip(SkipReason::NoDeadline)
        );
    }

    #[test]
    fn monthly_cadence_is_not_swept() {
        let policy = RecurrencePolicy::default();
        let mut template = daily_template(Some(utc(2024, 1, 10, 9, 0)));
        template.recurring = Some(Recurrence::Monthly);
        assert_eq!(
            policy.sweep_decision(&template, utc(2024, 2, 10, 9, 0)),
            SweepDecision::Skip(SkipReason::CadenceNotSwept)
        );
    }

    // 2024-01-08 is a Monday, 2024-01-09 a Tuesday, 2024-01-10 a Wednesday.
    #[rstest]
    #[case(utc(2024, 1, 8, 9, 0), true)]
    #[case(utc(2024, 1, 9, 9, 0), false)]
    #[case(utc(2024, 1, 10, 9, 0), true)]
    #[case(utc(2024, 1, 11, 9, 0), false)]
    fn weekly_fires_only_on_scheduled_weekdays(#[case] now: DateTime<Utc>, #[case] due: bool) {
        let policy = RecurrencePolicy::default();
        let template = weekly_template(utc(2024, 1, 1, 9, 0), vec![1, 3]); // Mon, Wed
        match policy.sweep_decision(&template, now) {
            SweepDecision::Due(occurrence) => {
                assert!(due, "expected skip at {now}");
                assert_eq!(occurrence, now);
            }
            SweepDecision::Skip(reason) => {
                assert!(!due, "expected due at {now}, skipped: {reason:?}");
                assert_eq!(reason, SkipReason::DayNotScheduled);
            }
        }
    }

    #[test]
    fn weekday_indices_count_from_sunday() {
        let policy = RecurrencePolicy::default();
        // 2024-01-07 is a Sunday.
        let template = weekly_template(utc(2024, 1, 1, 9, 0), vec![0]);
        assert!(matches!(
            policy.sweep_decision(&template, utc(2024, 1, 7, 9, 0)),
            SweepDecision::Due(_)
        ));
    }

    #[test]
    fn day_bounds_span_the_full_local_day() {
        let policy = RecurrencePolicy::default();
        let (start, end) = policy.day_bounds(utc(2024, 1, 10, 15, 30));
        assert_eq!(start, utc(2024, 1, 10, 0, 0));
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2024, 1, 10, 23, 59, 59).unwrap()
                + Duration::milliseconds(999)
        );
    }

    #[test]
    fn day_bounds_follow_the_configured_zone() {
        let policy = RecurrencePolicy::new(chrono_tz::America::New_York);
        // 02:00 UTC on Jan 11 is still Jan 10 in New York.
        let (start, end) = policy.day_bounds(utc(2024, 1, 11, 2, 0));
        assert_eq!(policy.occurrence_day(start).to_string(), "2024-01-10");
        assert_eq!(policy.occurrence_day(end).to_string(), "2024-01-10");
        assert_eq!(policy.day_key(utc(2024, 1, 11, 2, 0)), "2024-01-10");
    }

    #[rstest]
    #[case(Recurrence::Daily, utc(2024, 1, 10, 9, 0), utc(2024, 1, 11, 9, 0))]
    #[case(Recurrence::Weekly, utc(2024, 1, 10, 9, 0), utc(2024, 1, 17, 9, 0))]
    #[case(Recurrence::Monthly, utc(2024, 1, 10, 9, 0), utc(2024, 2, 10, 9, 0))]
    // Month-end clamps rather than overflowing into March.
    #[case(Recurrence::Monthly, utc(2024, 1, 31, 9, 0), utc(2024, 2, 29, 9, 0))]
    fn next_occurrence_steps_by_cadence(
        #[case] cadence: Recurrence,
        #[case] from: DateTime<Utc>,
        #[case] expected: DateTime<Utc>,
    ) {
        let policy = RecurrencePolicy::default();
        assert_eq!(policy.next_occurrence(cadence, from), expected);
    }

    #[test]
    fn next_occurrence_preserves_wall_clock_across_dst() {
        let policy = RecurrencePolicy::new(chrono_tz::America::New_York);
        // 2024-03-09 21:30 EST (UTC-5); the next day is EDT (UTC-4).
        let from = utc(2024, 3, 10, 2, 30);
        let next = policy.next_occurrence(Recurrence::Daily, from);
        let local = next.with_timezone(&chrono_tz::America::New_York);
        assert_eq!((local.hour(), local.minute()), (21, 30));
        assert_eq!(local.date_naive().to_string(), "2024-03-10");
    }

    proptest! {
        #[test]
        fn daily_next_occurrence_keeps_time_of_day(
            day in 1u32..=28,
            month in 1u32..=12,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let policy = RecurrencePolicy::default();
            let from = utc(2024, month, day, hour, minute);
            let next = policy.next_occurrence(Recurrence::Daily, from);
            prop_assert_eq!(next - from, Duration::days(1));
            prop_assert_eq!((next.hour(), next.minute()), (hour, minute));
        }
    }
}
