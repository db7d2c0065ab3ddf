//! Aggregation of the event log into daily and monthly views
//!
//! Aggregation is a pure function of the event subset it is given:
//! re-running it on the same input always yields the same totals. Calendar
//! day keys use the local calendar, not UTC, matching how punches are shown
//! to the employee.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, TimeZone};
use punchclock_domain::constants::MILLIS_PER_HOUR;
use punchclock_domain::{
    AttendanceEvent, DailyAttendance, DayOfficeHours, PunchClockError, PunchType, Result,
};

use crate::attendance::ports::AttendanceEventRepository;

/// Total office hours worked across one day's events.
///
/// Events are processed in ascending `employee_time_millis` order against a
/// single-slot "open IN" register. An IN overwrites any unmatched prior IN
/// (unmatched INs are silently dropped from the total, a documented lossy
/// policy). An OUT closes the open interval, contributing its duration only
/// when the OUT is flagged as office work; an OUT with no open IN
/// contributes nothing.
pub fn daily_hours(events: &[AttendanceEvent]) -> f64 {
    let mut ordered: Vec<&AttendanceEvent> = events.iter().collect();
    ordered.sort_by_key(|event| (event.employee_time_millis, event.id));

    let mut total_hours = 0.0;
    let mut open_in: Option<i64> = None;

    for event in ordered {
        match event.punch_type {
            PunchType::In => open_in = Some(event.employee_time_millis),
            PunchType::Out => {
                if let Some(punched_in) = open_in.take() {
                    if event.is_office_work {
                        total_hours +=
                            (event.employee_time_millis - punched_in) as f64 / MILLIS_PER_HOUR;
                    }
                }
            }
        }
    }

    total_hours
}

/// Partition events by local calendar date of `employee_time_millis`.
///
/// Days are returned newest first; within a day, events are newest first.
/// The union of all groups equals the input set.
pub fn group_by_date(events: &[AttendanceEvent]) -> Vec<DailyAttendance> {
    let mut by_date: BTreeMap<String, Vec<AttendanceEvent>> = BTreeMap::new();
    for event in events {
        by_date
            .entry(local_date_key(event.employee_time_millis))
            .or_default()
            .push(event.clone());
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, mut day_events)| {
            day_events.sort_by_key(|event| {
                std::cmp::Reverse((event.employee_time_millis, event.id))
            });
            DailyAttendance { date, events: day_events }
        })
        .collect()
}

/// Report queries backed by the event log.
pub struct ReportsService {
    repository: Arc<dyn AttendanceEventRepository>,
}

impl ReportsService {
    pub fn new(repository: Arc<dyn AttendanceEventRepository>) -> Self {
        Self { repository }
    }

    /// All of an employee's punches grouped by local calendar day.
    pub async fn daily_report(&self, employee_id: &str) -> Result<Vec<DailyAttendance>> {
        let events = self.repository.all_for_employee(employee_id).await?;
        Ok(group_by_date(&events))
    }

    /// Per-day office hours within a `YYYY-MM` month window.
    ///
    /// Emits one entry per day that had at least one office-work OUT paired
    /// with a preceding IN, in ascending day order.
    pub async fn monthly_office_hours(
        &self,
        employee_id: &str,
        month_key: &str,
    ) -> Result<Vec<DayOfficeHours>> {
        let (start_millis, end_millis) = month_window(month_key)?;
        let events =
            self.repository.range_for_employee(employee_id, start_millis, end_millis).await?;

        let mut by_day: BTreeMap<String, Vec<AttendanceEvent>> = BTreeMap::new();
        for event in events {
            by_day.entry(local_date_key(event.employee_time_millis)).or_default().push(event);
        }

        let mut days = Vec::new();
        for (day, mut day_events) in by_day {
            day_events.sort_by_key(|event| (event.employee_time_millis, event.id));

            let mut office_hours = 0.0;
            let mut paired_office_out = false;
            let mut open_in: Option<i64> = None;
            for event in &day_events {
                match event.punch_type {
                    PunchType::In => open_in = Some(event.employee_time_millis),
                    PunchType::Out => {
                        if let Some(punched_in) = open_in.take() {
                            if event.is_office_work {
                                office_hours += (event.employee_time_millis - punched_in) as f64
                                    / MILLIS_PER_HOUR;
                                paired_office_out = true;
                            }
                        }
                    }
                }
            }

            if paired_office_out {
                days.push(DayOfficeHours { day, office_hours });
            }
        }

        Ok(days)
    }
}

/// Local calendar day key (`YYYY-MM-DD`) for an epoch-millis timestamp.
fn local_date_key(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).earliest() {
        Some(datetime) => datetime.format("%Y-%m-%d").to_string(),
        // Out-of-range timestamps cannot occur for punches captured from the
        // device clock; fall back to the epoch day rather than panicking.
        None => "1970-01-01".to_string(),
    }
}

/// Half-open `[start, end)` epoch-millis window for a `YYYY-MM` key, in
/// local time.
fn month_window(month_key: &str) -> Result<(i64, i64)> {
    let first_day = NaiveDate::parse_from_str(&format!("{month_key}-01"), "%Y-%m-%d")
        .map_err(|_| {
            PunchClockError::Validation(format!("invalid month key (expected YYYY-MM): {month_key}"))
        })?;

    let next_month = if first_day.month() == 12 {
        NaiveDate::from_ymd_opt(first_day.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first_day.year(), first_day.month() + 1, 1)
    }
    .ok_or_else(|| PunchClockError::Internal("month arithmetic overflow".into()))?;

    Ok((local_day_start_millis(first_day)?, local_day_start_millis(next_month)?))
}

fn local_day_start_millis(date: NaiveDate) -> Result<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| PunchClockError::Internal("invalid midnight".into()))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|datetime| datetime.timestamp_millis())
        .ok_or_else(|| {
            PunchClockError::Internal(format!("no local representation for {date}"))
        })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use punchclock_domain::NewAttendanceEvent;
    use tokio::sync::broadcast;

    use super::*;

    const HOUR_MS: i64 = 3_600_000;
    // Interval math in daily_hours is date-agnostic; any base works there.
    const BASE_MS: i64 = 1_770_681_600_000;

    /// Epoch millis for a local wall-clock time, so date grouping is stable
    /// regardless of the timezone the tests run in.
    fn local_ms(day: u32, hour: u32) -> i64 {
        Local
            .with_ymd_and_hms(2026, 3, day, hour, 0, 0)
            .single()
            .expect("unambiguous local time")
            .timestamp_millis()
    }

    fn event(
        id: i64,
        punch_type: PunchType,
        at_millis: i64,
        is_office_work: bool,
    ) -> AttendanceEvent {
        let mut event = NewAttendanceEvent::punched_now("emp-1", punch_type, at_millis);
        event.is_office_work = is_office_work;
        event.with_id(id)
    }

    #[test]
    fn single_office_interval_counts_in_full() {
        let events = vec![
            event(1, PunchType::In, BASE_MS + 9 * HOUR_MS, false),
            event(2, PunchType::Out, BASE_MS + 17 * HOUR_MS, true),
        ];
        assert!((daily_hours(&events) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn only_office_flagged_intervals_count() {
        let events = vec![
            event(1, PunchType::In, BASE_MS + 9 * HOUR_MS, false),
            event(2, PunchType::Out, BASE_MS + 12 * HOUR_MS, false),
            event(3, PunchType::In, BASE_MS + 13 * HOUR_MS, false),
            event(4, PunchType::Out, BASE_MS + 17 * HOUR_MS, true),
        ];
        assert!((daily_hours(&events) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn orphan_out_contributes_nothing() {
        let events = vec![event(1, PunchType::Out, BASE_MS + 17 * HOUR_MS, true)];
        assert_eq!(daily_hours(&events), 0.0);
    }

    #[test]
    fn unmatched_in_is_overwritten() {
        let events = vec![
            event(1, PunchType::In, BASE_MS + 8 * HOUR_MS, false),
            event(2, PunchType::In, BASE_MS + 10 * HOUR_MS, false),
            event(3, PunchType::Out, BASE_MS + 12 * HOUR_MS, true),
        ];
        // Only the second IN pairs with the OUT.
        assert!((daily_hours(&events) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn daily_hours_ignores_input_order() {
        let mut events = vec![
            event(2, PunchType::Out, BASE_MS + 17 * HOUR_MS, true),
            event(1, PunchType::In, BASE_MS + 9 * HOUR_MS, false),
        ];
        let shuffled = daily_hours(&events);
        events.reverse();
        assert_eq!(shuffled, daily_hours(&events));
    }

    #[test]
    fn group_by_date_partitions_and_orders() {
        let events = vec![
            event(1, PunchType::In, local_ms(10, 9), false),
            event(2, PunchType::Out, local_ms(10, 17), false),
            event(3, PunchType::In, local_ms(11, 9), false),
            event(4, PunchType::In, local_ms(12, 9), false),
        ];

        let grouped = group_by_date(&events);
        assert_eq!(grouped.len(), 3);

        // Newest date first.
        let dates: Vec<&str> = grouped.iter().map(|day| day.date.as_str()).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);

        // Union preserved.
        let total: usize = grouped.iter().map(|day| day.events.len()).sum();
        assert_eq!(total, events.len());

        // Within a day, newest first.
        let oldest_day = grouped.last().unwrap();
        assert_eq!(oldest_day.events.first().unwrap().id, 2);
        assert_eq!(oldest_day.events.last().unwrap().id, 1);
    }

    /// Range-backed fake for the monthly report.
    struct FixedLog {
        events: Vec<AttendanceEvent>,
        sender: broadcast::Sender<AttendanceEvent>,
    }

    impl FixedLog {
        fn new(events: Vec<AttendanceEvent>) -> Arc<Self> {
            let (sender, _) = broadcast::channel(4);
            Arc::new(Self { events, sender })
        }
    }

    #[async_trait]
    impl AttendanceEventRepository for FixedLog {
        async fn insert(&self, _event: NewAttendanceEvent) -> Result<i64> {
            Err(PunchClockError::Internal("read-only fixture".into()))
        }

        async fn most_recent_for_employee(
            &self,
            _employee_id: &str,
        ) -> Result<Option<AttendanceEvent>> {
            Ok(self.events.last().cloned())
        }

        async fn all_for_employee(&self, employee_id: &str) -> Result<Vec<AttendanceEvent>> {
            Ok(self
                .events
                .iter()
                .filter(|event| event.employee_id == employee_id)
                .cloned()
                .collect())
        }

        async fn range_for_employee(
            &self,
            employee_id: &str,
            start_millis: i64,
            end_millis: i64,
        ) -> Result<Vec<AttendanceEvent>> {
            Ok(self
                .events
                .iter()
                .filter(|event| {
                    event.employee_id == employee_id
                        && event.employee_time_millis >= start_millis
                        && event.employee_time_millis < end_millis
                })
                .cloned()
                .collect())
        }

        fn observe(&self) -> broadcast::Receiver<AttendanceEvent> {
            self.sender.subscribe()
        }
    }

    #[tokio::test]
    async fn monthly_office_hours_pairs_per_day() {
        let month_key = "2026-03";

        let events = vec![
            event(1, PunchType::In, local_ms(10, 9), false),
            event(2, PunchType::Out, local_ms(10, 17), true),
            event(3, PunchType::In, local_ms(11, 9), false),
            event(4, PunchType::Out, local_ms(11, 12), false),
        ];
        let service = ReportsService::new(FixedLog::new(events));

        let days = service.monthly_office_hours("emp-1", month_key).await.unwrap();
        assert_eq!(days.len(), 1, "only the office-work day qualifies");
        assert!((days[0].office_hours - 8.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn monthly_office_hours_rejects_bad_month_key() {
        let service = ReportsService::new(FixedLog::new(Vec::new()));
        let err = service.monthly_office_hours("emp-1", "March-2026").await.unwrap_err();
        assert!(matches!(err, PunchClockError::Validation(_)));
    }

    #[test]
    fn month_window_is_half_open() {
        let (start, end) = month_window("2026-08").unwrap();
        assert!(start < end);
        // December rolls into January of the next year.
        let (dec_start, dec_end) = month_window("2026-12").unwrap();
        assert!(dec_end > dec_start);
    }
}
