use bdays::HolidayCalendar;
use bdays::calendars::WeekendsOnly;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Fixed length of one working day, in hours, for duration-to-date math.
pub const BUSINESS_DAY_HOURS: i64 = 9;

/// Default task window boundaries, wall-clock in the business timezone.
pub const DAY_START_HOUR: u32 = 8;
pub const DAY_END_HOUR: u32 = 18;

/// Calendar rules for one deployment: a fixed business timezone plus a
/// weekend-only working-day definition (Saturday and Sunday excluded).
///
/// Instants are stored as UTC everywhere; every user-facing day boundary is
/// computed on wall-clock dates in the business timezone, resolved through
/// the IANA database rather than a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    tz: Tz,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::America::Sao_Paulo)
    }
}

impl BusinessCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Wall-clock view of a stored instant.
    pub fn to_business(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Wall-clock date of a stored instant.
    pub fn business_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_business(instant).date_naive()
    }

    /// Interpret a business-timezone wall-clock value as a UTC instant.
    /// Ambiguous fall-back times resolve to the earliest mapping; values in a
    /// spring-forward gap advance to the next representable wall-clock hour.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        if let Some(resolved) = self.tz.from_local_datetime(&naive).earliest() {
            return resolved.with_timezone(&Utc);
        }
        for hours in 1..=3 {
            let probe = naive + Duration::hours(hours);
            if let Some(resolved) = self.tz.from_local_datetime(&probe).earliest() {
                return resolved.with_timezone(&Utc);
            }
        }
        Utc.from_utc_datetime(&naive)
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        WeekendsOnly.is_bday(date)
    }

    /// Working-day duration of an explicit date range: the number of
    /// non-weekend dates in the closed interval `[start, end]`, measured on
    /// business-timezone dates. A range that ends before it starts is 0.
    pub fn working_days_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        let start_date = self.business_date(start);
        let end_date = self.business_date(end);
        if end_date < start_date {
            return 0;
        }
        let between = i64::from(WeekendsOnly.bdays(start_date, end_date));
        let start_day = if WeekendsOnly.is_bday(start_date) { 1 } else { 0 };
        between + start_day
    }

    /// End instant for a working-day duration: `duration × 9` hours of plain
    /// arithmetic from the start. This direction does not skip weekends.
    pub fn end_for_duration(&self, start: DateTime<Utc>, duration_days: i64) -> DateTime<Utc> {
        start + Duration::hours(duration_days * BUSINESS_DAY_HOURS)
    }

    /// Default window for a task created "now": 08:00–18:00 business time on
    /// the creation day.
    pub fn default_task_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let date = self.business_date(now);
        (
            self.instant_at(date, day_start_time()),
            self.instant_at(date, day_end_time()),
        )
    }

    /// Overdue threshold: the last second of the current business-timezone
    /// day, as a UTC instant.
    pub fn end_of_business_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.business_date(now);
        self.instant_at(date, NaiveTime::from_hms_opt(23, 59, 59).unwrap())
    }

    /// Calendar-day distance between two instants, on business-timezone dates.
    pub fn calendar_days_between(&self, earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
        self.business_date(later)
            .signed_duration_since(self.business_date(earlier))
            .num_days()
    }

    pub fn instant_at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        self.localize(date.and_time(time))
    }
}

pub fn day_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0).unwrap()
}

pub fn day_end_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DAY_END_HOUR, 0, 0).unwrap()
}
