use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::operation_plan::OperationPlanRecord;

pub const MINUTES_PER_DAY: i64 = 1440;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|err| {
        AppError::validation_with_details(
            "无效的日期格式",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn parse_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|err| {
        AppError::validation_with_details(
            "无效的时刻格式",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Days since the common-era epoch; the anchor is irrelevant, only
/// differences matter.
pub fn day_number(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    day_number(later) - day_number(earlier)
}

/// A plan's occupation interval in absolute minutes on one continuous
/// timeline. An overnight span's end lands +1440 per elapsed day past its
/// start date, so a shift crossing midnight occupies the continuation day
/// from its first minute up to the end time, the same extended-timeline
/// model both validators must agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveWindow {
    pub start_min: i64,
    pub end_min: i64,
}

impl EffectiveWindow {
    /// Open-boundary intersection: windows that merely touch do not count.
    pub fn overlaps(&self, other: &EffectiveWindow) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Exact endpoint contact, one window ending where the other starts.
    pub fn touches(&self, other: &EffectiveWindow) -> bool {
        self.end_min == other.start_min || self.start_min == other.end_min
    }
}

/// Parsed calendar fields of a plan plus its normalized window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanTimes {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub window: EffectiveWindow,
}

pub fn plan_times(plan: &OperationPlanRecord) -> AppResult<PlanTimes> {
    let start_date = parse_date(&plan.start_date)?;
    let end_date = parse_date(&plan.end_date)?;
    let start_time = parse_time(&plan.start_time)?;
    let end_time = parse_time(&plan.end_time)?;

    let window = EffectiveWindow {
        start_min: day_number(start_date) * MINUTES_PER_DAY + minutes_of_day(start_time),
        end_min: day_number(end_date) * MINUTES_PER_DAY + minutes_of_day(end_time),
    };

    Ok(PlanTimes {
        start_date,
        end_date,
        start_time,
        end_time,
        window,
    })
}

/// Date-level pre-filter: only plans sharing at least one calendar day
/// need the minute-level comparison.
pub fn shares_calendar_day(a: &PlanTimes, b: &PlanTimes) -> bool {
    a.start_date <= b.end_date && b.start_date <= a.end_date
}

pub fn describe_window(times: &PlanTimes) -> String {
    if times.start_date == times.end_date {
        format!(
            "{} {}〜{}",
            format_date(times.start_date),
            format_time(times.start_time),
            format_time(times.end_time)
        )
    } else {
        format!(
            "{} {}〜{} {}",
            format_date(times.start_date),
            format_time(times.start_time),
            format_date(times.end_date),
            format_time(times.end_time)
        )
    }
}
