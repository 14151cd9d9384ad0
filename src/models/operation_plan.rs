use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Shift classification for an operation plan. Maintenance entries park the
/// vehicle inside a base, so their departure/arrival bases may be omitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ShiftType {
    Day,
    Night,
    DayNight,
    Maintenance,
}

impl ShiftType {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Day => "day",
            ShiftType::Night => "night",
            ShiftType::DayNight => "dayNight",
            ShiftType::Maintenance => "maintenance",
        }
    }

    pub fn is_maintenance(self) -> bool {
        matches!(self, ShiftType::Maintenance)
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "day" => Ok(ShiftType::Day),
            "night" => Ok(ShiftType::Night),
            "dayNight" => Ok(ShiftType::DayNight),
            "maintenance" => Ok(ShiftType::Maintenance),
            other => Err(format!("unknown shift type: {other}")),
        }
    }
}

/// One scheduled occupation of a base by a vehicle. Dates are `YYYY-MM-DD`,
/// times are `HH:MM` local time-of-day; `end_date > start_date` marks an
/// overnight span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationPlanRecord {
    pub id: String,
    pub vehicle_id: String,
    pub start_date: String,
    pub end_date: String,
    pub shift_type: ShiftType,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub departure_base_id: Option<String>,
    #[serde(default)]
    pub arrival_base_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanCreateInput {
    pub vehicle_id: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub shift_type: ShiftType,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub departure_base_id: Option<String>,
    #[serde(default)]
    pub arrival_base_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update. The outer `Option` distinguishes "leave untouched" from
/// the inner value; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdateInput {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub shift_type: Option<ShiftType>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub departure_base_id: Option<Option<String>>,
    #[serde(default)]
    pub arrival_base_id: Option<Option<String>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}
