use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::operation_plan::OperationPlanRecord;
use crate::services::timeline::{self, PlanTimes};

/// A vehicle's implicit resting location on a date with no explicit plan,
/// inherited from its last known arrival base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "baseId", rename_all = "camelCase")]
pub enum Detention {
    AtBase(String),
    Unknown,
}

impl Detention {
    pub fn base_id(&self) -> Option<&str> {
        match self {
            Detention::AtBase(base_id) => Some(base_id),
            Detention::Unknown => None,
        }
    }
}

/// Resolves where a vehicle rests on `date` given its full plan list.
///
/// A plan covering the date answers directly: the departure base on the
/// plan's first day, the arrival base afterwards. Maintenance entries
/// imply no base change, and a missing base on the chosen side tells us
/// nothing either; both fall back to the last known arrival before the
/// date. With no prior plan at all the location is unknown.
pub fn resolve_location(
    date: NaiveDate,
    plans: &[OperationPlanRecord],
) -> AppResult<Detention> {
    let mut parsed: Vec<(&OperationPlanRecord, PlanTimes)> = Vec::new();
    for plan in plans {
        parsed.push((plan, timeline::plan_times(plan)?));
    }

    let covering = parsed
        .iter()
        .filter(|(_, times)| times.start_date <= date && date <= times.end_date)
        .max_by_key(|(_, times)| (times.window.end_min, times.window.start_min));

    if let Some((plan, times)) = covering {
        if !plan.shift_type.is_maintenance() {
            let side = if date == times.start_date {
                plan.departure_base_id.as_ref()
            } else {
                plan.arrival_base_id.as_ref()
            };
            if let Some(base_id) = side {
                return Ok(Detention::AtBase(base_id.clone()));
            }
        }
    }

    let mut earlier: Vec<&(&OperationPlanRecord, PlanTimes)> = parsed
        .iter()
        .filter(|(_, times)| times.end_date < date)
        .collect();
    earlier.sort_by_key(|(_, times)| (times.window.end_min, times.window.start_min));

    for (plan, _) in earlier.into_iter().rev() {
        if let Some(base_id) = plan.arrival_base_id.as_ref() {
            return Ok(Detention::AtBase(base_id.clone()));
        }
    }

    Ok(Detention::Unknown)
}
