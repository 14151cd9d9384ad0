use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::repositories::fleet_repository::{BaseRepository, VehicleRepository};
use crate::db::repositories::plan_repository::{OperationPlanRow, PlanRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::conflict::ConflictReport;
use crate::models::operation_plan::{
    OperationPlanRecord, PlanCreateInput, PlanUpdateInput, ShiftType,
};
use crate::services::detention_service::{self, Detention};
use crate::services::timeline;
use crate::services::validation_service;

/// Result of a committed save: the stored record plus the validation
/// report, which may still carry non-blocking boundary warnings the
/// caller should surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanCommit {
    pub record: OperationPlanRecord,
    pub report: ConflictReport,
}

/// Operation plan lifecycle: normalization, reference checks, consistency
/// validation against the vehicle's current plan snapshot, persistence.
#[derive(Clone)]
pub struct PlanService {
    db: DbPool,
}

impl PlanService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_plan(&self, input: PlanCreateInput) -> AppResult<PlanCommit> {
        let mut record = build_record_from_create(input)?;
        let now = Utc::now().to_rfc3339();
        record.id = uuid::Uuid::new_v4().to_string();
        record.created_at = now.clone();
        record.updated_at = now;

        let report = self.db.with_connection(|conn| {
            ensure_references(conn, &record)?;
            let report = validate_against_siblings(conn, &record)?;
            if report.passes() {
                let row = OperationPlanRow::from_record(&record)?;
                PlanRepository::insert(conn, &row)?;
            }
            Ok(report)
        })?;
        reject_if_blocking(&record, &report)?;

        info!(
            plan_id = %record.id,
            vehicle_id = %record.vehicle_id,
            start_date = %record.start_date,
            "operation plan created"
        );
        Ok(PlanCommit { record, report })
    }

    pub fn update_plan(&self, id: &str, update: PlanUpdateInput) -> AppResult<PlanCommit> {
        let mut record = self.get_plan(id)?;
        apply_update(&mut record, update)?;
        record.updated_at = Utc::now().to_rfc3339();

        let report = self.db.with_connection(|conn| {
            ensure_references(conn, &record)?;
            let report = validate_against_siblings(conn, &record)?;
            if report.passes() {
                let row = OperationPlanRow::from_record(&record)?;
                PlanRepository::update(conn, &row)?;
            }
            Ok(report)
        })?;
        reject_if_blocking(&record, &report)?;

        info!(plan_id = %record.id, "operation plan updated");
        Ok(PlanCommit { record, report })
    }

    pub fn delete_plan(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| PlanRepository::delete(conn, id))?;
        info!(plan_id = %id, "operation plan deleted");
        Ok(())
    }

    pub fn get_plan(&self, id: &str) -> AppResult<OperationPlanRecord> {
        let row = self
            .db
            .with_connection(|conn| PlanRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?;
        row.into_record()
    }

    pub fn list_plans(&self, vehicle_id: &str) -> AppResult<Vec<OperationPlanRecord>> {
        let rows = self
            .db
            .with_connection(|conn| PlanRepository::list_by_vehicle(conn, vehicle_id))?;
        let plans = rows
            .into_iter()
            .map(OperationPlanRow::into_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(vehicle_id, count = plans.len(), "plans listed");
        Ok(plans)
    }

    pub fn list_plans_in_range(
        &self,
        vehicle_id: &str,
        from: &str,
        to: &str,
    ) -> AppResult<Vec<OperationPlanRecord>> {
        let from = timeline::format_date(timeline::parse_date(from)?);
        let to = timeline::format_date(timeline::parse_date(to)?);
        let rows = self.db.with_connection(|conn| {
            PlanRepository::list_by_vehicle_in_range(conn, vehicle_id, &from, &to)
        })?;
        let plans = rows
            .into_iter()
            .map(OperationPlanRow::into_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(vehicle_id, %from, %to, count = plans.len(), "plans listed in range");
        Ok(plans)
    }

    /// Dry-run validation for editors: same checks as a save, no writes.
    /// An empty candidate id means a new plan; an existing id means an
    /// edit, which is compared against all siblings except itself.
    pub fn validate_plan(&self, candidate: &OperationPlanRecord) -> AppResult<ConflictReport> {
        self.db.with_connection(|conn| {
            ensure_references(conn, candidate)?;
            validate_against_siblings(conn, candidate)
        })
    }

    /// Where the vehicle rests on `date`, derived from its plan history
    /// when no plan covers the date explicitly.
    pub fn resolve_detention(&self, vehicle_id: &str, date: &str) -> AppResult<Detention> {
        let date = timeline::parse_date(date)?;
        let plans = self.list_plans(vehicle_id)?;
        detention_service::resolve_location(date, &plans)
    }
}

fn validate_against_siblings(
    conn: &Connection,
    candidate: &OperationPlanRecord,
) -> AppResult<ConflictReport> {
    let siblings = PlanRepository::list_by_vehicle(conn, &candidate.vehicle_id)?
        .into_iter()
        .map(OperationPlanRow::into_record)
        .collect::<AppResult<Vec<_>>>()?;
    let base_names = BaseRepository::list_all(conn)?
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();
    validation_service::validate_candidate(candidate, &siblings, &base_names)
}

fn reject_if_blocking(record: &OperationPlanRecord, report: &ConflictReport) -> AppResult<()> {
    if !report.passes() {
        return Err(AppError::validation_with_details(
            "运行计划存在冲突",
            serde_json::to_value(report)?,
        ));
    }
    for warning in report.warnings() {
        warn!(
            target: "app::validation",
            plan_id = %record.id,
            message = %warning.message,
            "boundary warning accepted"
        );
    }
    Ok(())
}

fn ensure_references(conn: &Connection, record: &OperationPlanRecord) -> AppResult<()> {
    if VehicleRepository::find_by_id(conn, &record.vehicle_id)?.is_none() {
        return Err(AppError::validation("车辆不存在"));
    }
    for base_id in [&record.departure_base_id, &record.arrival_base_id]
        .into_iter()
        .flatten()
    {
        if BaseRepository::find_by_id(conn, base_id)?.is_none() {
            return Err(AppError::validation("基地不存在"));
        }
    }
    Ok(())
}

fn build_record_from_create(mut input: PlanCreateInput) -> AppResult<OperationPlanRecord> {
    let vehicle_id = input.vehicle_id.trim().to_string();
    if vehicle_id.is_empty() {
        return Err(AppError::validation("车辆不能为空"));
    }

    let start_date = normalize_date(&input.start_date)?;
    let end_date = match input.end_date.take() {
        Some(value) if !value.trim().is_empty() => normalize_date(&value)?,
        _ => start_date.clone(),
    };
    let start_time = normalize_time(&input.start_time)?;
    let end_time = normalize_time(&input.end_time)?;
    let departure_base_id = normalize_base_ref(input.departure_base_id.take());
    let arrival_base_id = normalize_base_ref(input.arrival_base_id.take());
    let notes = normalize_optional_string(input.notes.take());

    let record = OperationPlanRecord {
        id: String::new(),
        vehicle_id,
        start_date,
        end_date,
        shift_type: input.shift_type,
        start_time,
        end_time,
        departure_base_id,
        arrival_base_id,
        notes,
        created_at: String::new(),
        updated_at: String::new(),
    };
    validate_shape(&record)?;
    Ok(record)
}

fn apply_update(record: &mut OperationPlanRecord, update: PlanUpdateInput) -> AppResult<()> {
    if let Some(start_date) = update.start_date {
        record.start_date = normalize_date(&start_date)?;
    }
    if let Some(end_date) = update.end_date {
        record.end_date = normalize_date(&end_date)?;
    }
    if let Some(shift_type) = update.shift_type {
        record.shift_type = shift_type;
    }
    if let Some(start_time) = update.start_time {
        record.start_time = normalize_time(&start_time)?;
    }
    if let Some(end_time) = update.end_time {
        record.end_time = normalize_time(&end_time)?;
    }
    if let Some(departure_base_id) = update.departure_base_id {
        record.departure_base_id = normalize_base_ref(departure_base_id);
    }
    if let Some(arrival_base_id) = update.arrival_base_id {
        record.arrival_base_id = normalize_base_ref(arrival_base_id);
    }
    if let Some(notes) = update.notes {
        record.notes = normalize_optional_string(notes);
    }
    validate_shape(record)
}

/// Cross-field rules that hold for any stored plan, independent of the
/// vehicle's other plans.
fn validate_shape(record: &OperationPlanRecord) -> AppResult<()> {
    let start_date = timeline::parse_date(&record.start_date)?;
    let end_date = timeline::parse_date(&record.end_date)?;
    if end_date < start_date {
        return Err(AppError::validation("结束日期不能早于开始日期"));
    }
    if !matches!(record.shift_type, ShiftType::Maintenance)
        && (record.departure_base_id.is_none() || record.arrival_base_id.is_none())
    {
        return Err(AppError::validation("非检修计划必须填写出发与到达基地"));
    }
    Ok(())
}

fn normalize_date(value: &str) -> AppResult<String> {
    let parsed = timeline::parse_date(value.trim())?;
    Ok(timeline::format_date(parsed))
}

fn normalize_time(value: &str) -> AppResult<String> {
    let parsed = timeline::parse_time(value.trim())?;
    Ok(timeline::format_time(parsed))
}

fn normalize_base_ref(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
