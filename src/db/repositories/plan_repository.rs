use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::operation_plan::{OperationPlanRecord, ShiftType};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        vehicle_id,
        start_date,
        end_date,
        shift_type,
        start_time,
        end_time,
        departure_base_id,
        arrival_base_id,
        notes,
        created_at,
        updated_at
    FROM operation_plans
"#;

#[derive(Debug, Clone)]
pub struct OperationPlanRow {
    pub id: String,
    pub vehicle_id: String,
    pub start_date: String,
    pub end_date: String,
    pub shift_type: String,
    pub start_time: String,
    pub end_time: String,
    pub departure_base_id: Option<String>,
    pub arrival_base_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl OperationPlanRow {
    pub fn from_record(record: &OperationPlanRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            vehicle_id: record.vehicle_id.clone(),
            start_date: record.start_date.clone(),
            end_date: record.end_date.clone(),
            shift_type: record.shift_type.as_str().to_string(),
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
            departure_base_id: record.departure_base_id.clone(),
            arrival_base_id: record.arrival_base_id.clone(),
            notes: record.notes.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        })
    }

    pub fn into_record(self) -> AppResult<OperationPlanRecord> {
        let shift_type = self
            .shift_type
            .parse::<ShiftType>()
            .map_err(AppError::database)?;
        Ok(OperationPlanRecord {
            id: self.id,
            vehicle_id: self.vehicle_id,
            start_date: self.start_date,
            end_date: self.end_date,
            shift_type,
            start_time: self.start_time,
            end_time: self.end_time,
            departure_base_id: self.departure_base_id,
            arrival_base_id: self.arrival_base_id,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for OperationPlanRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            vehicle_id: row.get("vehicle_id")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            shift_type: row.get("shift_type")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            departure_base_id: row.get("departure_base_id")?,
            arrival_base_id: row.get("arrival_base_id")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct PlanRepository;

impl PlanRepository {
    pub fn insert(conn: &Connection, row: &OperationPlanRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO operation_plans (
                    id,
                    vehicle_id,
                    start_date,
                    end_date,
                    shift_type,
                    start_time,
                    end_time,
                    departure_base_id,
                    arrival_base_id,
                    notes,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :vehicle_id,
                    :start_date,
                    :end_date,
                    :shift_type,
                    :start_time,
                    :end_time,
                    :departure_base_id,
                    :arrival_base_id,
                    :notes,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":vehicle_id": &row.vehicle_id,
                ":start_date": &row.start_date,
                ":end_date": &row.end_date,
                ":shift_type": &row.shift_type,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
                ":departure_base_id": &row.departure_base_id,
                ":arrival_base_id": &row.arrival_base_id,
                ":notes": &row.notes,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &OperationPlanRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE operation_plans SET
                    vehicle_id = :vehicle_id,
                    start_date = :start_date,
                    end_date = :end_date,
                    shift_type = :shift_type,
                    start_time = :start_time,
                    end_time = :end_time,
                    departure_base_id = :departure_base_id,
                    arrival_base_id = :arrival_base_id,
                    notes = :notes,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":vehicle_id": &row.vehicle_id,
                ":start_date": &row.start_date,
                ":end_date": &row.end_date,
                ":shift_type": &row.shift_type,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
                ":departure_base_id": &row.departure_base_id,
                ":arrival_base_id": &row.arrival_base_id,
                ":notes": &row.notes,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM operation_plans WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<OperationPlanRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| OperationPlanRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// All plans of one vehicle, time-sorted. Validators rely on this
    /// ordering to scan siblings chronologically.
    pub fn list_by_vehicle(conn: &Connection, vehicle_id: &str) -> AppResult<Vec<OperationPlanRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE vehicle_id = ?1 ORDER BY start_date, start_time",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([vehicle_id], |row| OperationPlanRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Plans of one vehicle whose date span touches `[from, to]`. ISO dates
    /// compare lexicographically, so plain string comparison is correct.
    pub fn list_by_vehicle_in_range(
        conn: &Connection,
        vehicle_id: &str,
        from: &str,
        to: &str,
    ) -> AppResult<Vec<OperationPlanRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE vehicle_id = :vehicle_id AND start_date <= :to AND end_date >= :from ORDER BY start_date, start_time",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":vehicle_id": vehicle_id,
                    ":from": from,
                    ":to": to,
                },
                |row| OperationPlanRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
