use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info};

use crate::db::repositories::fleet_repository::{
    BaseRepository, BaseRow, VehicleRepository, VehicleRow,
};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::fleet::{BaseCreateInput, BaseRecord, VehicleCreateInput, VehicleRecord};

/// Vehicle and base master data. Operation plans reference these records
/// by id; the validators only consume base names for message wording.
#[derive(Clone)]
pub struct FleetService {
    db: DbPool,
}

impl FleetService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn register_vehicle(&self, input: VehicleCreateInput) -> AppResult<VehicleRecord> {
        let number = input.number.trim().to_string();
        if number.is_empty() {
            return Err(AppError::validation("车辆编号不能为空"));
        }

        let now = Utc::now().to_rfc3339();
        let record = VehicleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            number,
            created_at: now.clone(),
            updated_at: now,
        };

        let row = VehicleRow::from_record(&record);
        self.db
            .with_connection(|conn| VehicleRepository::insert(conn, &row))?;
        info!(vehicle_id = %record.id, number = %record.number, "vehicle registered");
        Ok(record)
    }

    pub fn get_vehicle(&self, id: &str) -> AppResult<VehicleRecord> {
        let row = self
            .db
            .with_connection(|conn| VehicleRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?;
        Ok(row.into_record())
    }

    pub fn list_vehicles(&self) -> AppResult<Vec<VehicleRecord>> {
        let rows = self
            .db
            .with_connection(|conn| VehicleRepository::list_all(conn))?;
        let vehicles: Vec<_> = rows.into_iter().map(VehicleRow::into_record).collect();
        debug!(count = vehicles.len(), "vehicles listed");
        Ok(vehicles)
    }

    pub fn remove_vehicle(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| VehicleRepository::delete(conn, id))?;
        info!(vehicle_id = %id, "vehicle removed");
        Ok(())
    }

    pub fn register_base(&self, input: BaseCreateInput) -> AppResult<BaseRecord> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("基地名称不能为空"));
        }
        let location = input
            .location
            .and_then(|value| {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed)
                }
            });

        let now = Utc::now().to_rfc3339();
        let record = BaseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            location,
            created_at: now.clone(),
            updated_at: now,
        };

        let row = BaseRow::from_record(&record);
        self.db
            .with_connection(|conn| BaseRepository::insert(conn, &row))?;
        info!(base_id = %record.id, name = %record.name, "base registered");
        Ok(record)
    }

    pub fn get_base(&self, id: &str) -> AppResult<BaseRecord> {
        let row = self
            .db
            .with_connection(|conn| BaseRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?;
        Ok(row.into_record())
    }

    pub fn list_bases(&self) -> AppResult<Vec<BaseRecord>> {
        let rows = self
            .db
            .with_connection(|conn| BaseRepository::list_all(conn))?;
        let bases: Vec<_> = rows.into_iter().map(BaseRow::into_record).collect();
        debug!(count = bases.len(), "bases listed");
        Ok(bases)
    }

    pub fn remove_base(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| BaseRepository::delete(conn, id))?;
        info!(base_id = %id, "base removed");
        Ok(())
    }

    /// Base id → display name, for conflict message wording.
    pub fn base_name_lookup(&self) -> AppResult<HashMap<String, String>> {
        let bases = self.list_bases()?;
        Ok(bases
            .into_iter()
            .map(|base| (base.id, base.name))
            .collect())
    }
}
