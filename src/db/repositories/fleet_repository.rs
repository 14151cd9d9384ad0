use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::fleet::{BaseRecord, VehicleRecord};

#[derive(Debug, Clone)]
pub struct VehicleRow {
    pub id: String,
    pub number: String,
    pub created_at: String,
    pub updated_at: String,
}

impl VehicleRow {
    pub fn from_record(record: &VehicleRecord) -> Self {
        Self {
            id: record.id.clone(),
            number: record.number.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> VehicleRecord {
        VehicleRecord {
            id: self.id,
            number: self.number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<&Row<'_>> for VehicleRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            number: row.get("number")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct VehicleRepository;

impl VehicleRepository {
    pub fn insert(conn: &Connection, row: &VehicleRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO vehicles (id, number, created_at, updated_at)
                VALUES (:id, :number, :created_at, :updated_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":number": &row.number,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM vehicles WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<VehicleRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, number, created_at, updated_at FROM vehicles WHERE id = ?1",
        )?;
        let row = stmt
            .query_row([id], |row| VehicleRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<VehicleRow>> {
        let mut stmt = conn
            .prepare("SELECT id, number, created_at, updated_at FROM vehicles ORDER BY number")?;
        let rows = stmt
            .query_map([], |row| VehicleRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[derive(Debug, Clone)]
pub struct BaseRow {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BaseRow {
    pub fn from_record(record: &BaseRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            location: record.location.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> BaseRecord {
        BaseRecord {
            id: self.id,
            name: self.name,
            location: self.location,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<&Row<'_>> for BaseRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            location: row.get("location")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct BaseRepository;

impl BaseRepository {
    pub fn insert(conn: &Connection, row: &BaseRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO bases (id, name, location, created_at, updated_at)
                VALUES (:id, :name, :location, :created_at, :updated_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":location": &row.location,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM bases WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<BaseRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, location, created_at, updated_at FROM bases WHERE id = ?1",
        )?;
        let row = stmt
            .query_row([id], |row| BaseRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<BaseRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, location, created_at, updated_at FROM bases ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], |row| BaseRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
