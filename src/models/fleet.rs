use serde::{Deserialize, Serialize};

/// Maintenance vehicle master data. Reference only; operation plans point
/// at vehicles by id and never mutate them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
    pub number: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCreateInput {
    pub number: String,
}

/// Maintenance base master data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaseRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaseCreateInput {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}
