use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "demand_headers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub demand_header_id: i64,
    pub order_num: String,
    pub warehouse_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::demand_line::Entity")]
    DemandLines,
}

impl Related<super::demand_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DemandLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Coarse lifecycle status of outbound demand. Drives which engine may
/// act on the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandStatus {
    New,
    Allocated,
    Picked,
    Shipped,
}

impl DemandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandStatus::New => "NEW",
            DemandStatus::Allocated => "ALLOCATED",
            DemandStatus::Picked => "PICKED",
            DemandStatus::Shipped => "SHIPPED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(DemandStatus::New),
            "ALLOCATED" => Some(DemandStatus::Allocated),
            "PICKED" => Some(DemandStatus::Picked),
            "SHIPPED" => Some(DemandStatus::Shipped),
            _ => None,
        }
    }
}
