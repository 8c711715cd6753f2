use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit entry for a physical stock relocation. Never
/// mutated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub movement_id: Uuid,
    pub inventory_item_id: i64,
    pub stock_unit_id: Option<i64>,
    /// Null for movements that create stock out of receipt.
    pub from_location_id: Option<i32>,
    pub to_location_id: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_moved: Decimal,
    pub movement_type: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub moved_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    Putaway,
    Picking,
    Shipment,
    Transfer,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Putaway => "putaway",
            MovementType::Picking => "picking",
            MovementType::Shipment => "shipment",
            MovementType::Transfer => "transfer",
            MovementType::Adjustment => "adjustment",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "putaway" => Some(MovementType::Putaway),
            "picking" => Some(MovementType::Picking),
            "shipment" => Some(MovementType::Shipment),
            "transfer" => Some(MovementType::Transfer),
            "adjustment" => Some(MovementType::Adjustment),
            _ => None,
        }
    }
}
