use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A reservation linking a demand line to exactly one stock unit. One
/// stock unit may back several allocations.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_allocations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub allocation_id: i64,
    pub demand_line_id: i64,
    pub stock_unit_id: i64,
    pub inventory_item_id: i64,
    pub location_id: i32,
    pub pallet_id: Option<String>,
    pub batch_number: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_allocated: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_picked: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_shipped: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::demand_line::Entity",
        from = "Column::DemandLineId",
        to = "super::demand_line::Column::DemandLineId"
    )]
    DemandLine,
    #[sea_orm(
        belongs_to = "super::stock_unit::Entity",
        from = "Column::StockUnitId",
        to = "super::stock_unit::Column::StockUnitId"
    )]
    StockUnit,
}

impl Related<super::demand_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DemandLine.def()
    }
}

impl Related<super::stock_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockUnit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStatus {
    Allocated,
    Picked,
    Shipped,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Allocated => "allocated",
            AllocationStatus::Picked => "picked",
            AllocationStatus::Shipped => "shipped",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "allocated" => Some(AllocationStatus::Allocated),
            "picked" => Some(AllocationStatus::Picked),
            "shipped" => Some(AllocationStatus::Shipped),
            _ => None,
        }
    }
}
