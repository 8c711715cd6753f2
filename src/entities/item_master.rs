use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_master")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub inventory_item_id: i64,
    pub item_number: String,
    pub description: Option<String>,
    pub primary_uom_code: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_weight: Option<Decimal>,
    pub status_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_unit::Entity")]
    StockUnits,
    #[sea_orm(has_many = "super::receipt_line::Entity")]
    ReceiptLines,
    #[sea_orm(has_many = "super::demand_line::Entity")]
    DemandLines,
}

impl Related<super::stock_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockUnits.def()
    }
}

impl Related<super::receipt_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptLines.def()
    }
}

impl Related<super::demand_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DemandLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
