use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "demand_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub demand_line_id: i64,
    pub demand_header_id: i64,
    pub inventory_item_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub ordered_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::demand_header::Entity",
        from = "Column::DemandHeaderId",
        to = "super::demand_header::Column::DemandHeaderId"
    )]
    DemandHeader,
    #[sea_orm(
        belongs_to = "super::item_master::Entity",
        from = "Column::InventoryItemId",
        to = "super::item_master::Column::InventoryItemId"
    )]
    ItemMaster,
    #[sea_orm(has_many = "super::stock_allocation::Entity")]
    StockAllocations,
}

impl Related<super::demand_header::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DemandHeader.def()
    }
}

impl Related<super::item_master::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemMaster.def()
    }
}

impl Related<super::stock_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
