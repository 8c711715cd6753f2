use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physically distinguishable lot of one item at one location.
///
/// Stock units are created at receipt, relocated by putaway and picking,
/// and drained by shipment. Zero-quantity units are kept as history and
/// never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub stock_unit_id: i64,
    pub inventory_item_id: i64,
    pub warehouse_id: i32,
    pub location_id: i32,
    pub pallet_id: Option<String>,
    pub batch_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_on_hand: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_allocated: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_available: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_shipped: Decimal,
    pub status: String,
    pub disposition: Option<String>,
    /// Provenance link back to the receipt line this unit was split
    /// from. Together with `disposition` it keys putaway idempotence.
    pub receipt_line_id: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_weight: Option<Decimal>,
    /// Optimistic concurrency counter; every write is conditional on the
    /// version last read.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item_master::Entity",
        from = "Column::InventoryItemId",
        to = "super::item_master::Column::InventoryItemId"
    )]
    ItemMaster,
    #[sea_orm(
        belongs_to = "super::stock_location::Entity",
        from = "Column::LocationId",
        to = "super::stock_location::Column::LocationId"
    )]
    StockLocation,
    #[sea_orm(has_many = "super::stock_allocation::Entity")]
    StockAllocations,
}

impl Related<super::item_master::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemMaster.def()
    }
}

impl Related<super::stock_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockLocation.def()
    }
}

impl Related<super::stock_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle state of a stock unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    Received,
    PutAway,
    Allocated,
    Picked,
    Shipped,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Received => "received",
            StockStatus::PutAway => "putaway",
            StockStatus::Allocated => "allocated",
            StockStatus::Picked => "picked",
            StockStatus::Shipped => "shipped",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "received" => Some(StockStatus::Received),
            "putaway" => Some(StockStatus::PutAway),
            "allocated" => Some(StockStatus::Allocated),
            "picked" => Some(StockStatus::Picked),
            "shipped" => Some(StockStatus::Shipped),
            _ => None,
        }
    }
}

/// Classification of a received quantity split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Good,
    Damage,
    Missing,
    Defective,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Good => "good",
            Disposition::Damage => "damage",
            Disposition::Missing => "missing",
            Disposition::Defective => "defective",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "good" => Some(Disposition::Good),
            "damage" => Some(Disposition::Damage),
            "missing" => Some(Disposition::Missing),
            "defective" => Some(Disposition::Defective),
            _ => None,
        }
    }

    /// Prefix used when synthesizing a pallet id for a created split.
    pub fn pallet_prefix(&self) -> &'static str {
        match self {
            Disposition::Good => "PAL-",
            Disposition::Damage => "DAM-",
            Disposition::Missing => "MIS-",
            Disposition::Defective => "DEF-",
        }
    }
}

impl Model {
    pub fn stock_status(&self) -> Option<StockStatus> {
        StockStatus::from_str(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            StockStatus::Received,
            StockStatus::PutAway,
            StockStatus::Allocated,
            StockStatus::Picked,
            StockStatus::Shipped,
        ] {
            assert_eq!(StockStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(StockStatus::from_str("quarantined"), None);
    }

    #[test]
    fn disposition_pallet_prefixes() {
        assert_eq!(Disposition::Good.pallet_prefix(), "PAL-");
        assert_eq!(Disposition::Damage.pallet_prefix(), "DAM-");
        assert_eq!(Disposition::Missing.pallet_prefix(), "MIS-");
        assert_eq!(Disposition::Defective.pallet_prefix(), "DEF-");
    }
}
