use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_headers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub receipt_header_id: i64,
    pub receipt_num: String,
    pub warehouse_id: i32,
    pub vendor_id: Option<i64>,
    pub status: String,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::receipt_line::Entity")]
    ReceiptLines,
}

impl Related<super::receipt_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Coarse lifecycle status of an inbound receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    New,
    Received,
    PutAway,
    Complete,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::New => "NEW",
            ReceiptStatus::Received => "RECEIVED",
            ReceiptStatus::PutAway => "PUT_AWAY",
            ReceiptStatus::Complete => "COMPLETE",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(ReceiptStatus::New),
            "RECEIVED" => Some(ReceiptStatus::Received),
            "PUT_AWAY" => Some(ReceiptStatus::PutAway),
            "COMPLETE" => Some(ReceiptStatus::Complete),
            _ => None,
        }
    }
}
