use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub location_id: i32,
    pub warehouse_id: i32,
    pub location_code: String,
    pub location_name: String,
    /// Stored classification, resolved once when the location is
    /// registered. Engines read this column instead of re-matching the
    /// code/name on every call.
    pub location_class: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_unit::Entity")]
    StockUnits,
}

impl Related<super::stock_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockUnits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Functional classification of a warehouse location.
///
/// Only `Storage` locations contribute stock to the allocatable pool;
/// staging/pick areas and the disposition holding areas are transient or
/// quarantined by definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationClass {
    Storage,
    Staging,
    Damage,
    Missing,
    Defective,
}

const STAGING_MARKERS: &[&str] = &["STAGE", "STAGING", "STG", "PREP", "PICK"];
const DAMAGE_MARKERS: &[&str] = &["DAM", "DMG"];
const MISSING_MARKERS: &[&str] = &["MISS", "MIS-"];
const DEFECTIVE_MARKERS: &[&str] = &["DEF", "REJ"];

impl LocationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationClass::Storage => "storage",
            LocationClass::Staging => "staging",
            LocationClass::Damage => "damage",
            LocationClass::Missing => "missing",
            LocationClass::Defective => "defective",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "storage" => Some(LocationClass::Storage),
            "staging" => Some(LocationClass::Staging),
            "damage" => Some(LocationClass::Damage),
            "missing" => Some(LocationClass::Missing),
            "defective" => Some(LocationClass::Defective),
            _ => None,
        }
    }

    /// Deterministic classifier over location code and name substrings
    /// (case-insensitive). Runs once at registration time; the result is
    /// stored on the location record.
    pub fn classify(location_code: &str, location_name: &str) -> Self {
        let haystack = format!(
            "{} {}",
            location_code.to_uppercase(),
            location_name.to_uppercase()
        );
        let contains_any = |markers: &[&str]| markers.iter().any(|m| haystack.contains(m));

        if contains_any(DAMAGE_MARKERS) {
            LocationClass::Damage
        } else if contains_any(DEFECTIVE_MARKERS) {
            LocationClass::Defective
        } else if contains_any(MISSING_MARKERS) {
            LocationClass::Missing
        } else if contains_any(STAGING_MARKERS) {
            LocationClass::Staging
        } else {
            LocationClass::Storage
        }
    }

    /// Whether units at a location of this class count toward the
    /// available pool.
    pub fn is_allocatable(&self) -> bool {
        matches!(self, LocationClass::Storage)
    }

    pub fn is_staging(&self) -> bool {
        matches!(self, LocationClass::Staging)
    }
}

impl Model {
    pub fn class(&self) -> LocationClass {
        LocationClass::from_str(&self.location_class).unwrap_or(LocationClass::Storage)
    }
}
