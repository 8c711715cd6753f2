// Lifecycle engines
pub mod allocation;
pub mod movements;
pub mod picking;
pub mod putaway;
pub mod quantity_ledger;
pub mod receiving;
pub mod shipment;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::{
    entities::{
        item_master::{self, Entity as ItemMasterEntity},
        stock_location::{self, Entity as StockLocationEntity, LocationClass},
    },
    errors::ServiceError,
    events::EventSender,
};

pub use allocation::AllocationService;
pub use movements::MovementRecorderService;
pub use picking::PickingService;
pub use putaway::PutawayService;
pub use quantity_ledger::QuantityLedgerService;
pub use receiving::ReceivingService;
pub use shipment::ShipmentService;

/// Looks an item up by its code.
pub(crate) async fn find_item_by_code(
    db: &DatabaseConnection,
    item_code: String,
) -> Result<item_master::Model, ServiceError> {
    ItemMasterEntity::find()
        .filter(item_master::Column::ItemNumber.eq(item_code.clone()))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item with code {} not found", item_code)))
}

/// Resolves the warehouse's staging location by stored class, lowest
/// location id first for determinism. A warehouse without a staging
/// location is a hard failure, never a silent default.
pub(crate) async fn resolve_staging_location(
    db: &DatabaseConnection,
    warehouse_id: i32,
) -> Result<stock_location::Model, ServiceError> {
    StockLocationEntity::find()
        .filter(stock_location::Column::WarehouseId.eq(warehouse_id))
        .filter(stock_location::Column::LocationClass.eq(LocationClass::Staging.as_str()))
        .order_by_asc(stock_location::Column::LocationId)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No staging location configured for warehouse {}",
                warehouse_id
            ))
        })
}

/// Registers a location, classifying it from its code and name once at
/// registration time.
pub async fn register_location(
    db: &DatabaseConnection,
    warehouse_id: i32,
    location_code: &str,
    location_name: &str,
) -> Result<stock_location::Model, ServiceError> {
    let class = LocationClass::classify(location_code, location_name);
    let location = stock_location::ActiveModel {
        warehouse_id: Set(warehouse_id),
        location_code: Set(location_code.to_string()),
        location_name: Set(location_name.to_string()),
        location_class: Set(class.as_str().to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    location.insert(db).await.map_err(ServiceError::db_error)
}

/// All engine services wired over one connection pool.
#[derive(Clone)]
pub struct WarehouseServices {
    pub ledger: QuantityLedgerService,
    pub movements: MovementRecorderService,
    pub receiving: ReceivingService,
    pub putaway: PutawayService,
    pub allocation: AllocationService,
    pub picking: PickingService,
    pub shipment: ShipmentService,
}

impl WarehouseServices {
    pub fn build(
        db: Arc<DatabaseConnection>,
        event_sender: Option<EventSender>,
        non_allocatable_location_ids: Vec<i32>,
    ) -> Self {
        let ledger = QuantityLedgerService::new(db.clone(), non_allocatable_location_ids);
        let movements = MovementRecorderService::new(db.clone());
        Self {
            receiving: ReceivingService::new(db.clone(), event_sender.clone()),
            putaway: PutawayService::new(
                db.clone(),
                ledger.clone(),
                movements.clone(),
                event_sender.clone(),
            ),
            allocation: AllocationService::new(db.clone(), ledger.clone(), event_sender.clone()),
            picking: PickingService::new(
                db.clone(),
                ledger.clone(),
                movements.clone(),
                event_sender.clone(),
            ),
            shipment: ShipmentService::new(db, ledger.clone(), event_sender),
            ledger,
            movements,
        }
    }

    /// Wires the services from loaded application configuration.
    pub fn from_config(
        db: Arc<DatabaseConnection>,
        event_sender: Option<EventSender>,
        config: &crate::config::AppConfig,
    ) -> Self {
        Self::build(
            db,
            event_sender,
            config.non_allocatable_location_ids.clone(),
        )
    }
}
