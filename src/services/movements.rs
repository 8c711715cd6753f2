use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    entities::stock_movement::{self, Entity as StockMovementEntity, MovementType},
    errors::ServiceError,
};

/// Input for one audit entry. `from_location_id` is `None` when the
/// movement creates stock out of a receipt.
#[derive(Debug, Clone)]
pub struct MovementInput {
    pub inventory_item_id: i64,
    pub stock_unit_id: Option<i64>,
    pub from_location_id: Option<i32>,
    pub to_location_id: i32,
    pub quantity_moved: Decimal,
    pub movement_type: MovementType,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub moved_by: Option<String>,
}

/// Append-only recorder for physical stock relocations. Entries are
/// never mutated or deleted; the engines write one entry per relocation
/// or creation, and none for pure reservations or in-place deductions.
#[derive(Clone)]
pub struct MovementRecorderService {
    db: Arc<DatabaseConnection>,
}

impl MovementRecorderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(item_id = input.inventory_item_id, movement_type = input.movement_type.as_str()))]
    pub async fn record(
        &self,
        input: MovementInput,
    ) -> Result<stock_movement::Model, ServiceError> {
        let movement = stock_movement::ActiveModel {
            movement_id: Set(Uuid::new_v4()),
            inventory_item_id: Set(input.inventory_item_id),
            stock_unit_id: Set(input.stock_unit_id),
            from_location_id: Set(input.from_location_id),
            to_location_id: Set(input.to_location_id),
            quantity_moved: Set(input.quantity_moved),
            movement_type: Set(input.movement_type.as_str().to_string()),
            reference_type: Set(input.reference_type),
            reference_id: Set(input.reference_id),
            moved_by: Set(input.moved_by),
            created_at: Set(Utc::now()),
        };

        movement.insert(&*self.db).await.map_err(|e| {
            error!("Failed to record stock movement: {}", e);
            ServiceError::db_error(e)
        })
    }

    /// Movement history for an item, oldest first.
    #[instrument(skip(self))]
    pub async fn history_for_item(
        &self,
        inventory_item_id: i64,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        StockMovementEntity::find()
            .filter(stock_movement::Column::InventoryItemId.eq(inventory_item_id))
            .order_by_asc(stock_movement::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Movements into or out of a location, oldest first.
    #[instrument(skip(self))]
    pub async fn history_for_location(
        &self,
        location_id: i32,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        StockMovementEntity::find()
            .filter(
                stock_movement::Column::ToLocationId
                    .eq(location_id)
                    .or(stock_movement::Column::FromLocationId.eq(location_id)),
            )
            .order_by_asc(stock_movement::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
