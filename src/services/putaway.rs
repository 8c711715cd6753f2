use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        item_master,
        receipt_header::{self, Entity as ReceiptHeaderEntity, ReceiptStatus},
        receipt_line::{self, Entity as ReceiptLineEntity},
        stock_location,
        stock_movement::MovementType,
        stock_unit::{self, Disposition, Entity as StockUnitEntity, StockStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        find_item_by_code,
        movements::{MovementInput, MovementRecorderService},
        quantity_ledger::{self, QuantityLedgerService},
        resolve_staging_location,
    },
};

/// One portion of a received line bound for a target location.
#[derive(Debug, Clone)]
pub struct PutawaySplit {
    pub quantity: Decimal,
    pub location_id: i32,
    pub disposition: Disposition,
    /// Caller-supplied pallet id; a disposition-prefixed synthetic id is
    /// generated when absent.
    pub pallet_id: Option<String>,
}

/// Outcome of one split, success or failure.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub disposition: Disposition,
    pub location_id: i32,
    pub quantity: Decimal,
    pub pallet_id: Option<String>,
    pub stock_unit_id: Option<i64>,
    pub error: Option<String>,
}

impl SplitOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct PutawayOutcome {
    pub receipt_line_id: i64,
    pub splits: Vec<SplitOutcome>,
    pub pallet_ids_by_disposition: HashMap<Disposition, Vec<String>>,
    pub success: bool,
}

/// Putaway engine: consumes a received line and a set of disposition
/// splits, relocating the staging unit for the good portion and creating
/// disposition units for the rest. Quantity is conserved across the
/// split set; mid-sequence failures leave completed splits applied.
#[derive(Clone)]
pub struct PutawayService {
    db: Arc<DatabaseConnection>,
    ledger: QuantityLedgerService,
    movements: MovementRecorderService,
    event_sender: Option<EventSender>,
}

impl PutawayService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        ledger: QuantityLedgerService,
        movements: MovementRecorderService,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            ledger,
            movements,
            event_sender,
        }
    }

    /// Puts a received line away according to `splits`.
    ///
    /// Fails `QuantityMismatch` before any mutation when the splits do
    /// not sum to the received quantity. Re-submitting an identical
    /// split set is idempotent: the good split re-relocates its unit and
    /// created splits are found by their (receipt line, disposition,
    /// location) provenance instead of being duplicated.
    #[instrument(skip(self, splits), fields(split_count = splits.len()))]
    pub async fn putaway(
        &self,
        receipt_line_id: i64,
        splits: Vec<PutawaySplit>,
        actor: Option<String>,
    ) -> Result<PutawayOutcome, ServiceError> {
        let db = &*self.db;

        let line = ReceiptLineEntity::find_by_id(receipt_line_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Receipt line {} not found", receipt_line_id))
            })?;

        self.validate_splits(&line, &splits)?;

        let header = ReceiptHeaderEntity::find_by_id(line.receipt_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Receipt header {} not found",
                    line.receipt_header_id
                ))
            })?;

        let item = self.resolve_item(&line).await?;
        let staging = resolve_staging_location(db, header.warehouse_id).await?;

        let mut outcomes: Vec<SplitOutcome> = Vec::with_capacity(splits.len());
        let mut good_seen = false;

        for split in &splits {
            let is_relocation = split.disposition == Disposition::Good && !good_seen;
            if split.disposition == Disposition::Good {
                good_seen = true;
            }

            let result = if is_relocation {
                self.apply_good_split(&line, &item, &staging, header.warehouse_id, split, actor.clone())
                    .await
            } else {
                self.apply_created_split(&line, &item, &staging, header.warehouse_id, split, actor.clone())
                    .await
            };

            match result {
                Ok((stock_unit_id, pallet_id)) => outcomes.push(SplitOutcome {
                    disposition: split.disposition,
                    location_id: split.location_id,
                    quantity: split.quantity,
                    pallet_id: Some(pallet_id),
                    stock_unit_id: Some(stock_unit_id),
                    error: None,
                }),
                Err(e) => {
                    warn!(
                        receipt_line_id,
                        disposition = split.disposition.as_str(),
                        "Putaway split failed: {}",
                        e
                    );
                    outcomes.push(SplitOutcome {
                        disposition: split.disposition,
                        location_id: split.location_id,
                        quantity: split.quantity,
                        pallet_id: split.pallet_id.clone(),
                        stock_unit_id: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let put_away_total: Decimal = outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.quantity)
            .sum();

        let mut active: receipt_line::ActiveModel = line.clone().into();
        active.quantity_put_away = Set(put_away_total);
        active.updated_at = Set(Utc::now());
        active.update(db).await.map_err(ServiceError::db_error)?;

        self.maybe_flip_header(&header).await?;

        let mut pallet_ids_by_disposition: HashMap<Disposition, Vec<String>> = HashMap::new();
        for outcome in outcomes.iter().filter(|o| o.succeeded()) {
            if let Some(pallet) = &outcome.pallet_id {
                pallet_ids_by_disposition
                    .entry(outcome.disposition)
                    .or_default()
                    .push(pallet.clone());
            }
        }

        let success = outcomes.iter().all(|o| o.succeeded());
        let applied = outcomes.iter().filter(|o| o.succeeded()).count();

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockPutAway {
                    receipt_line_id,
                    inventory_item_id: item.inventory_item_id,
                    splits_applied: applied,
                    total_quantity: put_away_total,
                })
                .await;
        }

        info!(
            receipt_line_id,
            applied,
            total = outcomes.len(),
            "Putaway finished"
        );

        Ok(PutawayOutcome {
            receipt_line_id,
            splits: outcomes,
            pallet_ids_by_disposition,
            success,
        })
    }

    fn validate_splits(
        &self,
        line: &receipt_line::Model,
        splits: &[PutawaySplit],
    ) -> Result<(), ServiceError> {
        if splits.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one putaway split is required".to_string(),
            ));
        }
        for split in splits {
            if split.quantity < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Split quantity must be non-negative, got {}",
                    split.quantity
                )));
            }
        }
        let total: Decimal = splits.iter().map(|s| s.quantity).sum();
        if total != line.received_quantity {
            return Err(ServiceError::QuantityMismatch(format!(
                "Splits sum to {} but line {} received {}",
                total, line.receipt_line_id, line.received_quantity
            )));
        }
        Ok(())
    }

    async fn resolve_item(
        &self,
        line: &receipt_line::Model,
    ) -> Result<item_master::Model, ServiceError> {
        match line.inventory_item_id {
            Some(item_id) => item_master::Entity::find_by_id(item_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id))),
            None => find_item_by_code(&self.db, line.item_code.clone()).await,
        }
    }

    /// The first disposition-good split relocates the staging unit
    /// instead of creating a duplicate, compensating with a fresh
    /// staging record when receiving never produced one.
    async fn apply_good_split(
        &self,
        line: &receipt_line::Model,
        item: &item_master::Model,
        staging: &stock_location::Model,
        warehouse_id: i32,
        split: &PutawaySplit,
        actor: Option<String>,
    ) -> Result<(i64, String), ServiceError> {
        // Identical resubmission: the unit is already at its target.
        if let Some(existing) = self
            .find_put_away_unit(line.receipt_line_id, Disposition::Good, split.location_id)
            .await?
        {
            return Ok((
                existing.stock_unit_id,
                existing.pallet_id.unwrap_or_default(),
            ));
        }

        let pallet = split.pallet_id.clone().or_else(|| line.pallet_id.clone());

        let staged = match self.find_staging_unit(item, staging, pallet.as_deref()).await? {
            Some(unit) => unit,
            None => {
                // Upstream receipt gap: materialize the staging record,
                // then relocate it like any other.
                self.create_unit(
                    line,
                    item,
                    warehouse_id,
                    staging.location_id,
                    split.quantity,
                    Decimal::ZERO,
                    pallet.clone(),
                    None,
                    StockStatus::Received,
                )
                .await?
            }
        };

        let from_location = staged.location_id;
        let moved = from_location != split.location_id;

        let updated = self
            .ledger
            .relocate_with_quantity(
                staged.stock_unit_id,
                split.location_id,
                StockStatus::PutAway,
                split.quantity,
                Some(Disposition::Good),
            )
            .await?;

        if moved {
            self.movements
                .record(MovementInput {
                    inventory_item_id: item.inventory_item_id,
                    stock_unit_id: Some(updated.stock_unit_id),
                    from_location_id: Some(from_location),
                    to_location_id: split.location_id,
                    quantity_moved: split.quantity,
                    movement_type: MovementType::Putaway,
                    reference_type: Some("RECEIPT_LINE".to_string()),
                    reference_id: Some(line.receipt_line_id),
                    moved_by: actor,
                })
                .await?;
        }

        Ok((
            updated.stock_unit_id,
            updated.pallet_id.unwrap_or_default(),
        ))
    }

    /// Non-good splits (and any good split beyond the first) become new
    /// stock units with disposition-prefixed pallet ids.
    async fn apply_created_split(
        &self,
        line: &receipt_line::Model,
        item: &item_master::Model,
        staging: &stock_location::Model,
        warehouse_id: i32,
        split: &PutawaySplit,
        actor: Option<String>,
    ) -> Result<(i64, String), ServiceError> {
        if let Some(existing) = self
            .find_put_away_unit(line.receipt_line_id, split.disposition, split.location_id)
            .await?
        {
            return Ok((
                existing.stock_unit_id,
                existing.pallet_id.unwrap_or_default(),
            ));
        }

        let pallet = split
            .pallet_id
            .clone()
            .unwrap_or_else(|| synthesize_pallet_id(split.disposition));

        // Availability depends on the target's class: a damage or
        // staging target pins the new unit to zero.
        let class = self.ledger.location_class(split.location_id).await?;
        let available = quantity_ledger::derived_available(
            Some(StockStatus::PutAway),
            class,
            self.ledger.is_overridden(split.location_id),
            split.quantity,
            Decimal::ZERO,
        );

        let unit = self
            .create_unit(
                line,
                item,
                warehouse_id,
                split.location_id,
                split.quantity,
                available,
                Some(pallet.clone()),
                Some(split.disposition),
                StockStatus::PutAway,
            )
            .await?;

        self.movements
            .record(MovementInput {
                inventory_item_id: item.inventory_item_id,
                stock_unit_id: Some(unit.stock_unit_id),
                from_location_id: Some(staging.location_id),
                to_location_id: split.location_id,
                quantity_moved: split.quantity,
                movement_type: MovementType::Putaway,
                reference_type: Some("RECEIPT_LINE".to_string()),
                reference_id: Some(line.receipt_line_id),
                moved_by: actor,
            })
            .await?;

        Ok((unit.stock_unit_id, pallet))
    }

    async fn find_put_away_unit(
        &self,
        receipt_line_id: i64,
        disposition: Disposition,
        location_id: i32,
    ) -> Result<Option<stock_unit::Model>, ServiceError> {
        StockUnitEntity::find()
            .filter(stock_unit::Column::ReceiptLineId.eq(receipt_line_id))
            .filter(stock_unit::Column::Disposition.eq(disposition.as_str()))
            .filter(stock_unit::Column::LocationId.eq(location_id))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Staging search: item + pallet first, then item + warehouse
    /// staging location when no pallet is known.
    async fn find_staging_unit(
        &self,
        item: &item_master::Model,
        staging: &stock_location::Model,
        pallet_id: Option<&str>,
    ) -> Result<Option<stock_unit::Model>, ServiceError> {
        if let Some(pallet) = pallet_id {
            let unit = StockUnitEntity::find()
                .filter(stock_unit::Column::InventoryItemId.eq(item.inventory_item_id))
                .filter(stock_unit::Column::PalletId.eq(pallet))
                .filter(stock_unit::Column::Status.eq(StockStatus::Received.as_str()))
                .one(&*self.db)
                .await?;
            if unit.is_some() {
                return Ok(unit);
            }
        }

        StockUnitEntity::find()
            .filter(stock_unit::Column::InventoryItemId.eq(item.inventory_item_id))
            .filter(stock_unit::Column::WarehouseId.eq(staging.warehouse_id))
            .filter(stock_unit::Column::LocationId.eq(staging.location_id))
            .filter(stock_unit::Column::Status.eq(StockStatus::Received.as_str()))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_unit(
        &self,
        line: &receipt_line::Model,
        item: &item_master::Model,
        warehouse_id: i32,
        location_id: i32,
        quantity: Decimal,
        available: Decimal,
        pallet_id: Option<String>,
        disposition: Option<Disposition>,
        status: StockStatus,
    ) -> Result<stock_unit::Model, ServiceError> {
        let unit = stock_unit::ActiveModel {
            inventory_item_id: Set(item.inventory_item_id),
            warehouse_id: Set(warehouse_id),
            location_id: Set(location_id),
            pallet_id: Set(pallet_id),
            batch_number: Set(line.batch_number.clone()),
            manufacture_date: Set(line.manufacture_date),
            expiry_date: Set(line.expiry_date),
            quantity_on_hand: Set(quantity),
            quantity_allocated: Set(Decimal::ZERO),
            quantity_available: Set(available),
            quantity_shipped: Set(Decimal::ZERO),
            status: Set(status.as_str().to_string()),
            disposition: Set(disposition.map(|d| d.as_str().to_string())),
            receipt_line_id: Set(Some(line.receipt_line_id)),
            unit_weight: Set(item.unit_weight),
            version: Set(1),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        unit.insert(&*self.db).await.map_err(ServiceError::db_error)
    }

    /// Flips the receipt header Received → PutAway once every line is
    /// fully put away.
    async fn maybe_flip_header(&self, header: &receipt_header::Model) -> Result<(), ServiceError> {
        let lines = ReceiptLineEntity::find()
            .filter(receipt_line::Column::ReceiptHeaderId.eq(header.receipt_header_id))
            .all(&*self.db)
            .await?;

        let all_done = !lines.is_empty()
            && lines
                .iter()
                .all(|l| l.received_quantity > Decimal::ZERO && l.quantity_put_away >= l.received_quantity);

        if all_done && ReceiptStatus::from_str(&header.status) == Some(ReceiptStatus::Received) {
            let mut active: receipt_header::ActiveModel = header.clone().into();
            active.status = Set(ReceiptStatus::PutAway.as_str().to_string());
            active.updated_at = Set(Utc::now());
            active.update(&*self.db).await.map_err(ServiceError::db_error)?;
            info!(
                receipt_header_id = header.receipt_header_id,
                "Receipt header fully put away"
            );
        }

        Ok(())
    }
}

/// Disposition-prefixed synthetic pallet id, unique by timestamp.
fn synthesize_pallet_id(disposition: Disposition) -> String {
    format!(
        "{}{}",
        disposition.pallet_prefix(),
        Utc::now().format("%Y%m%d%H%M%S%f")
    )
}
