use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        demand_header::{self, Entity as DemandHeaderEntity, DemandStatus},
        demand_line::{self, Entity as DemandLineEntity},
        stock_allocation::{self, AllocationStatus, Entity as StockAllocationEntity},
        stock_movement::MovementType,
        stock_unit::{Entity as StockUnitEntity, StockStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        movements::{MovementInput, MovementRecorderService},
        quantity_ledger::QuantityLedgerService,
        resolve_staging_location,
    },
};

/// Caller's confirmation that an allocation was physically picked.
#[derive(Debug, Clone)]
pub struct PickConfirmation {
    pub allocation_id: i64,
    pub quantity_picked: Decimal,
}

#[derive(Debug)]
pub struct PickLineOutcome {
    pub allocation_id: i64,
    pub stock_unit_id: Option<i64>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct PickOutcome {
    pub demand_header_id: i64,
    pub picked_count: usize,
    pub errors: Vec<String>,
    /// Header status after the confirmation; unchanged unless every
    /// allocation of the header is fully picked.
    pub header_status: DemandStatus,
    pub lines: Vec<PickLineOutcome>,
}

/// Picking engine: confirms reserved allocations as physically picked
/// and relocates their backing units to the staging/pick area.
#[derive(Clone)]
pub struct PickingService {
    db: Arc<DatabaseConnection>,
    ledger: QuantityLedgerService,
    movements: MovementRecorderService,
    event_sender: Option<EventSender>,
}

impl PickingService {
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

    /// Confirms a batch of picks against an Allocated demand header.
    ///
    /// Validation runs before any mutation: one over-picked confirmation
    /// (`quantity_picked > quantity_allocated`) blocks the whole batch.
    /// After that, failures are per allocation — already-confirmed lines
    /// stay confirmed and the header only flips to Picked when every
    /// allocation of the header is fully picked.
    #[instrument(skip(self, confirmations), fields(batch = confirmations.len()))]
    pub async fn confirm_picks(
        &self,
        demand_header_id: i64,
        confirmations: Vec<PickConfirmation>,
        actor: Option<String>,
    ) -> Result<PickOutcome, ServiceError> {
        let db = &*self.db;

        let header = DemandHeaderEntity::find_by_id(demand_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Demand header {} not found", demand_header_id))
            })?;

        if DemandStatus::from_str(&header.status) != Some(DemandStatus::Allocated) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Demand {} is {}, picking requires ALLOCATED",
                demand_header_id, header.status
            )));
        }

        let line_ids: Vec<i64> = DemandLineEntity::find()
            .filter(demand_line::Column::DemandHeaderId.eq(demand_header_id))
            .all(db)
            .await?
            .into_iter()
            .map(|l| l.demand_line_id)
            .collect();

        let allocations = StockAllocationEntity::find()
            .filter(stock_allocation::Column::DemandLineId.is_in(line_ids.clone()))
            .all(db)
            .await?;

        // Up-front validation: any bad confirmation blocks the batch.
        for confirmation in &confirmations {
            let allocation = allocations
                .iter()
                .find(|a| a.allocation_id == confirmation.allocation_id)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Allocation {} not found on demand {}",
                        confirmation.allocation_id, demand_header_id
                    ))
                })?;
            if confirmation.quantity_picked < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Picked quantity must be non-negative for allocation {}",
                    confirmation.allocation_id
                )));
            }
            if confirmation.quantity_picked > allocation.quantity_allocated {
                return Err(ServiceError::QuantityMismatch(format!(
                    "Allocation {} picked {} exceeds allocated {}",
                    allocation.allocation_id,
                    confirmation.quantity_picked,
                    allocation.quantity_allocated
                )));
            }
        }

        let staging = resolve_staging_location(db, header.warehouse_id).await?;

        let mut outcomes = Vec::with_capacity(confirmations.len());
        let mut errors = Vec::new();

        for confirmation in &confirmations {
            // Validated above; the lookup cannot miss here.
            let Some(allocation) = allocations
                .iter()
                .find(|a| a.allocation_id == confirmation.allocation_id)
            else {
                continue;
            };

            match self
                .confirm_one(allocation, confirmation, staging.location_id, actor.clone())
                .await
            {
                Ok(stock_unit_id) => outcomes.push(PickLineOutcome {
                    allocation_id: confirmation.allocation_id,
                    stock_unit_id: Some(stock_unit_id),
                    error: None,
                }),
                Err(e) => {
                    warn!(
                        allocation_id = confirmation.allocation_id,
                        "Pick confirmation failed: {}", e
                    );
                    errors.push(format!(
                        "allocation {}: {}",
                        confirmation.allocation_id, e
                    ));
                    outcomes.push(PickLineOutcome {
                        allocation_id: confirmation.allocation_id,
                        stock_unit_id: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let picked_count = outcomes.iter().filter(|o| o.error.is_none()).count();
        let header_status = self.maybe_flip_header(&header, &line_ids).await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::PicksConfirmed {
                    demand_header_id,
                    picked_count,
                })
                .await;
        }

        info!(
            demand_header_id,
            picked_count,
            errors = errors.len(),
            "Pick confirmation finished"
        );

        Ok(PickOutcome {
            demand_header_id,
            picked_count,
            errors,
            header_status,
            lines: outcomes,
        })
    }

    async fn confirm_one(
        &self,
        allocation: &stock_allocation::Model,
        confirmation: &PickConfirmation,
        staging_location_id: i32,
        actor: Option<String>,
    ) -> Result<i64, ServiceError> {
        let db = &*self.db;

        let unit = StockUnitEntity::find_by_id(allocation.stock_unit_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Stock unit {} backing allocation {} not found",
                    allocation.stock_unit_id, allocation.allocation_id
                ))
            })?;

        let from_location = unit.location_id;
        let moved = from_location != staging_location_id;

        self.ledger
            .relocate(
                unit.stock_unit_id,
                staging_location_id,
                Some(StockStatus::Picked),
            )
            .await?;

        if moved {
            self.movements
                .record(MovementInput {
                    inventory_item_id: allocation.inventory_item_id,
                    stock_unit_id: Some(unit.stock_unit_id),
                    from_location_id: Some(from_location),
                    to_location_id: staging_location_id,
                    quantity_moved: confirmation.quantity_picked,
                    movement_type: MovementType::Picking,
                    reference_type: Some("ALLOCATION".to_string()),
                    reference_id: Some(allocation.allocation_id),
                    moved_by: actor,
                })
                .await?;
        }

        let mut active: stock_allocation::ActiveModel = allocation.clone().into();
        active.quantity_picked = Set(confirmation.quantity_picked);
        active.status = Set(AllocationStatus::Picked.as_str().to_string());
        active.updated_at = Set(Utc::now());
        active.update(db).await.map_err(ServiceError::db_error)?;

        Ok(unit.stock_unit_id)
    }

    /// Allocated → Picked only when every allocation of the header is
    /// confirmed in full.
    async fn maybe_flip_header(
        &self,
        header: &demand_header::Model,
        line_ids: &[i64],
    ) -> Result<DemandStatus, ServiceError> {
        let db = &*self.db;

        let allocations = StockAllocationEntity::find()
            .filter(stock_allocation::Column::DemandLineId.is_in(line_ids.to_vec()))
            .all(db)
            .await?;

        let all_picked = !allocations.is_empty()
            && allocations.iter().all(|a| {
                AllocationStatus::from_str(&a.status) == Some(AllocationStatus::Picked)
                    && a.quantity_picked == a.quantity_allocated
            });

        if all_picked {
            let mut active: demand_header::ActiveModel = header.clone().into();
            active.status = Set(DemandStatus::Picked.as_str().to_string());
            active.updated_at = Set(Utc::now());
            active.update(db).await.map_err(ServiceError::db_error)?;
            info!(
                demand_header_id = header.demand_header_id,
                "Demand header fully picked"
            );
            return Ok(DemandStatus::Picked);
        }

        Ok(DemandStatus::from_str(&header.status).unwrap_or(DemandStatus::Allocated))
    }
}
