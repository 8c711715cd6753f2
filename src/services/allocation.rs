use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        demand_header::{self, Entity as DemandHeaderEntity, DemandStatus},
        demand_line::{self, Entity as DemandLineEntity},
        stock_allocation::{self, AllocationStatus, Entity as StockAllocationEntity},
        stock_unit::{self, StockStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::quantity_ledger::QuantityLedgerService,
};

/// Mandatory candidate ordering: first-expired-first-out, falling back
/// to first-in-first-out, with the unit id as the final tiebreak so the
/// walk is fully deterministic. Units without an expiry date sort after
/// every dated unit.
pub fn fefo_order(a: &stock_unit::Model, b: &stock_unit::Model) -> Ordering {
    cmp_nulls_last(a.expiry_date, b.expiry_date)
        .then_with(|| cmp_nulls_last(a.manufacture_date, b.manufacture_date))
        .then_with(|| a.stock_unit_id.cmp(&b.stock_unit_id))
}

fn cmp_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Result of allocating one demand line.
#[derive(Debug)]
pub struct AllocationOutcome {
    pub demand_line_id: i64,
    pub requested_quantity: Decimal,
    /// Quantity newly reserved by this call.
    pub allocated_quantity: Decimal,
    /// Demand left uncovered after walking every eligible unit.
    pub shortage: Decimal,
    pub allocations: Vec<stock_allocation::Model>,
}

#[derive(Debug)]
pub struct LineAllocationOutcome {
    pub demand_line_id: i64,
    pub allocated_quantity: Decimal,
    pub shortage: Decimal,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DemandAllocationOutcome {
    pub demand_header_id: i64,
    pub lines: Vec<LineAllocationOutcome>,
    pub success: bool,
}

/// Allocation engine: reserves put-away stock against demand lines in
/// FEFO order. Shortage is an outcome, not an error; the caller decides
/// whether to accept partial allocation.
#[derive(Clone)]
pub struct AllocationService {
    db: Arc<DatabaseConnection>,
    ledger: QuantityLedgerService,
    event_sender: Option<EventSender>,
}

impl AllocationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        ledger: QuantityLedgerService,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            ledger,
            event_sender,
        }
    }

    /// Reserves stock so the line's total reservation reaches
    /// `requested_quantity`.
    ///
    /// The walk starts from `requested − Σ surviving allocations`, so a
    /// retry after a partial failure never double-reserves stock already
    /// held by surviving allocation records.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        demand_line_id: i64,
        requested_quantity: Decimal,
    ) -> Result<AllocationOutcome, ServiceError> {
        let db = &*self.db;

        if requested_quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "Requested quantity must be non-negative, got {}",
                requested_quantity
            )));
        }

        let line = DemandLineEntity::find_by_id(demand_line_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Demand line {} not found", demand_line_id))
            })?;

        let header = DemandHeaderEntity::find_by_id(line.demand_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Demand header {} not found", line.demand_header_id))
            })?;
        match DemandStatus::from_str(&header.status) {
            Some(DemandStatus::New) | Some(DemandStatus::Allocated) => {}
            _ => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "Demand {} is {}, allocation requires NEW or ALLOCATED",
                    header.demand_header_id, header.status
                )));
            }
        }

        let existing = StockAllocationEntity::find()
            .filter(stock_allocation::Column::DemandLineId.eq(demand_line_id))
            .all(db)
            .await?;
        let already_allocated: Decimal = existing.iter().map(|a| a.quantity_allocated).sum();

        let mut remaining = (requested_quantity - already_allocated).max(Decimal::ZERO);
        let mut allocated_now = Decimal::ZERO;
        let mut touched = Vec::new();

        if remaining > Decimal::ZERO {
            let mut candidates = self.ledger.eligible_units(line.inventory_item_id).await?;
            candidates.sort_by(fefo_order);

            for candidate in candidates {
                if remaining == Decimal::ZERO {
                    break;
                }
                let take = remaining.min(candidate.quantity_available);
                if take == Decimal::ZERO {
                    continue;
                }

                // A lost reservation race or a stale candidate is a
                // per-unit failure; the walk continues with its peers.
                let reserved = match self.ledger.reserve(candidate.stock_unit_id, take).await {
                    Ok(unit) => unit,
                    Err(e) if e.is_terminal() => return Err(e),
                    Err(e) => {
                        warn!(
                            stock_unit_id = candidate.stock_unit_id,
                            "Skipping candidate: {}", e
                        );
                        continue;
                    }
                };

                let allocation = self
                    .upsert_allocation(&line, &reserved, take)
                    .await?;
                touched.push(allocation);

                if reserved.quantity_allocated == reserved.quantity_on_hand {
                    // Fully reserved units leave the candidate pool.
                    self.ledger
                        .mark_status(reserved.stock_unit_id, StockStatus::Allocated)
                        .await?;
                }

                allocated_now += take;
                remaining -= take;
            }
        }

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::InventoryAllocated {
                    demand_line_id,
                    inventory_item_id: line.inventory_item_id,
                    quantity_allocated: allocated_now,
                    shortage: remaining,
                })
                .await;
        }

        info!(
            demand_line_id,
            allocated = %allocated_now,
            shortage = %remaining,
            "Allocation finished"
        );

        Ok(AllocationOutcome {
            demand_line_id,
            requested_quantity,
            allocated_quantity: allocated_now,
            shortage: remaining,
            allocations: touched,
        })
    }

    /// Allocates every line of a demand header to its ordered quantity,
    /// folding per-line outcomes. The header flips New → Allocated when
    /// at least one line reserved stock and no line failed outright.
    #[instrument(skip(self))]
    pub async fn allocate_demand(
        &self,
        demand_header_id: i64,
    ) -> Result<DemandAllocationOutcome, ServiceError> {
        let db = &*self.db;

        let header = DemandHeaderEntity::find_by_id(demand_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Demand header {} not found", demand_header_id))
            })?;

        let lines = DemandLineEntity::find()
            .filter(demand_line::Column::DemandHeaderId.eq(demand_header_id))
            .all(db)
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Demand header {} has no lines",
                demand_header_id
            )));
        }

        let mut outcomes = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.allocate(line.demand_line_id, line.ordered_quantity).await {
                Ok(outcome) => outcomes.push(LineAllocationOutcome {
                    demand_line_id: line.demand_line_id,
                    allocated_quantity: outcome.allocated_quantity,
                    shortage: outcome.shortage,
                    error: None,
                }),
                Err(e) => outcomes.push(LineAllocationOutcome {
                    demand_line_id: line.demand_line_id,
                    allocated_quantity: Decimal::ZERO,
                    shortage: line.ordered_quantity,
                    error: Some(e.to_string()),
                }),
            }
        }

        let any_allocated = outcomes.iter().any(|o| o.allocated_quantity > Decimal::ZERO);
        let no_hard_failures = outcomes.iter().all(|o| o.error.is_none());

        if any_allocated
            && no_hard_failures
            && DemandStatus::from_str(&header.status) == Some(DemandStatus::New)
        {
            let mut active: demand_header::ActiveModel = header.into();
            active.status = Set(DemandStatus::Allocated.as_str().to_string());
            active.updated_at = Set(Utc::now());
            active.update(db).await.map_err(ServiceError::db_error)?;
        }

        Ok(DemandAllocationOutcome {
            demand_header_id,
            lines: outcomes,
            success: any_allocated && no_hard_failures,
        })
    }

    /// One allocation row per (demand line, stock unit); repeat
    /// reservations against the same unit extend the existing row.
    async fn upsert_allocation(
        &self,
        line: &demand_line::Model,
        unit: &stock_unit::Model,
        quantity: Decimal,
    ) -> Result<stock_allocation::Model, ServiceError> {
        let db = &*self.db;

        let existing = StockAllocationEntity::find()
            .filter(stock_allocation::Column::DemandLineId.eq(line.demand_line_id))
            .filter(stock_allocation::Column::StockUnitId.eq(unit.stock_unit_id))
            .filter(stock_allocation::Column::Status.eq(AllocationStatus::Allocated.as_str()))
            .one(db)
            .await?;

        match existing {
            Some(allocation) => {
                let new_total = allocation.quantity_allocated + quantity;
                let mut active: stock_allocation::ActiveModel = allocation.into();
                active.quantity_allocated = Set(new_total);
                active.updated_at = Set(Utc::now());
                active.update(db).await.map_err(ServiceError::db_error)
            }
            None => {
                let allocation = stock_allocation::ActiveModel {
                    demand_line_id: Set(line.demand_line_id),
                    stock_unit_id: Set(unit.stock_unit_id),
                    inventory_item_id: Set(unit.inventory_item_id),
                    location_id: Set(unit.location_id),
                    pallet_id: Set(unit.pallet_id.clone()),
                    batch_number: Set(unit.batch_number.clone()),
                    quantity_allocated: Set(quantity),
                    quantity_picked: Set(Decimal::ZERO),
                    quantity_shipped: Set(Decimal::ZERO),
                    status: Set(AllocationStatus::Allocated.as_str().to_string()),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                };
                allocation.insert(db).await.map_err(ServiceError::db_error)
            }
        }
    }
}
