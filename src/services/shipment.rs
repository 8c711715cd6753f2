use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        demand_header::{self, Entity as DemandHeaderEntity, DemandStatus},
        demand_line::{self, Entity as DemandLineEntity},
        stock_allocation::{self, AllocationStatus, Entity as StockAllocationEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::quantity_ledger::QuantityLedgerService,
};

/// Per-item result of a shipment run.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDeduction {
    pub inventory_item_id: i64,
    pub quantity_ordered: Decimal,
    pub quantity_deducted: Decimal,
}

#[derive(Debug)]
pub struct ShipmentOutcome {
    pub demand_header_id: i64,
    pub deducted_items: Vec<ItemDeduction>,
    pub errors: Vec<String>,
    pub header_status: DemandStatus,
    pub success: bool,
}

/// Shipment engine: deducts on-hand stock and releases reservations for
/// a picked demand in one step. Shipment consumes stock in place, so no
/// movement records are written.
#[derive(Clone)]
pub struct ShipmentService {
    db: Arc<DatabaseConnection>,
    ledger: QuantityLedgerService,
    event_sender: Option<EventSender>,
}

impl ShipmentService {
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

    /// Ships a picked demand header.
    ///
    /// Ordered quantity is summed per item and deducted from the units
    /// fixed at pick time; picking already chose the physical stock, so
    /// no ordering policy applies here. Shortages accumulate per item
    /// without blocking the items that can ship. The header flips to
    /// Shipped only when at least one deduction succeeded and nothing
    /// failed.
    #[instrument(skip(self))]
    pub async fn ship(&self, demand_header_id: i64) -> Result<ShipmentOutcome, ServiceError> {
        let db = &*self.db;

        let header = DemandHeaderEntity::find_by_id(demand_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Demand header {} not found", demand_header_id))
            })?;

        match DemandStatus::from_str(&header.status) {
            Some(DemandStatus::Picked) => {}
            Some(DemandStatus::Allocated) => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "Demand {} is ALLOCATED: confirm picks first",
                    demand_header_id
                )));
            }
            _ => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "Demand {} is {}, shipping requires PICKED",
                    demand_header_id, header.status
                )));
            }
        }

        let lines = DemandLineEntity::find()
            .filter(demand_line::Column::DemandHeaderId.eq(demand_header_id))
            .all(db)
            .await?;
        let line_ids: Vec<i64> = lines.iter().map(|l| l.demand_line_id).collect();

        // Ordered quantity per item, summed across lines.
        let mut ordered_by_item: BTreeMap<i64, Decimal> = BTreeMap::new();
        for line in &lines {
            *ordered_by_item
                .entry(line.inventory_item_id)
                .or_insert(Decimal::ZERO) += line.ordered_quantity;
        }

        let allocations = StockAllocationEntity::find()
            .filter(stock_allocation::Column::DemandLineId.is_in(line_ids))
            .filter(stock_allocation::Column::Status.eq(AllocationStatus::Picked.as_str()))
            .all(db)
            .await?;

        let mut deducted_items = Vec::new();
        let mut errors = Vec::new();

        for (item_id, ordered) in &ordered_by_item {
            let mut remaining = *ordered;
            let mut deducted = Decimal::ZERO;

            for allocation in allocations
                .iter()
                .filter(|a| a.inventory_item_id == *item_id)
            {
                if remaining == Decimal::ZERO {
                    break;
                }
                let shippable = allocation.quantity_picked - allocation.quantity_shipped;
                let take = remaining.min(shippable);
                if take <= Decimal::ZERO {
                    continue;
                }

                match self.ledger.ship_deduct(allocation.stock_unit_id, take).await {
                    Ok(_) => {
                        if let Err(e) = self.record_shipped(allocation, take).await {
                            errors.push(format!("allocation {}: {}", allocation.allocation_id, e));
                            continue;
                        }
                        deducted += take;
                        remaining -= take;
                    }
                    Err(e) => {
                        warn!(
                            allocation_id = allocation.allocation_id,
                            stock_unit_id = allocation.stock_unit_id,
                            "Shipment deduction failed: {}",
                            e
                        );
                        errors.push(format!("item {}: {}", item_id, e));
                    }
                }
            }

            if remaining > Decimal::ZERO {
                errors.push(format!(
                    "item {}: ordered {} but only {} could be deducted",
                    item_id, ordered, deducted
                ));
            }

            deducted_items.push(ItemDeduction {
                inventory_item_id: *item_id,
                quantity_ordered: *ordered,
                quantity_deducted: deducted,
            });
        }

        let any_deducted = deducted_items
            .iter()
            .any(|d| d.quantity_deducted > Decimal::ZERO);
        let success = any_deducted && errors.is_empty();

        let header_status = if success {
            let mut active: demand_header::ActiveModel = header.into();
            active.status = Set(DemandStatus::Shipped.as_str().to_string());
            active.updated_at = Set(Utc::now());
            active.update(db).await.map_err(ServiceError::db_error)?;
            DemandStatus::Shipped
        } else {
            DemandStatus::Picked
        };

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DemandShipped {
                    demand_header_id,
                    items_deducted: deducted_items
                        .iter()
                        .filter(|d| d.quantity_deducted > Decimal::ZERO)
                        .count(),
                    shipped_at: Utc::now(),
                })
                .await;
        }

        info!(
            demand_header_id,
            items = deducted_items.len(),
            errors = errors.len(),
            "Shipment finished"
        );

        Ok(ShipmentOutcome {
            demand_header_id,
            deducted_items,
            errors,
            header_status,
            success,
        })
    }

    async fn record_shipped(
        &self,
        allocation: &stock_allocation::Model,
        quantity: Decimal,
    ) -> Result<(), ServiceError> {
        let shipped_total = allocation.quantity_shipped + quantity;
        let fully_shipped = shipped_total >= allocation.quantity_picked;

        let mut active: stock_allocation::ActiveModel = allocation.clone().into();
        active.quantity_shipped = Set(shipped_total);
        if fully_shipped {
            active.status = Set(AllocationStatus::Shipped.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());
        active
            .update(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }
}
