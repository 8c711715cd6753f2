use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        stock_location::{self, Entity as StockLocationEntity, LocationClass},
        stock_unit::{self, Disposition, Entity as StockUnitEntity, StockStatus},
    },
    errors::ServiceError,
};

/// Bounded retries for version-guarded writes. A write that keeps losing
/// the race surfaces as `ConcurrentModification` instead of spinning.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// A pure quantity delta against one stock unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityDelta {
    /// Increase the reservation without touching physical stock.
    Reserve(Decimal),
    /// Return reserved quantity to the pool.
    Release(Decimal),
    /// Consume physical stock and its reservation together.
    ShipDeduct(Decimal),
}

/// Applies a delta to the `(on_hand, allocated, shipped)` triple,
/// enforcing `0 ≤ allocated ≤ on_hand` at every step.
pub fn apply_delta(
    delta: QuantityDelta,
    on_hand: Decimal,
    allocated: Decimal,
    shipped: Decimal,
) -> Result<(Decimal, Decimal, Decimal), ServiceError> {
    let quantity = match delta {
        QuantityDelta::Reserve(q) | QuantityDelta::Release(q) | QuantityDelta::ShipDeduct(q) => q,
    };
    if quantity < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Quantity delta must be non-negative, got {}",
            quantity
        )));
    }

    match delta {
        QuantityDelta::Reserve(q) => {
            if allocated + q > on_hand {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Cannot reserve {}: on hand {}, already allocated {}",
                    q, on_hand, allocated
                )));
            }
            Ok((on_hand, allocated + q, shipped))
        }
        QuantityDelta::Release(q) => {
            if q > allocated {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Cannot release {}: only {} allocated",
                    q, allocated
                )));
            }
            Ok((on_hand, allocated - q, shipped))
        }
        QuantityDelta::ShipDeduct(q) => {
            if q > on_hand {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Cannot ship {}: only {} on hand",
                    q, on_hand
                )));
            }
            if q > allocated {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Cannot ship {}: only {} allocated",
                    q, allocated
                )));
            }
            Ok((on_hand - q, allocated - q, shipped + q))
        }
    }
}

/// Derived availability for a stock unit. A unit contributes to the
/// available pool only while put away at an allocatable location that is
/// not on the override list; everything else (staging, disposition
/// holding areas, picked or shipped units) is pinned to zero.
pub fn derived_available(
    status: Option<StockStatus>,
    class: LocationClass,
    overridden: bool,
    on_hand: Decimal,
    allocated: Decimal,
) -> Decimal {
    if status == Some(StockStatus::PutAway) && class.is_allocatable() && !overridden {
        (on_hand - allocated).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// Field patch applied by a guarded write. `None` leaves a column
/// untouched; quantities always travel together with the recomputed
/// availability and a version bump.
#[derive(Debug, Default, Clone)]
struct UnitPatch {
    location_id: Option<i32>,
    status: Option<StockStatus>,
    disposition: Option<Disposition>,
    on_hand: Option<Decimal>,
    allocated: Option<Decimal>,
    shipped: Option<Decimal>,
}

/// Aggregate quantity rollup for one item, optionally per location.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ItemAvailability {
    pub inventory_item_id: i64,
    pub location_id: Option<i32>,
    pub quantity_on_hand: Decimal,
    pub quantity_allocated: Decimal,
    pub quantity_available: Decimal,
    pub quantity_shipped: Decimal,
}

/// Owner of the quantity arithmetic invariant
/// `available = max(0, on_hand − allocated)` and of every stock-unit
/// write. All writes are single conditional UPDATEs filtered on the
/// version last read; there is no wider transaction.
#[derive(Clone)]
pub struct QuantityLedgerService {
    db: Arc<DatabaseConnection>,
    non_allocatable_overrides: HashSet<i32>,
}

impl QuantityLedgerService {
    pub fn new(db: Arc<DatabaseConnection>, non_allocatable_overrides: Vec<i32>) -> Self {
        Self {
            db,
            non_allocatable_overrides: non_allocatable_overrides.into_iter().collect(),
        }
    }

    pub fn is_overridden(&self, location_id: i32) -> bool {
        self.non_allocatable_overrides.contains(&location_id)
    }

    /// Resolves the stored class of a location.
    pub async fn location_class(&self, location_id: i32) -> Result<LocationClass, ServiceError> {
        let location = StockLocationEntity::find_by_id(location_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;
        Ok(location.class())
    }

    /// Whether a unit currently contributes to the available pool.
    pub fn is_allocation_eligible(&self, unit: &stock_unit::Model, class: LocationClass) -> bool {
        unit.stock_status() == Some(StockStatus::PutAway)
            && class.is_allocatable()
            && !self.is_overridden(unit.location_id)
    }

    /// Increases a unit's reservation. Fails `InsufficientQuantity` when
    /// the reservation would exceed on-hand stock.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        stock_unit_id: i64,
        quantity: Decimal,
    ) -> Result<stock_unit::Model, ServiceError> {
        self.apply_quantity_delta(stock_unit_id, QuantityDelta::Reserve(quantity))
            .await
    }

    /// Returns reserved quantity to the pool.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        stock_unit_id: i64,
        quantity: Decimal,
    ) -> Result<stock_unit::Model, ServiceError> {
        self.apply_quantity_delta(stock_unit_id, QuantityDelta::Release(quantity))
            .await
    }

    /// Consumes physical stock and releases its reservation in one step.
    /// The shipped counter accumulates. No movement is recorded here:
    /// shipment is a deduction in place.
    #[instrument(skip(self))]
    pub async fn ship_deduct(
        &self,
        stock_unit_id: i64,
        quantity: Decimal,
    ) -> Result<stock_unit::Model, ServiceError> {
        let updated = self
            .apply_quantity_delta(stock_unit_id, QuantityDelta::ShipDeduct(quantity))
            .await?;
        if updated.quantity_on_hand == Decimal::ZERO {
            // Drained units stay on record as history with shipped status.
            return self
                .update_unit(stock_unit_id, None, Some(StockStatus::Shipped))
                .await;
        }
        Ok(updated)
    }

    /// Moves a unit to another location, optionally flipping its status.
    /// Callers pair this with a movement record; the ledger only keeps
    /// the quantities and derived availability consistent.
    #[instrument(skip(self))]
    pub async fn relocate(
        &self,
        stock_unit_id: i64,
        to_location_id: i32,
        new_status: Option<StockStatus>,
    ) -> Result<stock_unit::Model, ServiceError> {
        self.update_unit(stock_unit_id, Some(to_location_id), new_status)
            .await
    }

    /// Relocation variant used by putaway when the staging unit's
    /// quantity must shrink to the good portion as the non-good portions
    /// are split off.
    #[instrument(skip(self))]
    pub async fn relocate_with_quantity(
        &self,
        stock_unit_id: i64,
        to_location_id: i32,
        new_status: StockStatus,
        on_hand: Decimal,
        disposition: Option<Disposition>,
    ) -> Result<stock_unit::Model, ServiceError> {
        if on_hand < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "On-hand quantity must be non-negative, got {}",
                on_hand
            )));
        }
        self.guarded_write(stock_unit_id, |unit| {
            if unit.quantity_allocated > on_hand {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Cannot shrink unit {} below its allocated quantity {}",
                    unit.stock_unit_id, unit.quantity_allocated
                )));
            }
            Ok(UnitPatch {
                location_id: Some(to_location_id),
                status: Some(new_status),
                disposition,
                on_hand: Some(on_hand),
                ..Default::default()
            })
        })
        .await
    }

    /// Flips a unit's status without relocating it.
    #[instrument(skip(self))]
    pub async fn mark_status(
        &self,
        stock_unit_id: i64,
        status: StockStatus,
    ) -> Result<stock_unit::Model, ServiceError> {
        self.update_unit(stock_unit_id, None, Some(status)).await
    }

    async fn update_unit(
        &self,
        stock_unit_id: i64,
        location_id: Option<i32>,
        status: Option<StockStatus>,
    ) -> Result<stock_unit::Model, ServiceError> {
        self.guarded_write(stock_unit_id, |_| {
            Ok(UnitPatch {
                location_id,
                status,
                ..Default::default()
            })
        })
        .await
    }

    async fn apply_quantity_delta(
        &self,
        stock_unit_id: i64,
        delta: QuantityDelta,
    ) -> Result<stock_unit::Model, ServiceError> {
        self.guarded_write(stock_unit_id, |unit| {
            let (on_hand, allocated, shipped) = apply_delta(
                delta,
                unit.quantity_on_hand,
                unit.quantity_allocated,
                unit.quantity_shipped,
            )?;
            Ok(UnitPatch {
                on_hand: Some(on_hand),
                allocated: Some(allocated),
                shipped: Some(shipped),
                ..Default::default()
            })
        })
        .await
    }

    /// Read-compute-write loop. Each attempt reads the unit, computes the
    /// patch, and issues one UPDATE conditional on the version read; a
    /// concurrent writer makes the UPDATE match zero rows and we retry.
    async fn guarded_write<F>(
        &self,
        stock_unit_id: i64,
        compute: F,
    ) -> Result<stock_unit::Model, ServiceError>
    where
        F: Fn(&stock_unit::Model) -> Result<UnitPatch, ServiceError>,
    {
        for attempt in 0..MAX_WRITE_ATTEMPTS {
            let unit = StockUnitEntity::find_by_id(stock_unit_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Stock unit {} not found", stock_unit_id))
                })?;

            let patch = compute(&unit)?;

            let location_id = patch.location_id.unwrap_or(unit.location_id);
            let status = patch.status.or_else(|| unit.stock_status());
            let on_hand = patch.on_hand.unwrap_or(unit.quantity_on_hand);
            let allocated = patch.allocated.unwrap_or(unit.quantity_allocated);
            let shipped = patch.shipped.unwrap_or(unit.quantity_shipped);

            let class = self.location_class(location_id).await?;
            let available = derived_available(
                status,
                class,
                self.is_overridden(location_id),
                on_hand,
                allocated,
            );

            let status_str = status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| unit.status.clone());
            let disposition_str = patch
                .disposition
                .map(|d| d.as_str().to_string())
                .or_else(|| unit.disposition.clone());

            let result = StockUnitEntity::update_many()
                .col_expr(stock_unit::Column::LocationId, Expr::value(location_id))
                .col_expr(stock_unit::Column::Status, Expr::value(status_str))
                .col_expr(stock_unit::Column::Disposition, Expr::value(disposition_str))
                .col_expr(stock_unit::Column::QuantityOnHand, Expr::value(on_hand))
                .col_expr(stock_unit::Column::QuantityAllocated, Expr::value(allocated))
                .col_expr(stock_unit::Column::QuantityAvailable, Expr::value(available))
                .col_expr(stock_unit::Column::QuantityShipped, Expr::value(shipped))
                .col_expr(stock_unit::Column::Version, Expr::value(unit.version + 1))
                .col_expr(stock_unit::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(stock_unit::Column::StockUnitId.eq(stock_unit_id))
                .filter(stock_unit::Column::Version.eq(unit.version))
                .exec(&*self.db)
                .await?;

            if result.rows_affected > 0 {
                let updated = StockUnitEntity::find_by_id(stock_unit_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "Stock unit {} vanished after update",
                            stock_unit_id
                        ))
                    })?;
                info!(
                    stock_unit_id,
                    on_hand = %updated.quantity_on_hand,
                    allocated = %updated.quantity_allocated,
                    available = %updated.quantity_available,
                    "Stock unit updated"
                );
                return Ok(updated);
            }

            warn!(
                stock_unit_id,
                attempt, "Version conflict on stock unit write, retrying"
            );
        }

        Err(ServiceError::ConcurrentModification(stock_unit_id))
    }

    /// Candidate pool for allocation: put-away units of the item with
    /// available quantity, at allocatable locations.
    #[instrument(skip(self))]
    pub async fn eligible_units(
        &self,
        inventory_item_id: i64,
    ) -> Result<Vec<stock_unit::Model>, ServiceError> {
        let units = StockUnitEntity::find()
            .filter(stock_unit::Column::InventoryItemId.eq(inventory_item_id))
            .filter(stock_unit::Column::Status.eq(StockStatus::PutAway.as_str()))
            .filter(stock_unit::Column::QuantityAvailable.gt(Decimal::ZERO))
            .all(&*self.db)
            .await?;

        let classes = self.location_classes_for(&units).await?;
        Ok(units
            .into_iter()
            .filter(|u| {
                classes
                    .get(&u.location_id)
                    .map(|class| self.is_allocation_eligible(u, *class))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn location_classes_for(
        &self,
        units: &[stock_unit::Model],
    ) -> Result<HashMap<i32, LocationClass>, ServiceError> {
        let ids: Vec<i32> = units
            .iter()
            .map(|u| u.location_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let locations = StockLocationEntity::find()
            .filter(stock_location::Column::LocationId.is_in(ids))
            .all(&*self.db)
            .await?;
        Ok(locations
            .into_iter()
            .map(|l| (l.location_id, l.class()))
            .collect())
    }

    /// Aggregate rollup across every unit of an item.
    #[instrument(skip(self))]
    pub async fn item_rollup(
        &self,
        inventory_item_id: i64,
    ) -> Result<ItemAvailability, ServiceError> {
        let units = StockUnitEntity::find()
            .filter(stock_unit::Column::InventoryItemId.eq(inventory_item_id))
            .all(&*self.db)
            .await?;

        Ok(units.iter().fold(
            ItemAvailability {
                inventory_item_id,
                location_id: None,
                quantity_on_hand: Decimal::ZERO,
                quantity_allocated: Decimal::ZERO,
                quantity_available: Decimal::ZERO,
                quantity_shipped: Decimal::ZERO,
            },
            |mut acc, u| {
                acc.quantity_on_hand += u.quantity_on_hand;
                acc.quantity_allocated += u.quantity_allocated;
                acc.quantity_available += u.quantity_available;
                acc.quantity_shipped += u.quantity_shipped;
                acc
            },
        ))
    }

    /// Rollup per location for one item, ordered by location id.
    #[instrument(skip(self))]
    pub async fn item_rollup_by_location(
        &self,
        inventory_item_id: i64,
    ) -> Result<Vec<ItemAvailability>, ServiceError> {
        let units = StockUnitEntity::find()
            .filter(stock_unit::Column::InventoryItemId.eq(inventory_item_id))
            .all(&*self.db)
            .await?;

        let mut by_location: HashMap<i32, ItemAvailability> = HashMap::new();
        for u in &units {
            let entry = by_location
                .entry(u.location_id)
                .or_insert_with(|| ItemAvailability {
                    inventory_item_id,
                    location_id: Some(u.location_id),
                    quantity_on_hand: Decimal::ZERO,
                    quantity_allocated: Decimal::ZERO,
                    quantity_available: Decimal::ZERO,
                    quantity_shipped: Decimal::ZERO,
                });
            entry.quantity_on_hand += u.quantity_on_hand;
            entry.quantity_allocated += u.quantity_allocated;
            entry.quantity_available += u.quantity_available;
            entry.quantity_shipped += u.quantity_shipped;
        }

        let mut rollups: Vec<ItemAvailability> = by_location.into_values().collect();
        rollups.sort_by_key(|r| r.location_id);
        Ok(rollups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reserve_respects_on_hand_bound() {
        let (on_hand, allocated, shipped) =
            apply_delta(QuantityDelta::Reserve(dec!(30)), dec!(100), dec!(60), dec!(0)).unwrap();
        assert_eq!((on_hand, allocated, shipped), (dec!(100), dec!(90), dec!(0)));

        let err = apply_delta(QuantityDelta::Reserve(dec!(50)), dec!(100), dec!(60), dec!(0));
        assert!(matches!(err, Err(ServiceError::InsufficientQuantity(_))));
    }

    #[test]
    fn release_cannot_exceed_allocated() {
        let err = apply_delta(QuantityDelta::Release(dec!(10)), dec!(100), dec!(5), dec!(0));
        assert!(matches!(err, Err(ServiceError::InsufficientQuantity(_))));
    }

    #[test]
    fn ship_deducts_on_hand_and_allocated_together() {
        let (on_hand, allocated, shipped) = apply_delta(
            QuantityDelta::ShipDeduct(dec!(40)),
            dec!(100),
            dec!(40),
            dec!(0),
        )
        .unwrap();
        assert_eq!(on_hand, dec!(60));
        assert_eq!(allocated, dec!(0));
        assert_eq!(shipped, dec!(40));
    }

    #[test]
    fn negative_delta_rejected() {
        let err = apply_delta(QuantityDelta::Reserve(dec!(-1)), dec!(10), dec!(0), dec!(0));
        assert!(matches!(err, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn availability_zero_when_not_put_away() {
        assert_eq!(
            derived_available(
                Some(StockStatus::Received),
                LocationClass::Storage,
                false,
                dec!(50),
                dec!(0)
            ),
            dec!(0)
        );
    }

    #[test]
    fn availability_zero_at_staging_or_disposition_locations() {
        for class in [
            LocationClass::Staging,
            LocationClass::Damage,
            LocationClass::Missing,
            LocationClass::Defective,
        ] {
            assert_eq!(
                derived_available(Some(StockStatus::PutAway), class, false, dec!(50), dec!(0)),
                dec!(0)
            );
        }
    }

    #[test]
    fn availability_clamped_at_zero() {
        // allocated > on_hand should never happen, but the derived value
        // must still not go negative.
        assert_eq!(
            derived_available(
                Some(StockStatus::PutAway),
                LocationClass::Storage,
                false,
                dec!(10),
                dec!(15)
            ),
            dec!(0)
        );
    }

    #[test]
    fn availability_respects_override_list() {
        assert_eq!(
            derived_available(
                Some(StockStatus::PutAway),
                LocationClass::Storage,
                true,
                dec!(50),
                dec!(10)
            ),
            dec!(0)
        );
        assert_eq!(
            derived_available(
                Some(StockStatus::PutAway),
                LocationClass::Storage,
                false,
                dec!(50),
                dec!(10)
            ),
            dec!(40)
        );
    }
}
