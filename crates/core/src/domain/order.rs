//! Orders and their lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::food::Food;
use crate::types::{FoodId, OrderId, OrderStatus, UserId, VendorId};

/// Why an order could not be created or updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order must contain at least one item")]
    EmptyItems,
    #[error("quantity for food {0} must be at least 1")]
    ZeroQuantity(FoodId),
    #[error("food {0} does not exist")]
    UnknownFood(FoodId),
    #[error("food {0} is not sold by this vendor")]
    ForeignFood(FoodId),
    #[error("vendor is not accepting orders")]
    VendorUnavailable,
    #[error("order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("order total is too large")]
    TotalOverflow,
}

/// One line of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub food_id: FoodId,
    pub quantity: u32,
}

/// One line of a cart as submitted by the user.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    #[serde(alias = "_id")]
    pub food_id: FoodId,
    #[serde(alias = "unit")]
    pub quantity: u32,
}

/// Result of pricing a cart against the vendor's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItems {
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    /// Longest preparation time among the ordered foods.
    pub ready_time: u32,
}

/// Price `items` for `vendor_id` using the foods in `catalog`.
///
/// Item order is preserved. The total is the sum of unit price times
/// quantity.
///
/// # Errors
///
/// [`OrderError::EmptyItems`] for an empty cart, [`OrderError::ZeroQuantity`]
/// for a zero line, [`OrderError::UnknownFood`] when a food is missing from
/// `catalog`, [`OrderError::ForeignFood`] when it belongs to another
/// vendor, and [`OrderError::TotalOverflow`] when the total does not fit a
/// [`Decimal`].
pub fn price_items(
    vendor_id: VendorId,
    items: &[NewOrderItem],
    catalog: &HashMap<FoodId, Food>,
) -> Result<PricedItems, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    let mut priced = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;
    let mut ready_time = 0;

    for item in items {
        if item.quantity == 0 {
            return Err(OrderError::ZeroQuantity(item.food_id));
        }
        let food = catalog
            .get(&item.food_id)
            .ok_or(OrderError::UnknownFood(item.food_id))?;
        if food.vendor_id != vendor_id {
            return Err(OrderError::ForeignFood(item.food_id));
        }
        total = food
            .price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or(OrderError::TotalOverflow)?;
        ready_time = ready_time.max(food.ready_time);
        priced.push(OrderItem {
            food_id: item.food_id,
            quantity: item.quantity,
        });
    }

    Ok(PricedItems {
        items: priced,
        total,
        ready_time,
    })
}

/// A user's order against a single vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub vendor_id: VendorId,
    pub items: Vec<OrderItem>,
    #[serde(rename = "orderStatus")]
    pub status: OrderStatus,
    pub remarks: String,
    pub ready_time: u32,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A new order in `WAITING`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        vendor_id: VendorId,
        priced: PricedItems,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            user_id,
            vendor_id,
            items: priced.items,
            status: OrderStatus::default(),
            remarks: String::new(),
            ready_time: priced.ready_time,
            total: priced.total,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a vendor's processing update.
    ///
    /// Status and remarks are always overwritten; `ready_time` only when the
    /// update carries one. Items and total never change.
    ///
    /// # Errors
    ///
    /// [`OrderError::IllegalTransition`] when the status table forbids the move.
    pub fn apply(&mut self, update: OrderUpdate, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(update.status) {
            return Err(OrderError::IllegalTransition {
                from: self.status,
                to: update.status,
            });
        }
        self.status = update.status;
        self.remarks = update.remarks;
        if let Some(ready_time) = update.ready_time {
            self.ready_time = ready_time;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Vendor-side processing request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub remarks: String,
    #[serde(default, alias = "time")]
    pub ready_time: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::food::NewFood;

    fn food(vendor_id: VendorId, price: i64, ready_time: u32) -> Food {
        Food::new(
            vendor_id,
            NewFood {
                name: "Idli".to_owned(),
                description: String::new(),
                category: "Breakfast".to_owned(),
                food_type: "veg".to_owned(),
                ready_time,
                price: Decimal::from(price),
            },
            vec![],
            Utc::now(),
        )
        .unwrap()
    }

    fn catalog(foods: &[Food]) -> HashMap<FoodId, Food> {
        foods.iter().map(|f| (f.id, f.clone())).collect()
    }

    #[test]
    fn test_empty_cart_rejected() {
        let vendor = VendorId::generate();
        assert_eq!(
            price_items(vendor, &[], &HashMap::new()),
            Err(OrderError::EmptyItems)
        );
    }

    #[test]
    fn test_total_and_ready_time() {
        let vendor = VendorId::generate();
        let a = food(vendor, 40, 10);
        let b = food(vendor, 120, 25);
        let items = [
            NewOrderItem {
                food_id: a.id,
                quantity: 3,
            },
            NewOrderItem {
                food_id: b.id,
                quantity: 1,
            },
        ];
        let priced = price_items(vendor, &items, &catalog(&[a.clone(), b.clone()])).unwrap();
        assert_eq!(priced.total, Decimal::from(240));
        assert_eq!(priced.ready_time, 25);
        assert_eq!(priced.items[0].food_id, a.id);
        assert_eq!(priced.items[1].food_id, b.id);
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let vendor = VendorId::generate();
        let dear = food(vendor, i64::MAX, 10);
        let line = NewOrderItem {
            food_id: dear.id,
            quantity: u32::MAX,
        };
        assert_eq!(
            price_items(vendor, &[line, line, line], &catalog(&[dear])),
            Err(OrderError::TotalOverflow)
        );
    }

    #[test]
    fn test_rejects_zero_unknown_and_foreign_items() {
        let vendor = VendorId::generate();
        let own = food(vendor, 40, 10);
        let other = food(VendorId::generate(), 40, 10);
        let foods = catalog(&[own.clone(), other.clone()]);

        let line = |food_id, quantity| [NewOrderItem { food_id, quantity }];

        assert_eq!(
            price_items(vendor, &line(own.id, 0), &foods),
            Err(OrderError::ZeroQuantity(own.id))
        );

        let missing = FoodId::generate();
        assert_eq!(
            price_items(vendor, &line(missing, 1), &foods),
            Err(OrderError::UnknownFood(missing))
        );

        assert_eq!(
            price_items(vendor, &line(other.id, 1), &foods),
            Err(OrderError::ForeignFood(other.id))
        );
    }

    #[test]
    fn test_apply_keeps_ready_time_unless_supplied() {
        let vendor = VendorId::generate();
        let f = food(vendor, 40, 15);
        let priced = price_items(
            vendor,
            &[NewOrderItem {
                food_id: f.id,
                quantity: 2,
            }],
            &catalog(&[f]),
        )
        .unwrap();
        let mut order = Order::new(UserId::generate(), vendor, priced, Utc::now());
        assert_eq!(order.status, OrderStatus::Waiting);
        let items = order.items.clone();

        order
            .apply(
                OrderUpdate {
                    status: OrderStatus::Accept,
                    remarks: "on it".to_owned(),
                    ready_time: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(order.ready_time, 15);
        assert_eq!(order.remarks, "on it");

        order
            .apply(
                OrderUpdate {
                    status: OrderStatus::Ready,
                    remarks: String::new(),
                    ready_time: Some(5),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.ready_time, 5);
        assert!(order.remarks.is_empty());
        assert_eq!(order.items, items);
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let parsed = serde_json::from_str::<OrderUpdate>(r#"{"status":"COOKING"}"#);
        assert!(parsed.is_err());
        let legacy: OrderUpdate =
            serde_json::from_str(r#"{"status":"UNDER_PROCESS","remarks":"x","time":12}"#).unwrap();
        assert_eq!(legacy.ready_time, Some(12));
    }

    #[test]
    fn test_order_serializes_order_status_key() {
        let vendor = VendorId::generate();
        let f = food(vendor, 10, 5);
        let items = [NewOrderItem {
            food_id: f.id,
            quantity: 1,
        }];
        let priced = price_items(vendor, &items, &catalog(&[f])).unwrap();
        let order = Order::new(UserId::generate(), vendor, priced, Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["orderStatus"], "WAITING");
        assert!(json.get("vendorId").is_some());
    }
}
