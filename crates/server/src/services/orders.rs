//! Order placement and vendor-side processing.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use foodlane_core::{
    Food, FoodId, NewOrderItem, Order, OrderError, OrderId, OrderUpdate, UserId, VendorId,
    price_items,
};

use crate::db::{RepositoryError, Store};
use crate::models::OrderView;

#[derive(Debug, Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    Invalid(#[from] OrderError),

    #[error("order not found")]
    OrderNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct OrderService<'a> {
    store: &'a Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Price and place an order for `user_id` with `vendor_id`.
    ///
    /// # Errors
    ///
    /// Returns `OrderServiceError::Invalid` for an empty cart, a zero
    /// quantity, a food the vendor doesn't sell, or a vendor that is missing
    /// or not serving.
    pub async fn create(
        &self,
        user_id: UserId,
        vendor_id: VendorId,
        items: &[NewOrderItem],
    ) -> Result<OrderView, OrderServiceError> {
        if items.is_empty() {
            return Err(OrderError::EmptyItems.into());
        }
        let vendor = self.store.vendors.get(vendor_id).await?;
        if !vendor.is_some_and(|vendor| vendor.service_available) {
            return Err(OrderError::VendorUnavailable.into());
        }

        let ids: Vec<FoodId> = items.iter().map(|item| item.food_id).collect();
        let catalog = self.catalog(&ids).await?;
        let priced = price_items(vendor_id, items, &catalog)?;
        let order = Order::new(user_id, vendor_id, priced, Utc::now());
        self.store.orders.insert(&order).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            vendor_id = %vendor_id,
            total = %order.total,
            "Order placed"
        );
        Ok(OrderView::new(order, |id| catalog.get(&id)))
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::Repository` if storage fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderView>, OrderServiceError> {
        let orders = self.store.orders.list_by_user(user_id).await?;
        self.populate(orders).await
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::OrderNotFound` if the order doesn't exist
    /// or belongs to another user.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderView, OrderServiceError> {
        let order = self
            .store
            .orders
            .get(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(OrderServiceError::OrderNotFound)?;
        self.populate_one(order).await
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::Repository` if storage fails.
    pub async fn list_for_vendor(
        &self,
        vendor_id: VendorId,
    ) -> Result<Vec<OrderView>, OrderServiceError> {
        let orders = self.store.orders.list_by_vendor(vendor_id).await?;
        self.populate(orders).await
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::OrderNotFound` if the order doesn't exist
    /// or was placed with another vendor.
    pub async fn get_for_vendor(
        &self,
        vendor_id: VendorId,
        order_id: OrderId,
    ) -> Result<OrderView, OrderServiceError> {
        let order = self.vendor_order(vendor_id, order_id).await?;
        self.populate_one(order).await
    }

    /// Apply a vendor's status update.
    ///
    /// # Errors
    ///
    /// Returns `OrderServiceError::OrderNotFound` if the order doesn't exist
    /// or was placed with another vendor, and `OrderServiceError::Invalid`
    /// if the transition is not allowed.
    pub async fn process(
        &self,
        vendor_id: VendorId,
        order_id: OrderId,
        update: OrderUpdate,
    ) -> Result<OrderView, OrderServiceError> {
        let mut order = self.vendor_order(vendor_id, order_id).await?;
        let from = order.status;
        order.apply(update, Utc::now())?;
        self.store.orders.update(&order).await?;

        tracing::info!(
            order_id = %order.id,
            vendor_id = %vendor_id,
            from = %from,
            to = %order.status,
            "Order status changed"
        );
        self.populate_one(order).await
    }

    async fn vendor_order(
        &self,
        vendor_id: VendorId,
        order_id: OrderId,
    ) -> Result<Order, OrderServiceError> {
        self.store
            .orders
            .get(order_id)
            .await?
            .filter(|order| order.vendor_id == vendor_id)
            .ok_or(OrderServiceError::OrderNotFound)
    }

    async fn catalog(&self, ids: &[FoodId]) -> Result<HashMap<FoodId, Food>, OrderServiceError> {
        let foods = self.store.foods.get_many(ids).await?;
        Ok(foods.into_iter().map(|food| (food.id, food)).collect())
    }

    async fn populate(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, OrderServiceError> {
        let mut ids: Vec<FoodId> = orders
            .iter()
            .flat_map(|order| order.items.iter().map(|item| item.food_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let catalog = self.catalog(&ids).await?;
        Ok(orders
            .into_iter()
            .map(|order| OrderView::new(order, |id| catalog.get(&id)))
            .collect())
    }

    async fn populate_one(&self, order: Order) -> Result<OrderView, OrderServiceError> {
        let mut views = self.populate(vec![order]).await?;
        views.pop().ok_or(OrderServiceError::OrderNotFound)
    }
}
