//! In-memory repositories.
//!
//! All tables live behind one `RwLock`, so a multi-table write such as
//! registering a food under its vendor happens under a single write guard.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use foodlane_core::{
    Email, Food, FoodId, Offer, OfferId, Order, OrderId, Pincode, User, UserId, Vendor,
    VendorChange, VendorId,
};

use super::{
    FoodRepository, OfferRepository, OrderRepository, RepositoryError, UserRepository,
    VendorRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    vendors: HashMap<VendorId, Vendor>,
    foods: HashMap<FoodId, Food>,
    offers: Vec<Offer>,
    orders: HashMap<OrderId, Order>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn sorted_by<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(key);
    rows
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let slot = tables.users.get_mut(&user.id).ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }
}

#[async_trait]
impl VendorRepository for MemoryStore {
    async fn insert(&self, vendor: &Vendor) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.vendors.values().any(|v| v.email == vendor.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        tables.vendors.insert(vendor.id, vendor.clone());
        Ok(())
    }

    async fn get(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError> {
        Ok(self.tables.read().await.vendors.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.vendors.values().find(|v| &v.email == email).cloned())
    }

    async fn update(&self, vendor: &Vendor) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .vendors
            .get_mut(&vendor.id)
            .ok_or(RepositoryError::NotFound)?;
        let foods = std::mem::take(&mut slot.foods);
        *slot = Vendor {
            foods,
            ..vendor.clone()
        };
        Ok(())
    }

    async fn change(
        &self,
        id: VendorId,
        change: VendorChange,
        now: DateTime<Utc>,
    ) -> Result<Vendor, RepositoryError> {
        let mut tables = self.tables.write().await;
        let vendor = tables.vendors.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        change.apply(vendor, now);
        Ok(vendor.clone())
    }

    async fn list(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        let rows = tables.vendors.values().cloned().collect();
        Ok(sorted_by(rows, |v: &Vendor| (v.created_at, v.id)))
    }

    async fn list_by_pincode(&self, pincode: &Pincode) -> Result<Vec<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        let rows = tables
            .vendors
            .values()
            .filter(|v| &v.pincode == pincode)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |v: &Vendor| (v.created_at, v.id)))
    }
}

#[async_trait]
impl FoodRepository for MemoryStore {
    async fn insert_for_vendor(&self, food: &Food) -> Result<Vendor, RepositoryError> {
        let mut tables = self.tables.write().await;
        let vendor = tables
            .vendors
            .get_mut(&food.vendor_id)
            .ok_or(RepositoryError::NotFound)?;
        vendor.register_food(food.id, Utc::now());
        let vendor = vendor.clone();
        tables.foods.insert(food.id, food.clone());
        Ok(vendor)
    }

    async fn get_many(&self, ids: &[FoodId]) -> Result<Vec<Food>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.foods.get(id).cloned()).collect())
    }

    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Food>, RepositoryError> {
        let tables = self.tables.read().await;
        let rows = tables
            .foods
            .values()
            .filter(|f| f.vendor_id == vendor_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |f: &Food| (f.created_at, f.id)))
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn insert(&self, offer: &Offer) -> Result<(), RepositoryError> {
        self.tables.write().await.offers.push(offer.clone());
        Ok(())
    }

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.offers.iter().find(|o| o.id == id).cloned())
    }

    async fn update(&self, offer: &Offer) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .offers
            .iter_mut()
            .find(|o| o.id == offer.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = offer.clone();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Offer>, RepositoryError> {
        Ok(self.tables.read().await.offers.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        self.tables.write().await.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = order.clone();
        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let rows = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |o: &Order| (o.created_at, o.id)))
    }

    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let rows = tables
            .orders
            .values()
            .filter(|o| o.vendor_id == vendor_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |o: &Order| (o.created_at, o.id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use foodlane_core::{NewFood, NewVendor};
    use rust_decimal::Decimal;

    use super::*;

    fn vendor(email: &str) -> Vendor {
        Vendor::new(
            NewVendor {
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_owned(),
                name: "Dosa Point".to_owned(),
                owner_name: "Lakshmi".to_owned(),
                food_types: vec!["veg".to_owned()],
                pincode: Pincode::parse("600001").unwrap(),
                address: "Anna Salai".to_owned(),
                phone: "9000000010".to_owned(),
            },
            Utc::now(),
        )
    }

    fn food(vendor_id: VendorId) -> Food {
        Food::new(
            vendor_id,
            NewFood {
                name: "Masala Dosa".to_owned(),
                description: String::new(),
                category: "Breakfast".to_owned(),
                food_type: "veg".to_owned(),
                ready_time: 15,
                price: Decimal::from(90),
            },
            vec![],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_vendor_email_is_unique() {
        let store = MemoryStore::default();
        VendorRepository::insert(&store, &vendor("a@dosa.in")).await.unwrap();
        let err = VendorRepository::insert(&store, &vendor("a@dosa.in"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_for_vendor_registers_food() {
        let store = MemoryStore::default();
        let v = vendor("b@dosa.in");
        VendorRepository::insert(&store, &v).await.unwrap();

        let f = food(v.id);
        let updated = store.insert_for_vendor(&f).await.unwrap();
        assert_eq!(updated.foods, vec![f.id]);

        let stored = VendorRepository::get(&store, v.id).await.unwrap().unwrap();
        assert_eq!(stored.foods, vec![f.id]);
        assert_eq!(FoodRepository::list_by_vendor(&store, v.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_for_missing_vendor_writes_nothing() {
        let store = MemoryStore::default();
        let f = food(VendorId::generate());
        let err = store.insert_for_vendor(&f).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(store.get_many(&[f.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_order_is_not_found() {
        let store = MemoryStore::default();
        let v = vendor("c@dosa.in");
        let f = food(v.id);
        let priced = foodlane_core::price_items(
            v.id,
            &[foodlane_core::NewOrderItem {
                food_id: f.id,
                quantity: 1,
            }],
            &std::iter::once((f.id, f.clone())).collect(),
        )
        .unwrap();
        let order = Order::new(UserId::generate(), v.id, priced, Utc::now());
        let err = OrderRepository::update(&store, &order).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
