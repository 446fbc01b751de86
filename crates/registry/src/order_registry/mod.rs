use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::RegistryError;
use crate::export::{Companion, Transform};
use crate::order::{Customer, Order};

/// In-memory catalog of orders keyed by their parsed id.
///
/// Iteration is in ascending id order, so every query returns its matches
/// sorted by id.
#[derive(Default)]
pub struct OrderRegistry {
    pub(crate) orders: BTreeMap<i64, Order>,
    pub(crate) companion: Companion,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where the HTML companion page of [`OrderRegistry::export`] is
    /// written. `None` skips the page.
    pub fn set_html_path(&mut self, html_path: Option<PathBuf>) {
        self.companion.html_path = html_path;
    }

    pub fn set_transform(&mut self, transform: Box<dyn Transform>) {
        self.companion.transform = transform;
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn add(&mut self, order: Order) -> Result<(), RegistryError> {
        let key = order.key()?;
        if self.orders.contains_key(&key) {
            return Err(RegistryError::AlreadyExists(key));
        }

        log::info!("added order-{key} for {}", order.customer.name);
        self.orders.insert(key, order);
        Ok(())
    }

    /// Cancels an order. Cancelling an unknown id is a no-op.
    pub fn remove(&mut self, order_id: i64) -> Option<Order> {
        let removed = self.orders.remove(&order_id);
        if removed.is_some() {
            log::info!("removed order-{order_id}");
        }
        removed
    }

    pub fn get_by_id(&self, order_id: i64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn query_all(&self) -> Vec<Order> {
        self.orders.values().cloned().collect()
    }

    pub fn query_by_goods_name(&self, goods_name: &str) -> Vec<Order> {
        let orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| o.has_goods(goods_name))
            .cloned()
            .collect();
        log::debug!("{} orders contain goods {goods_name:?}", orders.len());
        orders
    }

    pub fn query_by_customer_name(&self, customer_name: &str) -> Vec<Order> {
        let orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| o.customer.name == customer_name)
            .cloned()
            .collect();
        log::debug!("{} orders belong to {customer_name:?}", orders.len());
        orders
    }

    /// Orders whose amount is strictly greater than `price`.
    pub fn query_by_price(&self, price: f64) -> Vec<Order> {
        let orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| o.amount > price)
            .cloned()
            .collect();
        log::debug!("{} orders above {price}", orders.len());
        orders
    }

    pub fn update_customer(
        &mut self,
        order_id: i64,
        new_customer: Customer,
    ) -> Result<(), RegistryError> {
        match self.orders.get_mut(&order_id) {
            Some(order) => {
                log::info!(
                    "order-{order_id} customer {} -> {}",
                    order.customer.name,
                    new_customer.name
                );
                order.update_customer(new_customer);
                Ok(())
            }
            None => Err(RegistryError::NotFound(order_id)),
        }
    }
}
