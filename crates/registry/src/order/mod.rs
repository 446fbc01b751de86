use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Goods {
    pub name: String,
    pub price: f64,
}

impl Goods {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderDetail {
    pub goods: Goods,
    pub quantity: u32,
}

impl OrderDetail {
    pub fn new(goods: Goods, quantity: u32) -> Self {
        Self { goods, quantity }
    }

    pub fn subtotal(&self) -> f64 {
        self.goods.price * f64::from(self.quantity)
    }
}

/// A customer purchase. `id` keeps its wire form; the registry keys orders by
/// the parsed integer (see [`Order::key`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    pub id: String,
    pub customer: Customer,
    #[serde(rename = "Detail", default)]
    pub details: Vec<OrderDetail>,
    pub amount: f64,
}

impl Order {
    pub fn new(id: impl Into<String>, customer: Customer, details: Vec<OrderDetail>) -> Self {
        let amount = details.iter().map(OrderDetail::subtotal).sum();
        Self {
            id: id.into(),
            customer,
            details,
            amount,
        }
    }

    pub fn key(&self) -> Result<i64, RegistryError> {
        self.id
            .trim()
            .parse::<i64>()
            .map_err(|_| RegistryError::InvalidId(self.id.clone()))
    }

    pub fn add_detail(&mut self, detail: OrderDetail) {
        self.amount += detail.subtotal();
        self.details.push(detail);
    }

    pub fn update_customer(&mut self, new_customer: Customer) {
        self.customer = new_customer;
    }

    pub fn has_goods(&self, goods_name: &str) -> bool {
        self.details.iter().any(|d| d.goods.name == goods_name)
    }
}
