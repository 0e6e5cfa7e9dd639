//! Order snapshot - the pricing view consumed by discount validation
//!
//! A snapshot is built from checkout input before the order exists, or from
//! a persisted order; the discount engine only ever sees this view.

use super::document::Order;
use super::types::OrderItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotItem {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub quantity: u32,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    pub subtotal: f64,
    pub items: Vec<SnapshotItem>,
}

impl OrderSnapshot {
    pub fn from_items(subtotal: f64, items: &[OrderItem]) -> Self {
        Self {
            subtotal,
            items: items
                .iter()
                .map(|i| SnapshotItem {
                    product_id: i.product_id.clone(),
                    category_id: i.category_id.clone(),
                    quantity: i.quantity,
                    line_total: i.line_total,
                })
                .collect(),
        }
    }
}

impl From<&Order> for OrderSnapshot {
    fn from(order: &Order) -> Self {
        Self::from_items(order.pricing.subtotal, &order.items)
    }
}
