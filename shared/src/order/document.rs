//! Order document

use super::status::{OrderStatus, PaymentMethod};
use super::types::{DeliveryInfo, OrderItem, PaymentInfo, Pricing, StatusHistoryEntry};
use serde::{Deserialize, Serialize};

/// One purchase transaction
///
/// Mutated only through the order state machine and the payment reconciler;
/// every persisted change bumps `version`, which the store uses as the
/// optimistic-concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_number: String,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub delivery: DeliveryInfo,
    pub pricing: Pricing,
    pub payment: PaymentInfo,
    pub status: OrderStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<i64>,
    /// Sales ledger marker: the increment path has been applied and not reversed
    #[serde(default)]
    pub sales_counted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counted_at: Option<i64>,
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create a new pending, unpaid order
    ///
    /// The order number is assigned by the store on insert.
    pub fn new(
        customer_id: String,
        items: Vec<OrderItem>,
        delivery: DeliveryInfo,
        pricing: Pricing,
        method: PaymentMethod,
        now: i64,
    ) -> Self {
        Self {
            order_number: String::new(),
            customer_id,
            items,
            delivery,
            pricing,
            payment: PaymentInfo::new(method, now),
            status: OrderStatus::Pending,
            status_history: vec![StatusHistoryEntry {
                status: OrderStatus::Pending,
                timestamp: now,
                note: Some("Order placed".to_string()),
            }],
            shipped_at: None,
            estimated_delivery_at: None,
            delivered_at: None,
            cancelled_at: None,
            returned_at: None,
            sales_counted: false,
            counted_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_cash_on_delivery(&self) -> bool {
        self.payment.method == PaymentMethod::CashOnDelivery
    }

    /// Total quantity across line items
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| i.quantity as u64).sum()
    }

    /// Whether the order currently sits in a state that should be counted
    ///
    /// Online orders count once paid (refund states keep the count until the
    /// order is cancelled or returned); cash-on-delivery orders count once
    /// delivered.
    pub fn qualifies_for_count(&self) -> bool {
        if matches!(self.status, OrderStatus::Cancelled | OrderStatus::Returned) {
            return false;
        }
        match self.payment.method {
            PaymentMethod::Online => self.payment.status.is_settled(),
            PaymentMethod::CashOnDelivery => self.status == OrderStatus::Delivered,
        }
    }
}
