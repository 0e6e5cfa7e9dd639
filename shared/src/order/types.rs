//! Value types embedded in an order

use super::status::{OrderStatus, PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Maximum quantity per line item
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Maximum number of line items per order
pub const MAX_ORDER_ITEMS: usize = 100;

/// Chosen product variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ItemVariant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Line item as persisted in the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    /// Product name snapshot at checkout
    pub product_name: String,
    /// Category snapshot (for coupon applicability)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub variant: ItemVariant,
    pub unit_price: f64,
    pub quantity: u32,
    /// unit_price * quantity, rounded to 2 decimals
    pub line_total: f64,
    /// Customization payload supplied by the storefront, stored verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<serde_json::Value>,
}

/// Line item as submitted at checkout (price is taken from the product record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub variant: ItemVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<serde_json::Value>,
}

/// Delivery destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryInfo {
    pub recipient_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub postal_code: String,
}

/// Order pricing
///
/// Invariants: `subtotal = Σ line_total`, `total = subtotal + delivery_charge - discount`,
/// `total >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Pricing {
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub discount: f64,
    /// Normalized code of the applied coupon / offer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub total: f64,
}

/// Payment sub-document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway-side payment/intent id registered when payment starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,
    /// Gateway transaction id recorded on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub refunded_amount: f64,
    pub updated_at: i64,
}

impl PaymentInfo {
    pub fn new(method: PaymentMethod, now: i64) -> Self {
        Self {
            method,
            status: PaymentStatus::Pending,
            gateway_payment_id: None,
            transaction_id: None,
            payment_date: None,
            failed_at: None,
            failure_reason: None,
            refunded_amount: 0.0,
            updated_at: now,
        }
    }
}

/// One entry of the append-only status history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
