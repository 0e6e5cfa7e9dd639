//! Coupon / Offer Model

use serde::{Deserialize, Serialize};

/// Kind of discount rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Code entered by the customer at checkout
    #[default]
    Coupon,
    /// Seller-published offer, applied by code as well
    Offer,
}

/// Discount type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

/// What a usage-history entry records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    Redeemed,
    /// Compensates an earlier redemption of the same order
    Reversed,
}

/// Append-only usage history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponUsage {
    pub order_number: String,
    pub customer_id: String,
    pub discount_amount: f64,
    pub order_amount: f64,
    pub timestamp: i64,
    pub action: UsageAction,
}

/// Coupon / offer entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Unique code, trimmed and upper-cased
    pub code: String,
    #[serde(default)]
    pub kind: PromotionKind,
    /// Seller/user that created and owns the rule
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percentage: 10 = 10%; fixed: 5.00 = 5.00 off
    pub discount_value: f64,
    /// Cap for percentage discounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<f64>,
    #[serde(default)]
    pub minimum_order_amount: f64,
    /// Valid from (Unix millis)
    pub valid_from: i64,
    /// Valid until (Unix millis, inclusive)
    pub valid_until: i64,
    /// None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_uses: Option<u32>,
    /// None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses_per_customer: Option<u32>,
    #[serde(default)]
    pub applicable_products: Vec<String>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub excluded_products: Vec<String>,
    pub is_active: bool,
    #[serde(default)]
    pub total_usage_count: u32,
    #[serde(default)]
    pub total_discount_given: f64,
    #[serde(default)]
    pub usage_history: Vec<CouponUsage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Coupon {
    /// Normalize a user-entered code for lookup and uniqueness
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Net redemptions by one customer (redemptions minus reversals)
    pub fn customer_usage_count(&self, customer_id: &str) -> u32 {
        let (redeemed, reversed) = self
            .usage_history
            .iter()
            .filter(|u| u.customer_id == customer_id)
            .fold((0u32, 0u32), |(r, v), u| match u.action {
                UsageAction::Redeemed => (r + 1, v),
                UsageAction::Reversed => (r, v + 1),
            });
        redeemed.saturating_sub(reversed)
    }
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreate {
    pub code: String,
    #[serde(default)]
    pub kind: PromotionKind,
    pub owner_id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    #[serde(default)]
    pub max_discount_amount: Option<f64>,
    #[serde(default)]
    pub minimum_order_amount: Option<f64>,
    pub valid_from: i64,
    pub valid_until: i64,
    #[serde(default)]
    pub max_total_uses: Option<u32>,
    #[serde(default)]
    pub max_uses_per_customer: Option<u32>,
    #[serde(default)]
    pub applicable_products: Vec<String>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub excluded_products: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}
