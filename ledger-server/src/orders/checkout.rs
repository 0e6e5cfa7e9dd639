//! Checkout input validation and pricing
//!
//! Item prices come from the product records, never from the request.

use crate::core::{Config, LedgerError, LedgerResult, Resource};
use crate::utils::money::{line_total, to_decimal, to_f64};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::models::Product;
use shared::order::{
    DeliveryInfo, MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, OrderItem, OrderItemInput, PaymentMethod,
    Pricing,
};
use std::collections::HashMap;

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: String,
    pub items: Vec<OrderItemInput>,
    pub delivery: DeliveryInfo,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Delivery charge rules
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    pub delivery_charge: f64,
    /// Subtotal at or above which delivery is free
    pub free_delivery_threshold: f64,
}

impl CheckoutSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            delivery_charge: config.delivery_charge,
            free_delivery_threshold: config.free_delivery_threshold,
        }
    }

    pub fn delivery_charge_for(&self, subtotal: f64) -> f64 {
        if to_decimal(subtotal) >= to_decimal(self.free_delivery_threshold) {
            0.0
        } else {
            self.delivery_charge
        }
    }
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            delivery_charge: 50.0,
            free_delivery_threshold: 999.0,
        }
    }
}

/// Validate the request shape before any store access
pub fn validate_request(req: &CreateOrder) -> LedgerResult<()> {
    validate_required_text(
        &req.customer_id,
        "customer_id",
        MAX_SHORT_TEXT_LEN,
        ErrorCode::ValidationFailed,
    )?;

    if req.items.is_empty() {
        return Err(LedgerError::validation(
            ErrorCode::OrderEmpty,
            "Order must contain at least one item",
        ));
    }
    if req.items.len() > MAX_ORDER_ITEMS {
        return Err(LedgerError::validation(
            ErrorCode::ValidationFailed,
            format!("Order has too many items (max {})", MAX_ORDER_ITEMS),
        ));
    }
    for item in &req.items {
        validate_required_text(
            &item.product_id,
            "product_id",
            MAX_SHORT_TEXT_LEN,
            ErrorCode::ValidationFailed,
        )?;
        if item.quantity == 0 || item.quantity > MAX_ITEM_QUANTITY {
            return Err(LedgerError::validation(
                ErrorCode::InvalidQuantity,
                format!(
                    "Quantity for {} must be between 1 and {}, got {}",
                    item.product_id, MAX_ITEM_QUANTITY, item.quantity
                ),
            ));
        }
    }

    let d = &req.delivery;
    let code = ErrorCode::InvalidDeliveryInfo;
    validate_required_text(&d.recipient_name, "recipient_name", MAX_NAME_LEN, code)?;
    validate_required_text(&d.phone, "phone", MAX_SHORT_TEXT_LEN, code)?;
    validate_required_text(&d.address_line, "address_line", MAX_ADDRESS_LEN, code)?;
    validate_required_text(&d.city, "city", MAX_NAME_LEN, code)?;
    validate_required_text(&d.postal_code, "postal_code", MAX_SHORT_TEXT_LEN, code)?;

    Ok(())
}

/// Build priced line items from the request and the catalog
///
/// Fails with `NotFound` for unknown products and a validation error for
/// inactive ones.
pub fn build_items(
    inputs: &[OrderItemInput],
    products: &HashMap<String, Product>,
) -> LedgerResult<Vec<OrderItem>> {
    inputs
        .iter()
        .map(|input| {
            let product = products
                .get(&input.product_id)
                .ok_or_else(|| LedgerError::not_found(Resource::Product, &input.product_id))?;
            if !product.is_active {
                return Err(LedgerError::validation(
                    ErrorCode::ProductInactive,
                    format!("Product {} is not available", product.id),
                ));
            }
            Ok(OrderItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                category_id: product.category_id.clone(),
                variant: input.variant.clone(),
                unit_price: product.price,
                quantity: input.quantity,
                line_total: to_f64(line_total(product.price, input.quantity)),
                customization: input.customization.clone(),
            })
        })
        .collect()
}

/// Σ line_total
pub fn subtotal(items: &[OrderItem]) -> f64 {
    to_f64(
        items
            .iter()
            .map(|i| to_decimal(i.line_total))
            .sum::<Decimal>(),
    )
}

/// Assemble pricing; `total = subtotal + delivery - discount`, floored at 0
pub fn price(
    subtotal: f64,
    delivery_charge: f64,
    discount: f64,
    promo_code: Option<String>,
) -> Pricing {
    let total = (to_decimal(subtotal) + to_decimal(delivery_charge) - to_decimal(discount))
        .max(Decimal::ZERO);
    Pricing {
        subtotal,
        delivery_charge,
        discount,
        promo_code,
        total: to_f64(total),
    }
}
