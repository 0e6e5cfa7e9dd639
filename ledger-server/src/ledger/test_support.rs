//! Fixtures shared by the ledger unit tests

use crate::store::LedgerStorage;
use shared::models::{Coupon, DiscountType, Product, PromotionKind};
use shared::order::{
    DeliveryInfo, ItemVariant, Order, OrderItem, PaymentMethod, Pricing,
};

pub const NOW: i64 = 1_709_632_800_000;

pub fn seed_product(storage: &LedgerStorage, id: &str, sales_count: u64) {
    let txn = storage.begin_write().unwrap();
    storage
        .store_product(
            &txn,
            &Product {
                id: id.to_string(),
                name: format!("Product {}", id),
                price: 100.0,
                category_id: None,
                is_active: true,
                sales_count,
                updated_at: NOW,
            },
        )
        .unwrap();
    txn.commit().unwrap();
}

pub fn seed_coupon(storage: &LedgerStorage, code: &str) {
    let txn = storage.begin_write().unwrap();
    storage
        .store_coupon(
            &txn,
            &Coupon {
                code: code.to_string(),
                kind: PromotionKind::Coupon,
                owner_id: "seller-1".to_string(),
                description: None,
                discount_type: DiscountType::Percentage,
                discount_value: 10.0,
                max_discount_amount: None,
                minimum_order_amount: 0.0,
                valid_from: 0,
                valid_until: i64::MAX,
                max_total_uses: None,
                max_uses_per_customer: None,
                applicable_products: vec![],
                applicable_categories: vec![],
                excluded_products: vec![],
                is_active: true,
                total_usage_count: 0,
                total_discount_given: 0.0,
                usage_history: vec![],
                created_at: NOW,
                updated_at: NOW,
            },
        )
        .unwrap();
    txn.commit().unwrap();
}

/// Insert an online order with the given `(product_id, quantity)` lines
pub fn stored_order(
    storage: &LedgerStorage,
    lines: &[(&str, u32)],
    promo: Option<(&str, f64)>,
) -> Order {
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|(id, qty)| OrderItem {
            product_id: id.to_string(),
            product_name: format!("Product {}", id),
            category_id: None,
            variant: ItemVariant::default(),
            unit_price: 100.0,
            quantity: *qty,
            line_total: 100.0 * *qty as f64,
            customization: None,
        })
        .collect();
    let subtotal: f64 = items.iter().map(|i| i.line_total).sum();
    let discount = promo.map(|(_, d)| d).unwrap_or(0.0);
    let pricing = Pricing {
        subtotal,
        delivery_charge: 0.0,
        discount,
        promo_code: promo.map(|(c, _)| c.to_string()),
        total: subtotal - discount,
    };
    let mut order = Order::new(
        "alice".to_string(),
        items,
        DeliveryInfo {
            recipient_name: "Alice".to_string(),
            phone: "555-0100".to_string(),
            address_line: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
        },
        pricing,
        PaymentMethod::Online,
        NOW,
    );

    let txn = storage.begin_write().unwrap();
    storage.insert_order(&txn, &mut order, NOW).unwrap();
    txn.commit().unwrap();
    order
}

pub fn sales_count(storage: &LedgerStorage, id: &str) -> u64 {
    storage.get_product(id).unwrap().unwrap().sales_count
}
