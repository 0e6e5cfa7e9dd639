use super::*;
use crate::orders::checkout::CreateOrder;
use shared::models::{CouponUsage, DiscountType, Product, PromotionKind, UsageAction};
use shared::order::{DeliveryInfo, OrderItemInput, PaymentMethod, PaymentStatus};


fn create_test_manager() -> OrdersManager {
    let storage = LedgerStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(storage)
}

// ========================================================================
// Helper: catalog fixtures
// ========================================================================

fn seed_product(manager: &OrdersManager, id: &str, price: f64, category: Option<&str>) {
    let storage = manager.storage();
    let txn = storage.begin_write().unwrap();
    storage
        .store_product(
            &txn,
            &Product {
                id: id.to_string(),
                name: format!("Product {}", id),
                price,
                category_id: category.map(str::to_string),
                is_active: true,
                sales_count: 0,
                updated_at: 0,
            },
        )
        .unwrap();
    txn.commit().unwrap();
}

fn deactivate_product(manager: &OrdersManager, id: &str) {
    let storage = manager.storage();
    let mut product = storage.get_product(id).unwrap().unwrap();
    product.is_active = false;
    let txn = storage.begin_write().unwrap();
    storage.store_product(&txn, &product).unwrap();
    txn.commit().unwrap();
}

fn seed_coupon(
    manager: &OrdersManager,
    code: &str,
    discount_type: DiscountType,
    value: f64,
    configure: impl FnOnce(&mut Coupon),
) {
    let mut coupon = Coupon {
        code: code.to_string(),
        kind: PromotionKind::Coupon,
        owner_id: "seller-1".to_string(),
        description: None,
        discount_type,
        discount_value: value,
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
        created_at: 0,
        updated_at: 0,
    };
    configure(&mut coupon);

    let storage = manager.storage();
    let txn = storage.begin_write().unwrap();
    storage.store_coupon(&txn, &coupon).unwrap();
    txn.commit().unwrap();
}

fn sales_count(manager: &OrdersManager, id: &str) -> u64 {
    manager.storage().get_product(id).unwrap().unwrap().sales_count
}

fn coupon(manager: &OrdersManager, code: &str) -> Coupon {
    manager.storage().get_coupon(code).unwrap().unwrap()
}

// ========================================================================
// Helper: checkout requests
// ========================================================================

fn delivery() -> DeliveryInfo {
    DeliveryInfo {
        recipient_name: "Alice".to_string(),
        phone: "555-0100".to_string(),
        address_line: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
    }
}

fn item(product_id: &str, quantity: u32) -> OrderItemInput {
    OrderItemInput {
        product_id: product_id.to_string(),
        quantity,
        variant: Default::default(),
        customization: None,
    }
}

fn create_order_req(
    items: Vec<OrderItemInput>,
    payment_method: PaymentMethod,
    promo_code: Option<&str>,
) -> CreateOrder {
    CreateOrder {
        customer_id: "alice".to_string(),
        items,
        delivery: delivery(),
        payment_method,
        promo_code: promo_code.map(str::to_string),
    }
}

/// Walk an order forward through `path`
fn advance(manager: &OrdersManager, order_number: &str, path: &[OrderStatus]) -> Order {
    let mut order = manager.get_order(order_number).unwrap();
    for status in path {
        order = manager
            .transition_order_status(order_number, *status, None)
            .unwrap_or_else(|e| panic!("{} -> {}: {}", order.status, status, e));
    }
    order
}

const TO_DELIVERED: [OrderStatus; 6] = [
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::ReadyToShip,
    OrderStatus::Shipped,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
];

/// Mark an online order paid through the ledger path (what a gateway success does)
fn mark_paid(manager: &OrdersManager, order_number: &str) -> Order {
    let writer = OrderWriter::new(manager.storage().clone(), RetryPolicy::default());
    writer
        .mutate(order_number, |current, now| {
            let mut next = current.clone();
            next.payment.status = PaymentStatus::Paid;
            next.payment.payment_date = Some(now);
            Ok(Mutation::write(next, Some(LedgerDelta::Increment), ()))
        })
        .unwrap()
        .order
}

fn redemptions(coupon: &Coupon, action: UsageAction) -> Vec<&CouponUsage> {
    coupon
        .usage_history
        .iter()
        .filter(|u| u.action == action)
        .collect()
}
