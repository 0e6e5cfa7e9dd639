//! Racing writers against the same order
//!
//! Counting must happen exactly once no matter how callbacks and status
//! changes interleave.

mod common;

use common::*;
use shared::order::{OrderStatus, PaymentMethod, PaymentStatus};
use std::sync::Barrier;
use std::thread;

const RACERS: usize = 8;

#[test]
fn duplicate_success_callbacks_count_once() {
    let engine = Engine::in_memory();
    engine.product("tee", 20.0);
    engine.product("mug", 8.0);
    let order = engine.order(
        "alice",
        &[("tee", 2), ("mug", 3)],
        PaymentMethod::Online,
        None,
    );

    let barrier = Barrier::new(RACERS);
    let results = thread::scope(|s| {
        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let engine = &engine;
                let barrier = &barrier;
                let order_number = order.order_number.clone();
                s.spawn(move || {
                    barrier.wait();
                    engine
                        .payments
                        .reconcile(&success(&order_number, &format!("txn_{}", i)))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect::<Vec<_>>()
    });

    assert!(results.iter().all(|r| r.accepted));
    assert!(results.iter().all(|r| r.payment_status == PaymentStatus::Paid));
    assert_eq!(results.iter().filter(|r| !r.replayed).count(), 1);

    assert_eq!(engine.sales_count("tee"), 2);
    assert_eq!(engine.sales_count("mug"), 3);
    let stored = engine.orders.get_order(&order.order_number).unwrap();
    assert!(stored.sales_counted);
    assert_eq!(stored.status, OrderStatus::Confirmed);
}

#[test]
fn delivery_and_payment_paths_never_double_count() {
    // Many orders raced concurrently across distinct writers
    let engine = Engine::in_memory();
    engine.product("tee", 20.0);

    let orders: Vec<_> = (0..RACERS)
        .map(|i| {
            engine
                .order(&format!("c{}", i), &[("tee", 1)], PaymentMethod::CashOnDelivery, None)
                .order_number
        })
        .collect();

    thread::scope(|s| {
        for number in &orders {
            let engine = &engine;
            s.spawn(move || engine.advance(number, &TO_DELIVERED));
        }
    });

    assert_eq!(engine.sales_count("tee"), RACERS as u64);
    for number in &orders {
        let order = engine.orders.get_order(number).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.sales_counted);
    }
}

#[test]
fn cancel_racing_payment_leaves_nothing_counted() {
    for round in 0..10 {
        let engine = Engine::in_memory();
        engine.product("tee", 20.0);
        let order = engine.order("alice", &[("tee", 4)], PaymentMethod::Online, None);
        let number = order.order_number.as_str();

        let barrier = Barrier::new(2);
        thread::scope(|s| {
            let pay = s.spawn(|| {
                barrier.wait();
                engine.payments.reconcile(&success(number, "txn_race"))
            });
            let cancel = s.spawn(|| {
                barrier.wait();
                engine
                    .orders
                    .transition_order_status(number, OrderStatus::Cancelled, None)
            });
            pay.join().unwrap().unwrap();
            cancel.join().unwrap().unwrap();
        });

        let stored = engine.orders.get_order(number).unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled, "round {}", round);
        assert_eq!(stored.payment.status, PaymentStatus::Paid, "round {}", round);
        assert!(!stored.sales_counted, "round {}", round);
        assert_eq!(engine.sales_count("tee"), 0, "round {}", round);
    }
}
