//! End-to-end tests for the reservation pipeline: dispatcher, workflow,
//! ledger store, and publisher wired together over the in-memory
//! implementations.

use std::sync::Arc;

use common::{CustomerId, ItemId, OrderId};
use domain::{Item, Money, Order, OrderStatus, Product};
use ledger_store::{InMemoryLedgerStore, LedgerStore};
use reservation::{ConsumerPool, InMemoryOrderPublisher, OrderProcessor, ReservationWorkflow};
use tokio::sync::mpsc;

fn order(item_id: i64, quantity: u32, status: OrderStatus) -> Order {
    Order::new(OrderId::new(), CustomerId::new(42))
        .with_product(Product::new(
            ItemId::new(item_id),
            quantity,
            Money::from_cents(1999),
        ))
        .with_status(status)
        .with_source("integration-test")
}

async fn setup(
    available: i64,
    reserved: i64,
) -> (
    Arc<OrderProcessor<InMemoryLedgerStore, InMemoryOrderPublisher>>,
    InMemoryLedgerStore,
    InMemoryOrderPublisher,
) {
    let store = InMemoryLedgerStore::new();
    store
        .insert(Item::new(ItemId::new(1), "Widget", available, reserved))
        .await
        .unwrap();
    let publisher = InMemoryOrderPublisher::new();
    let processor = Arc::new(OrderProcessor::new(
        ReservationWorkflow::new(store.clone()),
        publisher.clone(),
    ));
    (processor, store, publisher)
}

async fn balances(store: &InMemoryLedgerStore) -> (i64, i64) {
    let record = store.find_by_id(ItemId::new(1)).await.unwrap().unwrap();
    (record.item.stock_available, record.item.stock_reserved)
}

#[tokio::test]
async fn test_accept_scenario() {
    let (processor, store, publisher) = setup(100, 0).await;

    processor.process(order(1, 30, OrderStatus::New)).await.unwrap();

    assert_eq!(balances(&store).await, (70, 30));
    assert_eq!(
        publisher.last_published().unwrap().status,
        Some(OrderStatus::Accept)
    );
}

#[tokio::test]
async fn test_reject_scenario_leaves_ledger_unchanged() {
    let (processor, store, publisher) = setup(100, 0).await;

    processor.process(order(1, 150, OrderStatus::New)).await.unwrap();

    assert_eq!(balances(&store).await, (100, 0));
    assert_eq!(
        publisher.last_published().unwrap().status,
        Some(OrderStatus::Reject)
    );
}

#[tokio::test]
async fn test_rollback_scenario() {
    let (processor, store, publisher) = setup(70, 30).await;

    processor
        .process(order(1, 30, OrderStatus::Rollback))
        .await
        .unwrap();

    assert_eq!(balances(&store).await, (100, 0));
    assert_eq!(publisher.published_count(), 0);
}

#[tokio::test]
async fn test_confirmation_scenario() {
    let (processor, store, publisher) = setup(70, 30).await;

    processor
        .process(order(1, 30, OrderStatus::Confirmation))
        .await
        .unwrap();

    assert_eq!(balances(&store).await, (70, 0));
    assert_eq!(publisher.published_count(), 0);
}

#[tokio::test]
async fn test_create_then_rollback_round_trip() {
    let (processor, store, _) = setup(100, 0).await;

    processor.process(order(1, 30, OrderStatus::New)).await.unwrap();
    processor
        .process(order(1, 30, OrderStatus::Rollback))
        .await
        .unwrap();

    assert_eq!(balances(&store).await, (100, 0));
}

#[tokio::test]
async fn test_create_then_confirm_spends_stock() {
    let (processor, store, _) = setup(100, 0).await;

    processor.process(order(1, 30, OrderStatus::New)).await.unwrap();
    processor
        .process(order(1, 30, OrderStatus::Confirmation))
        .await
        .unwrap();

    // Available stays at its post-create value, reserved is spent.
    assert_eq!(balances(&store).await, (70, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_creates_never_oversell() {
    let (processor, store, publisher) = setup(100, 0).await;

    // 8 orders of 30 against 100 available: exactly 3 can be accepted.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let processor = Arc::clone(&processor);
        handles.push(tokio::spawn(async move {
            processor.process(order(1, 30, OrderStatus::New)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let accepted = publisher
        .published()
        .iter()
        .filter(|o| o.status == Some(OrderStatus::Accept))
        .count();
    let rejected = publisher
        .published()
        .iter()
        .filter(|o| o.status == Some(OrderStatus::Reject))
        .count();
    assert_eq!(accepted, 3);
    assert_eq!(rejected, 5);

    let (available, reserved) = balances(&store).await;
    assert_eq!((available, reserved), (10, 90));
    assert!(available >= 0 && reserved >= 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_mixed_operations_keep_balances_non_negative() {
    let (processor, store, _) = setup(50, 50).await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let processor = Arc::clone(&processor);
        let status = match i % 3 {
            0 => OrderStatus::New,
            1 => OrderStatus::Rollback,
            _ => OrderStatus::Confirmation,
        };
        handles.push(tokio::spawn(async move {
            processor.process(order(1, 10, status)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let (available, reserved) = balances(&store).await;
    assert!(available >= 0, "available went negative: {available}");
    assert!(reserved >= 0, "reserved went negative: {reserved}");
}

#[tokio::test]
async fn test_duplicate_rollback_cannot_double_credit() {
    let (processor, store, _) = setup(100, 0).await;

    processor.process(order(1, 30, OrderStatus::New)).await.unwrap();

    let rollback = order(1, 30, OrderStatus::Rollback);
    processor.process(rollback.clone()).await.unwrap();
    processor.process(rollback).await.unwrap();

    // Available cannot be pushed past its pre-reservation value.
    assert_eq!(balances(&store).await, (100, 0));
}

#[tokio::test]
async fn test_duplicate_confirmation_cannot_double_spend() {
    let (processor, store, _) = setup(100, 0).await;

    processor.process(order(1, 60, OrderStatus::New)).await.unwrap();

    let confirm = order(1, 30, OrderStatus::Confirmation);
    processor.process(confirm.clone()).await.unwrap();
    processor.process(confirm).await.unwrap();

    assert_eq!(balances(&store).await, (40, 30));
}

#[tokio::test]
async fn test_pool_end_to_end_over_json_channel() {
    let (processor, store, publisher) = setup(100, 0).await;
    let (tx, rx) = mpsc::channel(32);
    let pool = ConsumerPool::start(4, rx, processor);

    let accepted = order(1, 30, OrderStatus::New);
    tx.send(serde_json::to_string(&accepted).unwrap())
        .await
        .unwrap();
    tx.send(serde_json::to_string(&order(1, 150, OrderStatus::New)).unwrap())
        .await
        .unwrap();
    tx.send("{\"garbage\":".to_string()).await.unwrap();
    drop(tx);
    pool.join().await;

    assert_eq!(balances(&store).await, (70, 30));
    assert_eq!(publisher.published_count(), 2);
    let statuses: Vec<_> = publisher
        .published()
        .iter()
        .filter_map(|o| o.status)
        .collect();
    assert!(statuses.contains(&OrderStatus::Accept));
    assert!(statuses.contains(&OrderStatus::Reject));
}
