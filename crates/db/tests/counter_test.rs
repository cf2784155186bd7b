//! Integration tests for the document sequence counter.
//!
//! Run with: `cargo test -p pettycash-db --test counter_test`

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_wrap)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Barrier;
use uuid::Uuid;

use pettycash_db::CounterRepository;
use pettycash_db::entities::counters;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn fresh_key() -> String {
    format!("TST{}", Uuid::new_v4().simple())
}

async fn drop_key(db: &sea_orm::DatabaseConnection, key: &str) {
    counters::Entity::delete_many()
        .filter(counters::Column::KeyCounter.eq(key))
        .exec(db)
        .await
        .expect("Failed to delete counter");
}

#[tokio::test]
async fn test_fresh_key_starts_at_one() {
    let Some(db) = common::connect().await else {
        return;
    };
    let repo = CounterRepository::new(db.clone());
    let key = fresh_key();

    assert_eq!(repo.peek(&key).await.unwrap(), 0);
    assert_eq!(repo.get_and_increment(&key).await.unwrap(), 1);
    assert_eq!(repo.get_and_increment(&key).await.unwrap(), 2);
    assert_eq!(repo.get_and_increment(&key).await.unwrap(), 3);
    assert_eq!(repo.peek(&key).await.unwrap(), 3);

    drop_key(&db, &key).await;
}

#[tokio::test]
async fn test_keys_are_independent() {
    let Some(db) = common::connect().await else {
        return;
    };
    let repo = CounterRepository::new(db.clone());
    let a = fresh_key();
    let b = fresh_key();

    repo.get_and_increment(&a).await.unwrap();
    repo.get_and_increment(&a).await.unwrap();
    assert_eq!(repo.get_and_increment(&b).await.unwrap(), 1);

    drop_key(&db, &a).await;
    drop_key(&db, &b).await;
}

#[tokio::test]
async fn test_concurrent_increments_are_distinct() {
    let Some(db) = common::connect().await else {
        return;
    };
    let key = Arc::new(fresh_key());
    let repo = Arc::new(CounterRepository::new(db.clone()));

    const TASKS: usize = 50;
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let key = Arc::clone(&key);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                repo.get_and_increment(&key).await
            })
        })
        .collect();

    let values: Vec<i64> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked").expect("increment failed"))
        .collect();

    let distinct: HashSet<i64> = values.iter().copied().collect();
    assert_eq!(distinct.len(), TASKS, "duplicate sequence values: {:?}", values);
    let expected: HashSet<i64> = (1..=TASKS as i64).collect();
    assert_eq!(distinct, expected);

    drop_key(&db, &key).await;
}
