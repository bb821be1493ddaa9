mod common;

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use linevisor::{
    Bus, Dispatch, DowntimeRegistry, ManualClock, NotificationDispatcher, TagBinding, TagMapping,
    TagNotification, TagValue,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
}

fn registry() -> (Arc<ManualClock>, Arc<DowntimeRegistry>) {
    let clock = Arc::new(ManualClock::starting_at(t0()));
    let reg = Arc::new(DowntimeRegistry::new(clock.clone()));
    (clock, reg)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_open_leaves_one_open_entry_per_line() {
    let (_clock, reg) = registry();
    let barrier = Arc::new(tokio::sync::Barrier::new(64));

    let mut tasks = Vec::new();
    for i in 0..64 {
        let reg = Arc::clone(&reg);
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            let line = if i % 2 == 0 { "Line1" } else { "Line2" };
            reg.open(line).await.is_new()
        }));
    }

    let mut created = 0;
    for t in tasks {
        if t.await.unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 2);
    let snap = reg.snapshot().await;
    assert_eq!(snap.len(), 2);
    assert!(snap.iter().all(|e| e.is_open()));
    assert_eq!(reg.open_lines().await, vec!["Line1".to_string(), "Line2".to_string()]);
}

#[tokio::test]
async fn open_refresh_close_timeline() {
    let (clock, reg) = registry();

    reg.open("Line1").await;
    clock.advance(5);
    assert_eq!(reg.refresh_elapsed().await, 1);

    let open = reg.open_entry("Line1").await.unwrap();
    assert_eq!(open.elapsed_seconds(), 5);
    assert_eq!(open.end_time(), None);

    clock.advance(3);
    let closed = reg.close("Line1").await.unwrap();
    assert_eq!(closed.end_time(), Some(t0() + Duration::seconds(8)));
    assert_eq!(closed.elapsed_seconds(), 8);

    clock.advance(100);
    assert_eq!(reg.refresh_elapsed().await, 0);
    assert_eq!(reg.snapshot().await[0].elapsed_seconds(), 8);
}

#[tokio::test]
async fn repeated_open_keeps_a_single_entry() {
    let (_clock, reg) = registry();
    assert!(reg.open("Line1").await.is_new());
    assert!(!reg.open("Line1").await.is_new());

    let snap = reg.snapshot().await;
    assert_eq!(snap.len(), 1);
    assert!(snap[0].is_open());
}

#[tokio::test]
async fn close_of_idle_line_creates_nothing() {
    let (_clock, reg) = registry();
    assert!(reg.close("Line1").await.is_none());
    assert!(reg.snapshot().await.is_empty());
}

#[tokio::test]
async fn remove_discards_open_and_closed_entries() {
    let (clock, reg) = registry();
    reg.open("Line1").await;
    clock.advance(2);
    reg.close("Line1").await;
    reg.open("Line1").await;
    reg.open("Line2").await;

    assert_eq!(reg.remove("Line1").await, 2);
    assert_eq!(reg.remove("Line1").await, 0);

    let snap = reg.snapshot().await;
    assert!(snap.iter().all(|e| e.line() != "Line1"));
    assert_eq!(snap.len(), 1);
}

#[tokio::test]
async fn snapshot_is_ordered_by_start_then_line() {
    let (clock, reg) = registry();
    reg.open("LineB").await;
    reg.open("LineA").await;
    clock.advance(1);
    reg.open("Line0").await;

    let lines: Vec<String> = reg
        .snapshot()
        .await
        .iter()
        .map(|e| e.line().to_string())
        .collect();
    assert_eq!(lines, vec!["LineA", "LineB", "Line0"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_down_notifications_for_one_line_open_once() {
    let (_clock, reg) = registry();
    let mapping = TagMapping::new([
        TagBinding::new("Line1.State", "Line1", vec![TagValue::Int(0)], vec![TagValue::Int(1)]),
        TagBinding::new("Line1.Fault", "Line1", vec![TagValue::Bool(true)], vec![TagValue::Bool(false)]),
    ]);
    let dispatcher = Arc::new(NotificationDispatcher::new(Arc::clone(&reg), mapping, Bus::new(256)));
    let barrier = Arc::new(tokio::sync::Barrier::new(32));

    let mut tasks = Vec::new();
    for i in 0..32 {
        let dispatcher = Arc::clone(&dispatcher);
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            let n = if i % 2 == 0 {
                TagNotification::new("Line1.State", TagValue::Int(0), t0())
            } else {
                TagNotification::new("Line1.Fault", TagValue::Bool(true), t0())
            };
            barrier.wait().await;
            dispatcher.dispatch(n).await
        }));
    }

    let mut outcomes = Vec::new();
    for t in tasks {
        outcomes.push(t.await.unwrap());
    }

    assert_eq!(outcomes.iter().filter(|d| **d == Dispatch::Opened).count(), 1);
    assert_eq!(outcomes.iter().filter(|d| **d == Dispatch::AlreadyDown).count(), 31);
    assert_eq!(reg.snapshot().await.len(), 1);
}
