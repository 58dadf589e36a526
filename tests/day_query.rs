//! Tasks of a calendar day, and concurrent day selections

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use second_brain::calendar::{group_by_day, selected_day};
use second_brain::document::Fields;
use second_brain::mock_behaviour::MockBehaviour;
use second_brain::store::MemoryStore;
use second_brain::sync::{FetchOutcome, ListScope};
use second_brain::{DocumentId, NewTask, TaskSync, Value};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn titles(sync: &TaskSync<MemoryStore>) -> Vec<String> {
    sync.state().tasks().iter().map(|t| t.title().to_string()).collect()
}

async fn populate(sync: &TaskSync<MemoryStore>) {
    let tasks = vec![
        NewTask::due("next day", at("2024-12-09T00:30:00Z")),
        NewTask::due("late", at("2024-12-08T23:30:00Z")),
        NewTask::due("previous day", at("2024-12-07T23:59:59.999Z")),
        NewTask::new("undated"),
        NewTask::due("early", at("2024-12-08T02:00:00Z")),
    ];
    for task in tasks {
        sync.create_task(task).await.unwrap();
    }
}


#[tokio::test]
async fn day_query_from_a_device_behind_utc() {
    init_logger();
    let sync = TaskSync::new(MemoryStore::new());
    populate(&sync).await;

    // The user picks December 8th, at 9 PM, on a device in UTC-5
    let utc_minus_5 = FixedOffset::west_opt(5 * 3600).unwrap();
    let picked = utc_minus_5.from_local_datetime(&ymd(2024, 12, 8).and_hms_opt(21, 0, 0).unwrap()).unwrap();

    let day = selected_day(&picked);
    assert_eq!(sync.load_day(day).await.unwrap(), FetchOutcome::Applied);

    let state = sync.state();
    assert_eq!(state.scope(), ListScope::Day(ymd(2024, 12, 8)));
    assert_eq!(state.loading(), false);
    assert_eq!(titles(&sync), vec!["early", "late"]);
}

#[tokio::test]
async fn day_bounds_are_inclusive() {
    init_logger();
    let sync = TaskSync::new(MemoryStore::new());
    sync.create_task(NewTask::due("last millisecond", at("2024-12-08T23:59:59.999Z"))).await.unwrap();
    sync.create_task(NewTask::due("midnight", at("2024-12-08T00:00:00Z"))).await.unwrap();
    sync.create_task(NewTask::due("tomorrow's midnight", at("2024-12-09T00:00:00Z"))).await.unwrap();

    sync.load_day(ymd(2024, 12, 8)).await.unwrap();
    assert_eq!(titles(&sync), vec!["midnight", "last millisecond"]);
}

#[tokio::test]
async fn day_queries_are_idempotent() {
    init_logger();
    let sync = TaskSync::new(MemoryStore::new());
    populate(&sync).await;
    // Same start date: the order must not depend on luck
    sync.create_task(NewTask::due("early twin", at("2024-12-08T02:00:00Z"))).await.unwrap();

    sync.load_day(ymd(2024, 12, 8)).await.unwrap();
    let first = sync.state();
    sync.load_day(ymd(2024, 12, 8)).await.unwrap();
    let second = sync.state();

    assert_eq!(first.tasks().len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn refresh_keeps_the_selected_day() {
    init_logger();
    let sync = TaskSync::new(MemoryStore::new());
    populate(&sync).await;
    sync.load_day(ymd(2024, 12, 8)).await.unwrap();

    sync.create_task(NewTask::due("added meanwhile", at("2024-12-08T12:00:00Z"))).await.unwrap();
    assert_eq!(titles(&sync), vec!["early", "late"]);

    sync.refresh().await.unwrap();
    assert_eq!(sync.state().scope(), ListScope::Day(ymd(2024, 12, 8)));
    assert_eq!(titles(&sync), vec!["early", "added meanwhile", "late"]);
}

#[tokio::test]
async fn superseded_selection_cannot_overwrite_a_newer_one() {
    init_logger();
    let sync = TaskSync::new(MemoryStore::new());
    populate(&sync).await;
    // The first selection gets a slow answer, the second one a fast answer
    sync.store().delay_next_queries(vec![Duration::from_millis(300), Duration::from_millis(0)]);

    let slow = sync.load_day(ymd(2024, 12, 7));
    let fast = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(sync.state().loading());
        sync.load_day(ymd(2024, 12, 9)).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), FetchOutcome::Superseded);
    assert_eq!(fast.unwrap(), FetchOutcome::Applied);

    let state = sync.state();
    assert_eq!(state.scope(), ListScope::Day(ymd(2024, 12, 9)));
    assert_eq!(state.loading(), false);
    assert_eq!(titles(&sync), vec!["next day"]);
}

#[tokio::test]
async fn superseded_failures_are_not_reported() {
    init_logger();
    // The first query to reach the store succeeds, the second one fails
    let mb = Arc::new(Mutex::new(MockBehaviour { query_behaviour: (1, 1), ..MockBehaviour::default() }));
    let sync = TaskSync::new(MemoryStore::with_mock_behaviour(mb));
    populate(&sync).await;
    sync.store().delay_next_queries(vec![Duration::from_millis(300), Duration::from_millis(0)]);

    let slow = sync.load_all();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        sync.load_day(ymd(2024, 12, 8)).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), FetchOutcome::Superseded);
    assert_eq!(fast.unwrap(), FetchOutcome::Applied);

    let state = sync.state();
    assert_eq!(state.last_error(), None);
    assert_eq!(state.scope(), ListScope::Day(ymd(2024, 12, 8)));
    assert_eq!(titles(&sync), vec!["early", "late"]);
}

#[tokio::test]
async fn listing_and_day_queries_agree() {
    init_logger();
    let sync = TaskSync::new(MemoryStore::new());
    populate(&sync).await;
    // Written by a client that only knows a single due date
    let mut due_only = Fields::new();
    due_only.insert("title".to_string(), Value::from("due only"));
    due_only.insert("dueDate".to_string(), Value::Timestamp(at("2024-12-08T12:00:00Z")));
    sync.store().insert("tasks", DocumentId::from("due-only"), due_only);

    sync.load_all().await.unwrap();
    let all = sync.state().tasks().to_vec();
    assert!(all.iter().all(|t| t.title() != "due only"));
    assert_eq!(all.len(), 5);

    let days = group_by_day(&all);
    assert_eq!(days.len(), 3);
    for (day, tasks) in days {
        sync.load_day(day).await.unwrap();
        let expected: Vec<String> = tasks.iter().map(|t| t.title().to_string()).collect();
        assert_eq!(titles(&sync), expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_selections_keep_scope_and_tasks_together() {
    init_logger();
    let sync = Arc::new(TaskSync::new(MemoryStore::new()));
    let days: Vec<NaiveDate> = (1..=7).map(|d| ymd(2024, 12, d)).collect();
    for day in &days {
        let noon = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
        sync.create_task(NewTask::due(format!("task of {}", day), noon)).await.unwrap();
    }

    for _ in 0..20 {
        let handles: Vec<_> = days.iter().map(|day| {
            let sync = Arc::clone(&sync);
            let day = *day;
            tokio::spawn(async move { sync.load_day(day).await })
        }).collect();

        let mut n_applied = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == FetchOutcome::Applied {
                n_applied += 1;
            }
        }
        assert!(n_applied >= 1);

        let state = sync.state();
        let day = match state.scope() {
            ListScope::Day(day) => day,
            ListScope::All => panic!("Unexpected scope"),
        };
        assert_eq!(state.loading(), false);
        assert_eq!(titles(&sync), vec![format!("task of {}", day)]);
    }
}
