mod common;

use common::TestApp;
use event_attendance::{
    domain::models::attendance::{AttendanceStatus, Attendee},
    error::AppError,
};
use serde_json::json;
use std::collections::HashSet;
use tokio::task::JoinSet;

fn attendee(email: String) -> Attendee {
    Attendee {
        name: None,
        contact_email: email,
        major: None,
        grade_level: None,
        phone: None,
    }
}

async fn assert_dense_waitlist(app: &TestApp, event_id: &str) {
    let waitlist = app.state.registry.waitlist(event_id).await.unwrap();
    let positions: Vec<i32> = waitlist.iter().map(|r| r.waitlist_position.unwrap()).collect();
    let expected: Vec<i32> = (1..=waitlist.len() as i32).collect();
    assert_eq!(positions, expected, "waitlist positions must be exactly 1..=count");
}

#[tokio::test]
async fn test_concurrent_registrations_never_exceed_capacity() {
    let app = TestApp::new().await;
    let capacity = 5;
    let waitlist_max = 10;
    app.put_event("ev-race", json!({
        "capacity": capacity,
        "waitlistEnabled": true,
        "waitlistMaxSize": waitlist_max,
    })).await;

    let mut set = JoinSet::new();
    for i in 0..40 {
        let registry = app.state.registry.clone();
        set.spawn(async move {
            registry.register("ev-race", attendee(format!("racer{}@umich.edu", i)), None).await
        });
    }

    let mut confirmed = 0;
    let mut waitlisted = 0;
    let mut rejected = 0;
    let mut busy = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(record) if record.status == AttendanceStatus::Confirmed => confirmed += 1,
            Ok(_) => waitlisted += 1,
            Err(AppError::WaitlistFull) => rejected += 1,
            Err(AppError::Busy) => busy += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    println!("confirmed={confirmed} waitlisted={waitlisted} rejected={rejected} busy={busy}");

    let summary = app.state.registry.get_stats("ev-race").await.unwrap();
    assert!(summary.stats.confirmed_count <= capacity, "capacity exceeded");
    assert!(summary.stats.waitlist_count <= waitlist_max, "waitlist overflowed");
    assert_eq!(summary.stats.confirmed_count, confirmed);
    assert_eq!(summary.stats.waitlist_count, waitlisted);
    if busy == 0 {
        assert_eq!(confirmed, capacity);
        assert_eq!(waitlisted, waitlist_max);
        assert_eq!(rejected, 40 - capacity - waitlist_max);
    }

    assert_dense_waitlist(&app, "ev-race").await;
}

#[tokio::test]
async fn test_concurrent_duplicate_registrations_admit_one() {
    let app = TestApp::new().await;
    app.put_event("ev-dup", json!({ "capacity": 10 })).await;

    let mut set = JoinSet::new();
    for _ in 0..10 {
        let registry = app.state.registry.clone();
        set.spawn(async move {
            registry.register("ev-dup", attendee("same@umich.edu".to_string()), None).await
        });
    }

    let mut ids = HashSet::new();
    let mut duplicates = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(record) => {
                ids.insert(record.id);
            }
            Err(AppError::AlreadyRegistered) => duplicates += 1,
            Err(AppError::Busy) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(ids.len(), 1, "exactly one registration must win");
    assert!(duplicates <= 9);
    assert_eq!(app.state.registry.get_stats("ev-dup").await.unwrap().stats.confirmed_count, 1);
}

#[tokio::test]
async fn test_concurrent_cancellations_keep_waitlist_dense() {
    let app = TestApp::new().await;
    app.put_event("ev-churn", json!({ "capacity": 4, "waitlistEnabled": true })).await;

    for i in 0..16 {
        app.state.registry
            .register("ev-churn", attendee(format!("p{}@umich.edu", i)), None)
            .await
            .unwrap();
    }

    let mut set = JoinSet::new();
    // Two confirmed and four waitlisted attendees leave at once while newcomers arrive.
    for i in [0, 2, 5, 7, 9, 12] {
        let registry = app.state.registry.clone();
        set.spawn(async move {
            registry.cancel("ev-churn", &format!("p{}@umich.edu", i)).await.map(|_| ())
        });
    }
    for i in 16..20 {
        let registry = app.state.registry.clone();
        set.spawn(async move {
            registry.register("ev-churn", attendee(format!("p{}@umich.edu", i)), None).await.map(|_| ())
        });
    }

    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(()) | Err(AppError::Busy) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let summary = app.state.registry.get_stats("ev-churn").await.unwrap();
    assert!(summary.stats.confirmed_count <= 4);
    assert_dense_waitlist(&app, "ev-churn").await;

    // With people still waiting, every freed seat must have been refilled.
    if summary.stats.waitlist_count > 0 {
        assert_eq!(summary.stats.confirmed_count, 4);
    }
}

#[tokio::test]
async fn test_events_do_not_share_capacity() {
    let app = TestApp::new().await;
    app.put_event("ev-left", json!({ "capacity": 2 })).await;
    app.put_event("ev-right", json!({ "capacity": 2 })).await;

    let mut set = JoinSet::new();
    for event_id in ["ev-left", "ev-right"] {
        for i in 0..2 {
            let registry = app.state.registry.clone();
            set.spawn(async move {
                registry.register(event_id, attendee(format!("x{}@umich.edu", i)), None).await
            });
        }
    }

    while let Some(res) = set.join_next().await {
        assert_eq!(res.unwrap().unwrap().status, AttendanceStatus::Confirmed);
    }
}
