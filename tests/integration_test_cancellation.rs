mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::{json, Value};

fn positions(waitlist: &[Value]) -> Vec<(String, i64)> {
    waitlist.iter()
        .map(|r| (
            r["contactEmail"].as_str().unwrap().to_string(),
            r["waitlistPosition"].as_i64().unwrap(),
        ))
        .collect()
}

#[tokio::test]
async fn test_cancel_is_idempotent_only_once() {
    let app = TestApp::new().await;
    app.put_event("ev-idem", json!({ "capacity": 3 })).await;
    app.register("ev-idem", "a@umich.edu").await;

    let res = app.cancel("ev-idem", "a@umich.edu").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.cancel("ev-idem", "a@umich.edu").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(parse_body(res).await["code"], "registration_not_found");
}

#[tokio::test]
async fn test_cancel_unknown_event_or_registration() {
    let app = TestApp::new().await;
    app.put_event("ev-c404", json!({})).await;

    let res = app.cancel("ev-nope", "a@umich.edu").await;
    assert_eq!(parse_body(res).await["code"], "event_not_found");

    let res = app.cancel("ev-c404", "a@umich.edu").await;
    assert_eq!(parse_body(res).await["code"], "registration_not_found");

    let res = app.send("DELETE", "/api/v1/events/ev-c404/attendance?email=", None, false).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancelled_attendee_can_register_again() {
    let app = TestApp::new().await;
    app.put_event("ev-again", json!({ "capacity": 1, "waitlistEnabled": true })).await;

    app.register("ev-again", "a@umich.edu").await;
    app.register("ev-again", "b@umich.edu").await;
    app.cancel("ev-again", "a@umich.edu").await;

    let body = parse_body(app.register("ev-again", "a@umich.edu").await).await;
    assert_eq!(body["status"], "waitlisted");
    assert_eq!(body["waitlistPosition"], 1);

    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE event_id = 'ev-again' AND contact_email = 'a@umich.edu'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows.0, 2, "cancelled record should be kept alongside the new one");
}

#[tokio::test]
async fn test_cancelling_waitlisted_record_closes_the_gap() {
    let app = TestApp::new().await;
    app.put_event("ev-gap", json!({ "capacity": 1, "waitlistEnabled": true })).await;

    for email in ["a@umich.edu", "b@umich.edu", "c@umich.edu", "d@umich.edu", "e@umich.edu"] {
        app.register("ev-gap", email).await;
    }

    let res = app.cancel("ev-gap", "c@umich.edu").await;
    let body = parse_body(res).await;
    assert!(body.get("promoted").is_none(), "waitlist cancellation never promotes");

    assert_eq!(
        positions(&app.waitlist("ev-gap").await),
        vec![
            ("b@umich.edu".to_string(), 1),
            ("d@umich.edu".to_string(), 2),
            ("e@umich.edu".to_string(), 3),
        ]
    );

    app.cancel("ev-gap", "b@umich.edu").await;
    assert_eq!(
        positions(&app.waitlist("ev-gap").await),
        vec![("d@umich.edu".to_string(), 1), ("e@umich.edu".to_string(), 2)]
    );

    app.cancel("ev-gap", "e@umich.edu").await;
    assert_eq!(positions(&app.waitlist("ev-gap").await), vec![("d@umich.edu".to_string(), 1)]);

    let stats = app.stats("ev-gap").await;
    assert_eq!(stats["confirmedCount"], 1);
    assert_eq!(stats["waitlistCount"], 1);
}

#[tokio::test]
async fn test_promotion_takes_head_and_shifts_the_rest() {
    let app = TestApp::new().await;
    app.put_event("ev-promo", json!({ "capacity": 2, "waitlistEnabled": true })).await;

    for email in ["a@umich.edu", "b@umich.edu", "c@umich.edu", "d@umich.edu", "e@umich.edu"] {
        app.register("ev-promo", email).await;
    }

    let body = parse_body(app.cancel("ev-promo", "b@umich.edu").await).await;
    assert_eq!(body["promoted"]["contactEmail"], "c@umich.edu");
    assert_eq!(body["message"], "Registration cancelled. c was promoted from the waitlist.");

    let res = app.send("GET", "/api/v1/events/ev-promo/attendance?email=c@umich.edu", None, false).await;
    let promoted = parse_body(res).await;
    assert_eq!(promoted["status"], "confirmed");
    assert!(promoted.get("waitlistPosition").is_none());
    assert!(promoted["confirmedAt"].is_string());

    assert_eq!(
        positions(&app.waitlist("ev-promo").await),
        vec![("d@umich.edu".to_string(), 1), ("e@umich.edu".to_string(), 2)]
    );

    let stats = app.stats("ev-promo").await;
    assert_eq!(stats["confirmedCount"], 2);
    assert_eq!(stats["waitlistCount"], 2);
}

#[tokio::test]
async fn test_no_promotion_when_still_over_capacity() {
    let app = TestApp::new().await;
    app.put_event("ev-shrink", json!({ "capacity": 3, "waitlistEnabled": true })).await;

    for email in ["a@umich.edu", "b@umich.edu", "c@umich.edu", "d@umich.edu"] {
        app.register("ev-shrink", email).await;
    }

    // Capacity lowered after the fact leaves existing confirmations in place.
    app.put_event("ev-shrink", json!({ "capacity": 1, "waitlistEnabled": true })).await;

    let body = parse_body(app.cancel("ev-shrink", "a@umich.edu").await).await;
    assert!(body.get("promoted").is_none());

    let stats = app.stats("ev-shrink").await;
    assert_eq!(stats["confirmedCount"], 2);
    assert_eq!(stats["waitlistCount"], 1);
    assert_eq!(stats["spotsRemaining"], 0);
}

#[tokio::test]
async fn test_raising_capacity_takes_effect_on_next_cancellation() {
    let app = TestApp::new().await;
    app.put_event("ev-grow", json!({ "capacity": 1, "waitlistEnabled": true })).await;

    for email in ["a@umich.edu", "b@umich.edu", "c@umich.edu"] {
        app.register("ev-grow", email).await;
    }

    app.put_event("ev-grow", json!({ "capacity": 2, "waitlistEnabled": true })).await;

    let body = parse_body(app.register("ev-grow", "d@umich.edu").await).await;
    assert_eq!(body["status"], "confirmed", "freed seat goes to the next registrant");

    let body = parse_body(app.cancel("ev-grow", "a@umich.edu").await).await;
    assert_eq!(body["promoted"]["contactEmail"], "b@umich.edu");
    assert_eq!(positions(&app.waitlist("ev-grow").await), vec![("c@umich.edu".to_string(), 1)]);
}
