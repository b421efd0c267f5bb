use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const STAGE_SECS: u64 = 5;
const CAPACITY: i64 = 50;
const WAITLIST_MAX: i64 = 100;

struct Stage {
    rps: u32,
    event_id: String,
}

#[tokio::main]
async fn main() {
    let base_url = std::env::var("LOADTEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let admin_token = std::env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set");
    let domain = std::env::var("LOADTEST_EMAIL_DOMAIN").unwrap_or_else(|_| "umich.edu".to_string());

    println!("{}", "🚀 Starting registration load test".bold().green());
    println!("Target URL: {}", base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("❌ Server is NOT reachable at {}. Please start it first.", base_url).red().bold());
        return;
    }

    println!("{:<10} | {:<15} | {:<15} | {:<30}", "RPS", "Mean (ms)", "P99 (ms)", "Outcomes");
    println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<30}", "", "", "", "");

    let mut violations = 0;
    for rps in [20, 100, 400] {
        let event_id = format!("loadtest-{}", Uuid::new_v4());
        setup_event(&client, &base_url, &admin_token, &event_id).await;

        let stage = Stage { rps, event_id };
        run_stage(&client, &base_url, &domain, &stage).await;

        if !verify_event(&client, &base_url, &admin_token, &stage.event_id).await {
            violations += 1;
        }
    }

    if violations == 0 {
        println!("\n{}", "✅ Capacity and waitlist invariants held in every stage.".green().bold());
    } else {
        println!("\n{}", format!("❌ {} stage(s) violated capacity or waitlist invariants.", violations).red().bold());
        std::process::exit(1);
    }
}

async fn setup_event(client: &Client, base_url: &str, admin_token: &str, event_id: &str) {
    let res = client.put(format!("{}/api/v1/admin/events/{}", base_url, event_id))
        .header("X-Admin-Token", admin_token)
        .json(&json!({
            "hostId": "loadtest-host",
            "title": "Load Test Event",
            "published": true,
            "attendanceEnabled": true,
            "capacity": CAPACITY,
            "waitlistEnabled": true,
            "waitlistMaxSize": WAITLIST_MAX,
        }))
        .send()
        .await
        .expect("Failed to send event upsert request");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Failed to create event. Status: {}. Body: {}", status, txt);
    }
}

async fn run_stage(client: &Client, base_url: &str, domain: &str, stage: &Stage) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(stage.rps).expect("rps must be non-zero"))
    ));

    let url = format!("{}/api/v1/events/{}/attendance", base_url, stage.event_id);
    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(STAGE_SECS);

    while start_time.elapsed() <= duration {
        if limiter.check().is_ok() {
            let client = client.clone();
            let url = url.clone();
            let email = format!("load-{}@{}", Uuid::new_v4().simple(), domain);
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = client.post(&url)
                    .json(&json!({ "name": "Load Tester", "contactEmail": email }))
                    .send()
                    .await;
                let latency = req_start.elapsed();

                let outcome = match res {
                    Ok(r) if r.status() == StatusCode::CREATED => {
                        let body: Value = r.json().await.unwrap_or_default();
                        body["status"].as_str().unwrap_or("unknown").to_string()
                    }
                    Ok(r) => {
                        let body: Value = r.json().await.unwrap_or_default();
                        body["code"].as_str().unwrap_or("unknown").to_string()
                    }
                    Err(_) => "transport_error".to_string(),
                };

                let _ = tx.send((latency, outcome)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).expect("Failed to create histogram");
    let mut outcomes: HashMap<String, u64> = HashMap::new();

    while let Some((latency, outcome)) = rx.recv().await {
        *outcomes.entry(outcome).or_default() += 1;
        let _ = histogram.record(latency.as_micros() as u64);
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;

    let mut summary: Vec<_> = outcomes.into_iter().collect();
    summary.sort();
    let summary = summary.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");

    println!("{:<10} | {:<15.2} | {:<15.2} | {:<30}", stage.rps, mean_ms, p99_ms, summary);

    tokio::time::sleep(Duration::from_millis(500)).await;
}

async fn verify_event(client: &Client, base_url: &str, admin_token: &str, event_id: &str) -> bool {
    let stats: Value = match client.get(format!("{}/api/v1/events/{}/attendance/stats", base_url, event_id)).send().await {
        Ok(r) => r.json().await.unwrap_or_default(),
        Err(e) => {
            eprintln!("{}", format!("   failed to fetch stats: {}", e).red());
            return false;
        }
    };

    let waitlist: Value = match client.get(format!("{}/api/v1/admin/events/{}/waitlist", base_url, event_id))
        .header("X-Admin-Token", admin_token)
        .send()
        .await
    {
        Ok(r) => r.json().await.unwrap_or_default(),
        Err(e) => {
            eprintln!("{}", format!("   failed to fetch waitlist: {}", e).red());
            return false;
        }
    };

    let confirmed = stats["confirmedCount"].as_i64().unwrap_or(-1);
    let waitlisted = stats["waitlistCount"].as_i64().unwrap_or(-1);

    let positions: Vec<i64> = waitlist.as_array()
        .map(|entries| entries.iter().filter_map(|e| e["waitlistPosition"].as_i64()).collect())
        .unwrap_or_default();
    let dense = positions.iter().enumerate().all(|(i, p)| *p == i as i64 + 1);

    let ok = (0..=CAPACITY).contains(&confirmed)
        && (0..=WAITLIST_MAX).contains(&waitlisted)
        && positions.len() as i64 == waitlisted
        && dense;

    if !ok {
        eprintln!(
            "{}",
            format!(
                "   {}: confirmed={} waitlisted={} positions={:?}",
                event_id, confirmed, waitlisted, positions
            ).red()
        );
    }
    ok
}
