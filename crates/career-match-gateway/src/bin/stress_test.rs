//! Load check for the predict endpoint.
//! Simulates a class filling in the quiz at once: concurrent respondents posting full answer sets.
//! Run with gateway up: cargo run --bin stress_test

use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const CONCURRENT_RESPONDENTS: usize = 10;
const REQUESTS_PER_RESPONDENT: usize = 5;

// Question ids from data/quiz_mappings.json.
const FORCED_CHOICE: &[&str] = &["FC01", "FC02", "FC03", "FC04", "FC05", "FC06"];
const LIKERT: &[&str] = &["LI01", "LI02", "LI03", "LI04", "LI05", "LI06", "LI07", "LI08"];
const SITUATIONAL: &[&str] = &["SJT01", "SJT02", "SJT03"];
const OPTION_COUNT: usize = 4;

/// Deterministic answer set per (respondent, request) so runs are comparable.
fn answer_set(seed: usize) -> Value {
    let mut answers = Map::new();
    for (i, q) in FORCED_CHOICE.iter().enumerate() {
        let code = (seed + i) % OPTION_COUNT + 1;
        answers.insert(q.to_string(), json!(code.to_string()));
    }
    for (i, q) in LIKERT.iter().enumerate() {
        let score = (seed * 3 + i) % 5 + 1;
        answers.insert(q.to_string(), json!(score.to_string()));
    }
    for (i, q) in SITUATIONAL.iter().enumerate() {
        let best = (seed + i * 2) % OPTION_COUNT + 1;
        let second = best % OPTION_COUNT + 1;
        answers.insert(
            q.to_string(),
            json!({"best": best.to_string(), "second": second.to_string()}),
        );
    }
    Value::Object(answers)
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[tokio::main]
async fn main() {
    let base_url = std::env::var("CAREER_MATCH_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    println!(
        "[STRESS TEST] Starting — {} respondents × {} requests = {} total",
        CONCURRENT_RESPONDENTS,
        REQUESTS_PER_RESPONDENT,
        CONCURRENT_RESPONDENTS * REQUESTS_PER_RESPONDENT
    );
    println!("[STRESS TEST] Target: {} (ensure gateway is running)", base_url);

    let success = Arc::new(AtomicU32::new(0));
    let failure = Arc::new(AtomicU32::new(0));
    let latencies: Arc<RwLock<Vec<u64>>> = Arc::new(RwLock::new(Vec::new()));
    let top_roles: Arc<RwLock<Vec<String>>> = Arc::new(RwLock::new(Vec::new()));

    let client = Client::new();
    let started = Instant::now();

    let mut handles = Vec::new();
    for respondent in 0..CONCURRENT_RESPONDENTS {
        let client = client.clone();
        let base_url = base_url.clone();
        let success = Arc::clone(&success);
        let failure = Arc::clone(&failure);
        let latencies = Arc::clone(&latencies);
        let top_roles = Arc::clone(&top_roles);

        let h = tokio::spawn(async move {
            for r in 0..REQUESTS_PER_RESPONDENT {
                let body = json!({
                    "answers": answer_set(respondent * REQUESTS_PER_RESPONDENT + r),
                    "top_k": 3,
                });

                let start = Instant::now();
                let res = client
                    .post(format!("{}/api/predict", base_url))
                    .json(&body)
                    .send()
                    .await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                match res {
                    Ok(resp) if resp.status().is_success() => {
                        success.fetch_add(1, Ordering::Relaxed);
                        latencies.write().await.push(elapsed_ms);
                        if let Ok(json) = resp.json::<Value>().await {
                            if let Some(role) = json["top"][0]["role"].as_str() {
                                top_roles.write().await.push(role.to_string());
                            }
                        }
                    }
                    Ok(resp) => {
                        eprintln!("[STRESS TEST] respondent {} got {}", respondent, resp.status());
                        failure.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        eprintln!("[STRESS TEST] respondent {} failed: {}", respondent, e);
                        failure.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
        handles.push(h);
    }

    for h in handles {
        let _ = h.await;
    }

    let wall_ms = started.elapsed().as_millis();
    let s = success.load(Ordering::Relaxed);
    let f = failure.load(Ordering::Relaxed);
    let total = s + f;
    let success_rate = if total > 0 { (s as f64 / total as f64) * 100.0 } else { 0.0 };

    let mut sorted = latencies.read().await.clone();
    sorted.sort_unstable();
    let avg_latency_ms = if sorted.is_empty() {
        0.0
    } else {
        sorted.iter().sum::<u64>() as f64 / sorted.len() as f64
    };

    println!(
        "[STRESS TEST] Success rate: {:.1}% | Average: {:.0}ms | p50: {}ms | p95: {}ms | wall: {}ms",
        success_rate,
        avg_latency_ms,
        percentile(&sorted, 50.0),
        percentile(&sorted, 95.0),
        wall_ms
    );
    println!("[STRESS TEST] Total: {} | Success: {} | Failure: {}", total, s, f);

    let roles = top_roles.read().await;
    let mut distinct: Vec<&String> = roles.iter().collect();
    distinct.sort();
    distinct.dedup();
    println!("[STRESS TEST] Distinct top roles seen: {:?}", distinct);
}
