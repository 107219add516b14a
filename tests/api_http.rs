//! Read-API behavior over real HTTP

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use common::{build_engine, wait_terminal, ScriptedQuotes};
use marketpulse::api::{router, AppState};
use marketpulse::common::errors::EngineError;
use marketpulse::common::types::{Instrument, Quote};
use marketpulse::config::types::EngineConfig;
use marketpulse::engine::{MomentumScorer, ScoreOutcome, Scorer};
use marketpulse::market::MarketContext;

/// Scorer that never finishes fast, used to hold a run open
struct SlowScorer;

#[async_trait]
impl Scorer for SlowScorer {
    async fn score(
        &self,
        instrument: &Instrument,
        quote: &Quote,
        context: &MarketContext,
    ) -> Result<ScoreOutcome, EngineError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        MomentumScorer.score(instrument, quote, context).await
    }
}

async fn serve(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn universe() -> Vec<Instrument> {
    vec![
        Instrument::new("600519", "贵州茅台"),
        Instrument::new("000001", "平安银行"),
    ]
}

fn quotes() -> ScriptedQuotes {
    ScriptedQuotes::new(&[("600519", dec!(6.0)), ("000001", dec!(-1.0))])
}

#[tokio::test]
async fn decisions_endpoint_reports_no_data_before_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, store) = build_engine(
        universe(),
        quotes(),
        Arc::new(MomentumScorer),
        EngineConfig::default(),
        dir.path(),
    );
    let base = serve(AppState { engine, store }).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/decisions"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["has_data"], serde_json::Value::Bool(false));
    assert!(body["message"].is_string());
    assert!(body.get("decisions").is_none());
}

#[tokio::test]
async fn trigger_runs_and_decisions_become_available() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, store) = build_engine(
        universe(),
        quotes(),
        Arc::new(MomentumScorer),
        EngineConfig::default(),
        dir.path(),
    );
    let base = serve(AppState {
        engine: Arc::clone(&engine),
        store,
    })
    .await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/trigger-analysis"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    let started: serde_json::Value = response.json().await.unwrap();
    assert_eq!(started["trigger"], "manual");

    wait_terminal(&engine).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/decisions"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["has_data"], serde_json::Value::Bool(true));
    assert_eq!(body["decisions"].as_array().unwrap().len(), 2);
    assert_eq!(body["buy_count"], serde_json::Value::from(1));
    assert_eq!(body["hold_count"], serde_json::Value::from(1));
}

#[tokio::test]
async fn concurrent_trigger_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, store) = build_engine(
        universe(),
        quotes(),
        Arc::new(SlowScorer),
        EngineConfig::default(),
        dir.path(),
    );
    let base = serve(AppState {
        engine: Arc::clone(&engine),
        store,
    })
    .await;

    let client = reqwest::Client::new();
    let first = client
        .post(format!("{base}/api/trigger-analysis"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::ACCEPTED);

    let second = client
        .post(format!("{base}/api/trigger-analysis"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = second.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("running"));

    wait_terminal(&engine).await;
}

#[tokio::test]
async fn status_endpoint_tracks_run_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, store) = build_engine(
        universe(),
        quotes(),
        Arc::new(MomentumScorer),
        EngineConfig::default(),
        dir.path(),
    );
    let base = serve(AppState {
        engine: Arc::clone(&engine),
        store,
    })
    .await;

    // Idle before any trigger
    let idle: serde_json::Value = reqwest::get(format!("{base}/api/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(idle["analysis_running"], serde_json::Value::Bool(false));
    assert!(idle.get("run").is_none());
    assert!(idle["server_time"].is_string());

    engine
        .try_trigger(marketpulse::common::types::TriggerKind::Manual)
        .unwrap();
    wait_terminal(&engine).await;

    let done: serde_json::Value = reqwest::get(format!("{base}/api/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done["run"]["state"], "COMPLETED");
    assert_eq!(done["run"]["processed"], serde_json::Value::from(2));
}

#[tokio::test]
async fn health_endpoint_is_always_up() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, store) = build_engine(
        universe(),
        quotes(),
        Arc::new(MomentumScorer),
        EngineConfig::default(),
        dir.path(),
    );
    let base = serve(AppState { engine, store }).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["analysis_running"], serde_json::Value::Bool(false));
}
