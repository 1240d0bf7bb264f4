//! Integration tests for the triage REST API.
//!
//! Each test spins up an Axum server on a random port and exercises the
//! real HTTP contract with reqwest.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use triage_engine::api::{DISCLAIMER, build_router};
use triage_engine::config::EngineConfig;
use triage_engine::triage::{DecisionEngine, KeywordTaxonomy};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an Axum server on a random port with the given engine.
async fn start_server_with(engine: DecisionEngine) -> u16 {
    let app = build_router(Arc::new(engine), &EngineConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

async fn start_server() -> u16 {
    let taxonomy = Arc::new(KeywordTaxonomy::builtin().unwrap());
    start_server_with(DecisionEngine::with_taxonomy(taxonomy)).await
}

async fn post(port: u16, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

fn action_ids(actions: &Value) -> Vec<String> {
    actions
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect()
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "triage-engine");
        assert_eq!(body["taxonomy_version"], "builtin-2026.1");
    })
    .await
    .expect("test timed out");
}

// ── Classify / resolve ──────────────────────────────────────────────

#[tokio::test]
async fn classify_emergency_message() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(
            port,
            "/api/triage/classify",
            json!({"message": "I have chest pain and can't breathe"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["severity"], 5);
        assert_eq!(body["recommendation"], "IMMEDIATE_EMERGENCY");
        assert_eq!(body["urgency_label"], "immediate");
        assert_eq!(body["matched_keywords"], json!(["chest pain", "can't breathe"]));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn classify_non_text_message_returns_default() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(port, "/api/triage/classify", json!({"message": null})).await;
        assert_eq!(status, 200);
        assert_eq!(body["severity"], 1);
        assert_eq!(body["matched_keywords"], json!([]));
        assert_eq!(body["recommendation"], "DOCTOR_BOOKING");
        assert_eq!(body["reasoning"], "No emergency indicators detected.");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn resolve_booking_request() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(
            port,
            "/api/triage/resolve",
            json!({"message": "I'd like to book an appointment for a check-up"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(
            action_ids(&body["actions"]),
            vec!["book-doctor", "specialist", "health-info"]
        );
        assert_eq!(body["actions"][0]["urgency"], 3);
        assert_eq!(body["actions"][0]["requires_auth"], true);
        assert_eq!(body["actions"][0]["action"]["kind"], "navigate_booking");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn resolve_non_text_message_is_info_only() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) =
            post(port, "/api/triage/resolve", json!({"message": ["chest pain"]})).await;
        assert_eq!(status, 200);
        assert_eq!(action_ids(&body["actions"]), vec!["health-info"]);
    })
    .await
    .expect("test timed out");
}

// ── Decide ──────────────────────────────────────────────────────────

#[tokio::test]
async fn decide_escalating_conversation() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(
            port,
            "/api/triage/decide",
            json!({
                "turns": [
                    {"author": "patient", "content": "moderate pain in my side"},
                    {"author": "assistant", "content": "Is it chest pain?"}
                ],
                "message": "now it's severe pain"
            }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["needs_escalation"], true);
        assert_eq!(body["disclaimer"], DISCLAIMER);
        assert!(body["decision_id"].as_str().is_some());
        assert!(body["decided_at"].as_str().is_some());

        let decision = &body["decision"];
        assert_eq!(decision["severity"], 4);
        assert_eq!(decision["escalating"], true);
        assert_eq!(decision["recommendation"], "EMERGENCY_CALL");
        assert_eq!(decision["keywords"], json!(["moderate pain", "severe pain"]));
        assert_eq!(
            action_ids(&decision["actions"]),
            vec!["urgent-care", "telehealth", "health-info"]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn decide_empty_conversation() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(port, "/api/triage/decide", json!({"turns": []})).await;
        assert_eq!(status, 200);
        assert_eq!(body["needs_escalation"], false);
        let decision = &body["decision"];
        assert_eq!(decision["severity"], 1);
        assert_eq!(decision["keywords"], json!([]));
        assert_eq!(decision["reasoning"], "No emergency indicators detected.");
        assert_eq!(action_ids(&decision["actions"]), vec!["health-info"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn decide_with_malformed_turn_still_answers() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(
            port,
            "/api/triage/decide",
            json!({
                "turns": [
                    {"author": "patient", "content": 12345},
                    {"author": "patient", "content": "chest pain"}
                ]
            }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["needs_escalation"], true);
        let decision = &body["decision"];
        // Only the non-text turn is scored as the default.
        assert_eq!(decision["severity"], 5);
        assert_eq!(decision["degraded"], true);
        assert_eq!(decision["keywords"], json!(["chest pain"]));
        assert_eq!(action_ids(&decision["actions"])[0], "emergency-call");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn decide_tolerates_bad_authors_and_turn_shapes() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(
            port,
            "/api/triage/decide",
            json!({
                "turns": [
                    {"author": 7, "content": "chest pain"},
                    "chest pain",
                    42
                ],
                "message": "my son is choking"
            }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["needs_escalation"], true);
        let decision = &body["decision"];
        assert_eq!(decision["severity"], 5);
        assert_eq!(decision["keywords"], json!(["choking"]));
        assert_eq!(decision["degraded"], false);
        assert_eq!(
            action_ids(&decision["actions"]),
            vec!["emergency-call", "health-info"]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn decide_with_wrong_shaped_body_still_answers() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (status, body) = post(port, "/api/triage/decide", json!({"turns": "chest pain"})).await;
        assert_eq!(status, 200);
        assert_eq!(body["decision"]["severity"], 1);
        assert_eq!(body["decision"]["degraded"], false);
        assert_eq!(action_ids(&body["decision"]["actions"]), vec!["health-info"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn decide_with_custom_taxonomy_file() {
    timeout(TEST_TIMEOUT, async {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version": "clinic-2", "tiers": {{"critical": ["purple toes"]}}}}"#
        )
        .unwrap();
        let config = EngineConfig {
            taxonomy_path: Some(file.path().to_path_buf()),
            ..EngineConfig::default()
        };
        let port = start_server_with(DecisionEngine::from_config(&config).unwrap()).await;

        let (status, body) = post(
            port,
            "/api/triage/decide",
            json!({"message": "My toes look Purple Toes-ish"}),
        )
        .await;
        assert_eq!(status, 200);
        let decision = &body["decision"];
        assert_eq!(decision["severity"], 4);
        assert_eq!(decision["taxonomy_version"], "clinic-2");
        assert_eq!(decision["keywords"], json!(["purple toes"]));
        assert_eq!(action_ids(&decision["actions"])[0], "urgent-care");
    })
    .await
    .expect("test timed out");
}
