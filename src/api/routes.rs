//! REST endpoints for triage.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::triage::{
    Author, Decision, DecisionEngine, EscalationRuleResolver, MessageAnalysis, Turn,
};

pub const DISCLAIMER: &str =
    "This is automated guidance and not a substitute for professional medical consultation.";

/// Shared state for triage routes.
#[derive(Clone)]
pub struct TriageRouteState {
    pub engine: Arc<DecisionEngine>,
}

// ── Request / response types ────────────────────────────────────────

/// Body for the single-message endpoints.
///
/// `message` is kept as raw JSON so that non-text values degrade to the
/// default result instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
struct MessageRequest {
    #[serde(default)]
    message: Value,
}

/// A conversation turn as sent by the caller. Every field is raw JSON; see
/// [`decode_turn`].
#[derive(Debug, Default, Deserialize)]
struct RawTurn {
    #[serde(default)]
    author: Value,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    timestamp: Value,
}

/// Decode one turn without ever failing.
///
/// Unknown or non-string authors become `Author::Other`, non-string content
/// becomes malformed content, and an entry that is not an object becomes a
/// malformed turn from `Author::Other`.
fn decode_turn(value: Value) -> Turn {
    let raw = serde_json::from_value::<RawTurn>(value).unwrap_or_else(|e| {
        debug!(error = %e, "Turn is not an object, treating it as malformed");
        RawTurn::default()
    });
    Turn {
        author: serde_json::from_value(raw.author).unwrap_or(Author::Other),
        content: raw.content.as_str().map(String::from),
        timestamp: serde_json::from_value::<DateTime<Utc>>(raw.timestamp).ok(),
    }
}

/// Parse a request body leniently: a body of the wrong shape is treated as
/// an empty request.
fn lenient<T: DeserializeOwned + Default>(body: Value) -> T {
    serde_json::from_value(body).unwrap_or_else(|e| {
        debug!(error = %e, "Unexpected request shape, using empty request");
        T::default()
    })
}

#[derive(Debug, Default, Deserialize)]
struct DecideRequest {
    /// Conversation turns, oldest first. Anything but an array is ignored.
    #[serde(default)]
    turns: Value,
    /// Newest patient message, appended after `turns` when present.
    #[serde(default)]
    message: Value,
}

impl DecideRequest {
    fn into_turns(self) -> Vec<Turn> {
        let mut turns: Vec<Turn> = match self.turns {
            Value::Array(items) => items.into_iter().map(decode_turn).collect(),
            _ => Vec::new(),
        };
        match self.message {
            Value::Null => {}
            Value::String(content) => turns.push(Turn::patient(content)),
            _ => turns.push(Turn {
                author: Author::Patient,
                content: None,
                timestamp: None,
            }),
        }
        turns
    }
}

/// Envelope returned by `/api/triage/decide`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub decision_id: Uuid,
    pub decided_at: DateTime<Utc>,
    pub needs_escalation: bool,
    pub disclaimer: String,
    pub decision: Decision,
}

impl DecisionResponse {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            decided_at: Utc::now(),
            needs_escalation: decision.recommendation.is_emergency(),
            disclaimer: DISCLAIMER.to_string(),
            decision,
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /health
async fn health(State(state): State<TriageRouteState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "triage-engine",
        "taxonomy_version": state.engine.taxonomy_version(),
    }))
}

/// POST /api/triage/classify
///
/// Severity of a single message.
async fn classify(
    State(state): State<TriageRouteState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let req: MessageRequest = lenient(body);
    let analysis = match req.message.as_str() {
        Some(message) => state.engine.classifier().classify(message),
        None => {
            debug!("Non-text message, returning default analysis");
            MessageAnalysis::default()
        }
    };
    Json(analysis)
}

/// POST /api/triage/resolve
///
/// Recommended actions for a single message.
async fn resolve(
    State(state): State<TriageRouteState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let req: MessageRequest = lenient(body);
    let result = match req.message.as_str() {
        Some(message) => state.engine.resolver().resolve(message),
        None => {
            debug!("Non-text message, returning info-only actions");
            EscalationRuleResolver::fallback()
        }
    };
    Json(result)
}

/// POST /api/triage/decide
///
/// Full decision over a conversation plus an optional newest message.
async fn decide(
    State(state): State<TriageRouteState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let turns = lenient::<DecideRequest>(body).into_turns();
    let decision = state.engine.decide(&turns);
    Json(DecisionResponse::new(decision))
}

/// Build the triage REST routes.
pub fn triage_routes(state: TriageRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/triage/classify", post(classify))
        .route("/api/triage/resolve", post(resolve))
        .route("/api/triage/decide", post(decide))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::Recommendation;

    fn decide_request(json: Value) -> DecideRequest {
        lenient(json)
    }

    #[test]
    fn raw_turn_keeps_text_content() {
        let turns = decide_request(serde_json::json!({
            "turns": [
                {"author": "patient", "content": "fever", "timestamp": "2026-01-02T03:04:05Z"},
                {"author": "assistant", "content": "ok"}
            ]
        }))
        .into_turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].author, Author::Patient);
        assert_eq!(turns[0].content.as_deref(), Some("fever"));
        assert!(turns[0].timestamp.is_some());
        assert_eq!(turns[1].author, Author::Assistant);
    }

    #[test]
    fn non_text_content_becomes_malformed() {
        let turns = decide_request(serde_json::json!({
            "turns": [{"author": "patient", "content": {"text": "fever"}}],
            "message": 42
        }))
        .into_turns();
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().all(|t| t.content.is_none()));
        assert!(turns.iter().all(|t| t.is_patient()));
    }

    #[test]
    fn missing_author_and_bad_timestamp_are_tolerated() {
        let turns = decide_request(serde_json::json!({
            "turns": [{"content": "chest pain", "timestamp": "yesterday"}]
        }))
        .into_turns();
        assert_eq!(turns[0].author, Author::Other);
        assert!(turns[0].timestamp.is_none());
    }

    #[test]
    fn message_is_appended_as_patient_turn() {
        let turns = decide_request(serde_json::json!({
            "turns": [{"author": "assistant", "content": "How can I help?"}],
            "message": "I need a refill"
        }))
        .into_turns();
        assert_eq!(turns.len(), 2);
        assert!(turns[1].is_patient());
        assert_eq!(turns[1].content.as_deref(), Some("I need a refill"));
    }

    #[test]
    fn non_string_author_becomes_other() {
        let turns = decide_request(serde_json::json!({
            "turns": [
                {"author": 7, "content": "chest pain"},
                {"author": {"role": "patient"}, "content": "fever"},
                {"author": "Nurse", "content": "hello"}
            ]
        }))
        .into_turns();
        assert_eq!(turns.len(), 3);
        assert!(turns.iter().all(|t| t.author == Author::Other));
        assert_eq!(turns[0].content.as_deref(), Some("chest pain"));
    }

    #[test]
    fn non_object_turns_are_malformed() {
        let turns = decide_request(serde_json::json!({
            "turns": ["chest pain", 3, null],
            "message": "fever"
        }))
        .into_turns();
        assert_eq!(turns.len(), 4);
        assert!(turns[..3].iter().all(|t| t.author == Author::Other));
        assert!(turns[..3].iter().all(|t| t.content.is_none()));
        assert!(turns[3].is_patient());
    }

    #[test]
    fn wrong_shaped_body_is_an_empty_request() {
        assert!(decide_request(serde_json::json!({"turns": "chest pain"}))
            .into_turns()
            .is_empty());
        assert!(decide_request(serde_json::json!("chest pain")).into_turns().is_empty());
        let req: MessageRequest = lenient(serde_json::json!("chest pain"));
        assert!(req.message.is_null());
    }

    #[test]
    fn empty_body_has_no_turns() {
        let turns = decide_request(serde_json::json!({})).into_turns();
        assert!(turns.is_empty());
    }

    #[test]
    fn envelope_flags_emergencies() {
        let engine = DecisionEngine::with_taxonomy(Arc::new(
            crate::triage::KeywordTaxonomy::builtin().unwrap(),
        ));
        let urgent = DecisionResponse::new(engine.decide(&[Turn::patient("I fainted")]));
        assert_eq!(urgent.decision.recommendation, Recommendation::EmergencyCall);
        assert!(urgent.needs_escalation);
        assert_eq!(urgent.disclaimer, DISCLAIMER);

        let routine = DecisionResponse::new(engine.decide(&[Turn::patient("mild cough")]));
        assert!(!routine.needs_escalation);
    }
}
