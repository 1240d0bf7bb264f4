//! Triage severity classification and escalation decisions.
//!
//! Layers, leaf first:
//! 1. `KeywordTaxonomy`: phrase → tier table, validated once at startup
//! 2. `MessageClassifier::classify()`: severity of one message
//! 3. `ConversationAggregator::analyze_history()`: severity over recent patient turns
//! 4. `EscalationRuleResolver::resolve()`: actions for the latest message
//! 5. `DecisionEngine::decide()`: combines 3 and 4
//!
//! Everything is synchronous and side-effect free. Components hold only
//! immutable data and can be shared across threads without locking.

pub mod aggregator;
pub mod classifier;
pub mod engine;
pub mod rules;
pub mod taxonomy;
pub mod types;

pub use aggregator::{ConversationAggregator, DEFAULT_WINDOW_SIZE};
pub use classifier::MessageClassifier;
pub use engine::DecisionEngine;
pub use rules::{EscalationRuleResolver, TriggerCategory};
pub use taxonomy::{KeywordEntry, KeywordTaxonomy};
pub use types::{
    ActionCategory, ActionKind, Author, ConversationWindow, Decision, EscalationAction,
    EscalationResult, MessageAnalysis, Recommendation, SeverityTier, Turn, UrgencyLabel,
};
