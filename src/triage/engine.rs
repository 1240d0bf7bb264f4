//! Decision engine: the single entry point used by the chat flow.
//!
//! Severity is aggregated over the conversation; actions are resolved from
//! the latest patient message only. Neither half can fail the call: a
//! non-text patient turn is scored as the default and the decision is
//! marked `degraded`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::triage::aggregator::ConversationAggregator;
use crate::triage::classifier::MessageClassifier;
use crate::triage::rules::EscalationRuleResolver;
use crate::triage::taxonomy::KeywordTaxonomy;
use crate::triage::types::{Decision, EscalationResult, MessageAnalysis, Turn};

/// Composes the aggregator and the rule resolver.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    aggregator: ConversationAggregator,
    resolver: EscalationRuleResolver,
}

impl DecisionEngine {
    pub fn new(aggregator: ConversationAggregator, resolver: EscalationRuleResolver) -> Self {
        Self {
            aggregator,
            resolver,
        }
    }

    /// Engine with default rules and window size over `taxonomy`.
    pub fn with_taxonomy(taxonomy: Arc<KeywordTaxonomy>) -> Self {
        let resolver = EscalationRuleResolver::for_taxonomy(&taxonomy);
        Self::new(
            ConversationAggregator::new(MessageClassifier::new(taxonomy)),
            resolver,
        )
    }

    /// Engine as configured: taxonomy source and window size.
    ///
    /// Fails if the taxonomy cannot be built; callers should treat that as
    /// fatal before serving any request.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let taxonomy = Arc::new(config.load_taxonomy()?);
        let resolver = EscalationRuleResolver::for_taxonomy(&taxonomy);
        let aggregator = ConversationAggregator::with_window_size(
            MessageClassifier::new(taxonomy),
            config.window_size,
        );
        Ok(Self::new(aggregator, resolver))
    }

    pub fn classifier(&self) -> &MessageClassifier {
        self.aggregator.classifier()
    }

    pub fn aggregator(&self) -> &ConversationAggregator {
        &self.aggregator
    }

    pub fn resolver(&self) -> &EscalationRuleResolver {
        &self.resolver
    }

    pub fn taxonomy_version(&self) -> &str {
        self.classifier().taxonomy().version()
    }

    /// Decide severity and actions for a conversation.
    pub fn decide(&self, turns: &[Turn]) -> Decision {
        let window = self.aggregator.window(turns);
        let analysis = window.aggregate();
        let escalating = window.is_escalating();
        let degraded = !window.malformed_turns.is_empty();

        let resolution = self.resolve_latest(turns);

        info!(
            severity = analysis.severity.level(),
            escalating,
            degraded,
            keywords = ?analysis.matched_keywords,
            actions = resolution.actions.len(),
            "Triage decision"
        );

        assemble(
            analysis,
            escalating,
            degraded,
            resolution,
            self.taxonomy_version().to_string(),
        )
    }

    fn resolve_latest(&self, turns: &[Turn]) -> EscalationResult {
        let Some(latest) = turns.iter().rev().find(|t| t.is_patient()) else {
            return EscalationRuleResolver::fallback();
        };
        match latest.content.as_deref() {
            Some(content) => self.resolver.resolve(content),
            None => {
                warn!("Latest patient turn has non-text content, using info-only actions");
                EscalationRuleResolver::fallback()
            }
        }
    }
}

fn assemble(
    analysis: MessageAnalysis,
    escalating: bool,
    degraded: bool,
    resolution: EscalationResult,
    taxonomy_version: String,
) -> Decision {
    Decision {
        severity: analysis.severity,
        keywords: analysis.matched_keywords,
        recommendation: analysis.recommendation,
        urgency_label: analysis.urgency_label,
        reasoning: analysis.reasoning,
        escalating,
        degraded,
        actions: resolution.actions,
        summary_message: resolution.summary_message,
        taxonomy_version,
    }
}
