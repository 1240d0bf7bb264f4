//! Conversation-level severity aggregation.
//!
//! Replays the most recent patient turns through the classifier and
//! combines them. Assistant turns never contribute. The only cross-turn
//! rule is the escalation bump (see [`ConversationWindow::is_escalating`]):
//! it can raise severity by one tier but never lowers it.

use tracing::{debug, warn};

use crate::triage::classifier::MessageClassifier;
use crate::triage::types::{ConversationWindow, MessageAnalysis, Turn};

/// Number of patient turns considered by default.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Aggregates severity over a bounded window of patient turns.
#[derive(Debug, Clone)]
pub struct ConversationAggregator {
    classifier: MessageClassifier,
    window_size: usize,
}

impl ConversationAggregator {
    pub fn new(classifier: MessageClassifier) -> Self {
        Self::with_window_size(classifier, DEFAULT_WINDOW_SIZE)
    }

    /// A window size of zero is treated as one.
    pub fn with_window_size(classifier: MessageClassifier, window_size: usize) -> Self {
        Self {
            classifier,
            window_size: window_size.max(1),
        }
    }

    pub fn classifier(&self) -> &MessageClassifier {
        &self.classifier
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Reduce the last `window_size` patient turns (oldest first) to analyses.
    ///
    /// A turn with non-text content contributes the default analysis in its
    /// slot and is listed in `malformed_turns` by its position in `turns`.
    /// The other turns still count.
    pub fn window(&self, turns: &[Turn]) -> ConversationWindow {
        let patient: Vec<(usize, &Turn)> = turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_patient())
            .collect();
        let start = patient.len().saturating_sub(self.window_size);

        let mut window = ConversationWindow::default();
        for (index, turn) in &patient[start..] {
            match turn.content.as_deref() {
                Some(content) => window.analyses.push(self.classifier.classify(content)),
                None => {
                    warn!(index = *index, "Patient turn has non-text content, scoring it as default");
                    window.analyses.push(MessageAnalysis::default());
                    window.malformed_turns.push(*index);
                }
            }
        }
        window
    }

    /// Aggregate severity across the conversation.
    pub fn analyze_history(&self, turns: &[Turn]) -> MessageAnalysis {
        let window = self.window(turns);
        let aggregate = window.aggregate();
        debug!(
            analyzed = window.analyses.len(),
            malformed = window.malformed_turns.len(),
            peak = window.peak_severity().level(),
            escalating = window.is_escalating(),
            severity = aggregate.severity.level(),
            "Aggregated conversation"
        );
        aggregate
    }
}
