//! Single-message severity classifier.
//!
//! Matching is plain substring containment on the lowercased message, so
//! "chest pains" still matches "chest pain". False positives are preferred
//! over missed escalations.

use std::sync::Arc;

use tracing::debug;

use crate::triage::taxonomy::KeywordTaxonomy;
use crate::triage::types::{MessageAnalysis, SeverityTier};

/// Scans one message against the keyword taxonomy.
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    taxonomy: Arc<KeywordTaxonomy>,
}

impl MessageClassifier {
    pub fn new(taxonomy: Arc<KeywordTaxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }

    /// Classify one message.
    ///
    /// Every matching phrase at every tier is recorded; severity is the
    /// highest matched tier, `Low` when nothing matches. Empty input yields
    /// the default analysis.
    pub fn classify(&self, message: &str) -> MessageAnalysis {
        let normalized = message.to_lowercase();
        if normalized.trim().is_empty() {
            return MessageAnalysis::default();
        }

        let mut severity = SeverityTier::Low;
        let mut matched: Vec<String> = Vec::new();

        // Entries are already in tier order, highest first.
        for entry in self.taxonomy.entries() {
            if normalized.contains(entry.phrase.as_str()) {
                severity = severity.max(entry.tier);
                if !matched.contains(&entry.phrase) {
                    matched.push(entry.phrase.clone());
                }
            }
        }

        debug!(
            severity = severity.level(),
            matched = ?matched,
            "Classified message"
        );

        MessageAnalysis::from_severity(severity, matched)
    }
}
