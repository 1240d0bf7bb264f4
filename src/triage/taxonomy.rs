//! Keyword taxonomy: the static phrase → severity tier table.
//!
//! Built once at process start and shared read-only (`Arc<KeywordTaxonomy>`).
//! A phrase may appear in exactly one tier; anything else is rejected at
//! construction time rather than silently overridden.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::TaxonomyError;
use crate::triage::types::SeverityTier;

/// Version tag of the compiled-in phrase table.
pub const BUILTIN_VERSION: &str = "builtin-2026.1";

// ── Built-in phrase table ───────────────────────────────────────────

static IMMEDIATE_PHRASES: &[&str] = &[
    "chest pain",
    "can't breathe",
    "cannot breathe",
    "cant breathe",
    "not breathing",
    "heart attack",
    "stroke",
    "unconscious",
    "unresponsive",
    "seizure",
    "severe bleeding",
    "choking",
    "anaphylaxis",
    "overdose",
    "suicidal",
    "kill myself",
    "coughing up blood",
];

static CRITICAL_PHRASES: &[&str] = &[
    "difficulty breathing",
    "shortness of breath",
    "fainted",
    "passed out",
    "confusion",
    "slurred speech",
    "high fever",
    "vomiting blood",
    "blood in stool",
    "severe headache",
    "allergic reaction",
    "head injury",
    "broken bone",
];

static HIGH_PHRASES: &[&str] = &[
    "severe pain",
    "intense pain",
    "bleeding",
    "persistent vomiting",
    "dehydrated",
    "infection",
    "swelling",
    "dizzy",
    "dizziness",
    "burn",
    "getting worse",
];

static MEDIUM_PHRASES: &[&str] = &[
    "moderate pain",
    "fever",
    "vomiting",
    "diarrhea",
    "rash",
    "cough",
    "headache",
    "sore throat",
    "nausea",
    "ear pain",
    "back pain",
];

static LOW_PHRASES: &[&str] = &[
    "mild",
    "slight",
    "minor",
    "runny nose",
    "stuffy nose",
    "sneezing",
    "itchy",
    "tired",
];

/// Compiled-in phrases for one tier.
pub(crate) fn builtin_phrases(tier: SeverityTier) -> &'static [&'static str] {
    match tier {
        SeverityTier::Immediate => IMMEDIATE_PHRASES,
        SeverityTier::Critical => CRITICAL_PHRASES,
        SeverityTier::High => HIGH_PHRASES,
        SeverityTier::Medium => MEDIUM_PHRASES,
        SeverityTier::Low => LOW_PHRASES,
    }
}

// ── Entries ─────────────────────────────────────────────────────────

/// One phrase and the tier it signals. Phrases are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    pub phrase: String,
    pub tier: SeverityTier,
}

impl KeywordEntry {
    pub fn new(phrase: impl Into<String>, tier: SeverityTier) -> Self {
        Self {
            phrase: phrase.into(),
            tier,
        }
    }
}

/// On-disk taxonomy format.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaxonomyFile {
    version: String,
    tiers: TierPhrases,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TierPhrases {
    immediate: Vec<String>,
    critical: Vec<String>,
    high: Vec<String>,
    medium: Vec<String>,
    low: Vec<String>,
}

impl TierPhrases {
    fn into_entries(self) -> Vec<KeywordEntry> {
        [
            (SeverityTier::Immediate, self.immediate),
            (SeverityTier::Critical, self.critical),
            (SeverityTier::High, self.high),
            (SeverityTier::Medium, self.medium),
            (SeverityTier::Low, self.low),
        ]
        .into_iter()
        .flat_map(|(tier, phrases)| phrases.into_iter().map(move |p| KeywordEntry::new(p, tier)))
        .collect()
    }
}

// ── Taxonomy ────────────────────────────────────────────────────────

/// Validated, immutable phrase table.
#[derive(Debug, Clone)]
pub struct KeywordTaxonomy {
    version: String,
    /// Scan order: tiers highest first, declaration order within a tier.
    entries: Vec<KeywordEntry>,
}

impl KeywordTaxonomy {
    /// The compiled-in taxonomy.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        let entries = SeverityTier::DESCENDING.into_iter().flat_map(|tier| {
            builtin_phrases(tier)
                .iter()
                .map(move |phrase| KeywordEntry::new(*phrase, tier))
        });
        Self::from_entries(BUILTIN_VERSION, entries)
    }

    /// Validate and build a taxonomy.
    ///
    /// Phrases are trimmed and lowercased. Fails on empty phrases, on a
    /// phrase listed more than once (in the same or a different tier), and
    /// on an empty table.
    pub fn from_entries(
        version: impl Into<String>,
        entries: impl IntoIterator<Item = KeywordEntry>,
    ) -> Result<Self, TaxonomyError> {
        let mut seen: HashMap<String, SeverityTier> = HashMap::new();
        let mut normalized = Vec::new();

        for entry in entries {
            let phrase = entry.phrase.trim().to_lowercase();
            if phrase.is_empty() {
                return Err(TaxonomyError::EmptyPhrase { tier: entry.tier });
            }
            if let Some(&first) = seen.get(&phrase) {
                return Err(TaxonomyError::DuplicatePhrase {
                    phrase,
                    first,
                    second: entry.tier,
                });
            }
            seen.insert(phrase.clone(), entry.tier);
            normalized.push(KeywordEntry::new(phrase, entry.tier));
        }

        if normalized.is_empty() {
            return Err(TaxonomyError::EmptyTaxonomy);
        }

        // Stable: keeps declaration order within each tier.
        normalized.sort_by(|a, b| b.tier.cmp(&a.tier));

        Ok(Self {
            version: version.into(),
            entries: normalized,
        })
    }

    /// Parse a JSON taxonomy document.
    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = serde_json::from_str(json)?;
        Self::from_entries(file.version, file.tiers.into_entries())
    }

    /// Load a JSON taxonomy document from disk.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let json = std::fs::read_to_string(path)?;
        let taxonomy = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            version = %taxonomy.version,
            phrases = taxonomy.len(),
            "Loaded keyword taxonomy"
        );
        Ok(taxonomy)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// All entries in scan order (highest tier first).
    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    /// Phrases registered for one tier.
    pub fn phrases(&self, tier: SeverityTier) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |e| e.tier == tier)
            .map(|e| e.phrase.as_str())
    }

    /// Tier of an exact (lowercase) phrase.
    pub fn tier_of(&self, phrase: &str) -> Option<SeverityTier> {
        self.entries
            .iter()
            .find(|e| e.phrase == phrase)
            .map(|e| e.tier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
