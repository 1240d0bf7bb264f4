//! Shared types for the triage engine.
//!
//! Everything here is created per request and discarded once the response
//! is produced. Nothing is mutated after construction.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Severity ────────────────────────────────────────────────────────

/// Clinical urgency tier of a keyword or a message.
///
/// Strictly ordered; `Immediate` is the maximum. Serialized as its
/// numeric value (1–5).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum SeverityTier {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
    Immediate = 5,
}

impl SeverityTier {
    /// Informational messages share the lowest tier.
    pub const INFO: SeverityTier = SeverityTier::Low;

    /// All tiers, scan order (highest first).
    pub const DESCENDING: [SeverityTier; 5] = [
        SeverityTier::Immediate,
        SeverityTier::Critical,
        SeverityTier::High,
        SeverityTier::Medium,
        SeverityTier::Low,
    ];

    /// Numeric level, 1–5.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// One tier up, saturating at `Immediate`.
    pub fn bumped(self) -> SeverityTier {
        match self {
            SeverityTier::Low => SeverityTier::Medium,
            SeverityTier::Medium => SeverityTier::High,
            SeverityTier::High => SeverityTier::Critical,
            SeverityTier::Critical | SeverityTier::Immediate => SeverityTier::Immediate,
        }
    }

    /// Lowercase name, as used in taxonomy files and urgency labels.
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
            SeverityTier::Critical => "critical",
            SeverityTier::Immediate => "immediate",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SeverityTier> for u8 {
    fn from(tier: SeverityTier) -> Self {
        tier.level()
    }
}

impl TryFrom<u8> for SeverityTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SeverityTier::Low),
            2 => Ok(SeverityTier::Medium),
            3 => Ok(SeverityTier::High),
            4 => Ok(SeverityTier::Critical),
            5 => Ok(SeverityTier::Immediate),
            other => Err(format!("severity must be between 1 and 5, got {other}")),
        }
    }
}

// ── Recommendation / label ──────────────────────────────────────────

/// Care pathway derived purely from severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    DoctorBooking,
    EmergencyCall,
    ImmediateEmergency,
}

impl Recommendation {
    pub fn for_severity(severity: SeverityTier) -> Self {
        match severity {
            SeverityTier::Immediate => Recommendation::ImmediateEmergency,
            SeverityTier::Critical => Recommendation::EmergencyCall,
            _ => Recommendation::DoctorBooking,
        }
    }

    /// Whether this pathway involves emergency services.
    pub fn is_emergency(self) -> bool {
        !matches!(self, Recommendation::DoctorBooking)
    }
}

/// Display rendering of severity. `Immediate` only ever appears for tier 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLabel {
    Low,
    Medium,
    High,
    Critical,
    Immediate,
}

impl From<SeverityTier> for UrgencyLabel {
    fn from(tier: SeverityTier) -> Self {
        match tier {
            SeverityTier::Low => UrgencyLabel::Low,
            SeverityTier::Medium => UrgencyLabel::Medium,
            SeverityTier::High => UrgencyLabel::High,
            SeverityTier::Critical => UrgencyLabel::Critical,
            SeverityTier::Immediate => UrgencyLabel::Immediate,
        }
    }
}

// ── Message analysis ────────────────────────────────────────────────

pub const REASONING_IMMEDIATE: &str =
    "Immediate emergency indicators detected. Call emergency services now.";
pub const REASONING_CRITICAL: &str =
    "Critical symptoms detected. Emergency medical care is recommended.";
pub const REASONING_ROUTINE: &str = "No emergency indicators detected.";

/// Reasoning text for a severity band (≥5, ≥4, below).
pub fn reasoning_for(severity: SeverityTier) -> &'static str {
    if severity >= SeverityTier::Immediate {
        REASONING_IMMEDIATE
    } else if severity >= SeverityTier::Critical {
        REASONING_CRITICAL
    } else {
        REASONING_ROUTINE
    }
}

/// Severity assessment of one message or an aggregated conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAnalysis {
    pub severity: SeverityTier,
    /// Matched phrases, first-seen order, no duplicates.
    pub matched_keywords: Vec<String>,
    pub recommendation: Recommendation,
    pub urgency_label: UrgencyLabel,
    pub reasoning: String,
}

impl MessageAnalysis {
    /// Build an analysis, deriving recommendation, label, and reasoning
    /// from `severity`.
    pub fn from_severity(severity: SeverityTier, matched_keywords: Vec<String>) -> Self {
        Self {
            severity,
            matched_keywords,
            recommendation: Recommendation::for_severity(severity),
            urgency_label: severity.into(),
            reasoning: reasoning_for(severity).to_string(),
        }
    }
}

impl Default for MessageAnalysis {
    fn default() -> Self {
        Self::from_severity(SeverityTier::Low, Vec::new())
    }
}

// ── Conversation ────────────────────────────────────────────────────

/// Who wrote a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Patient,
    Assistant,
    #[serde(other)]
    Other,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub author: Author,
    /// `None` when the caller supplied content that was not text.
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl Turn {
    pub fn patient(content: impl Into<String>) -> Self {
        Self {
            author: Author::Patient,
            content: Some(content.into()),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            author: Author::Assistant,
            content: Some(content.into()),
            timestamp: None,
        }
    }

    pub fn is_patient(&self) -> bool {
        self.author == Author::Patient
    }
}

/// The most recent patient turns, oldest first, each reduced to an analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationWindow {
    pub analyses: Vec<MessageAnalysis>,
    /// Positions (in the input turns) of patient turns with non-text content.
    pub malformed_turns: Vec<usize>,
}

impl ConversationWindow {
    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Highest severity across the window, `Low` when empty.
    pub fn peak_severity(&self) -> SeverityTier {
        self.analyses
            .iter()
            .map(|a| a.severity)
            .max()
            .unwrap_or_default()
    }

    /// Whether the latest turn is strictly worse than the one before it
    /// while the window has already reached `High`.
    pub fn is_escalating(&self) -> bool {
        let [.., previous, latest] = self.analyses.as_slice() else {
            return false;
        };
        latest.severity > previous.severity && self.peak_severity() >= SeverityTier::High
    }

    /// Union of matched keywords across the window, first-seen order.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for keyword in self.analyses.iter().flat_map(|a| &a.matched_keywords) {
            if !keywords.contains(keyword) {
                keywords.push(keyword.clone());
            }
        }
        keywords
    }

    /// Combine the window into one analysis, applying the escalation bump.
    pub fn aggregate(&self) -> MessageAnalysis {
        let mut severity = self.peak_severity();
        if self.is_escalating() {
            severity = severity.bumped();
        }
        MessageAnalysis::from_severity(severity, self.keywords())
    }
}

// ── Escalation actions ──────────────────────────────────────────────

/// User-facing bucket an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionCategory {
    Emergency,
    HighSeverity,
    Recommendation,
    SelfCare,
    Info,
}

/// What the caller should do when the user picks an action.
///
/// Pure data: the engine never performs the side effect itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Open a phone dialer.
    Dial { number: String },
    /// Open an external map search.
    OpenMap { query: String },
    /// Route into the booking flow.
    NavigateBooking { route: String },
    /// Show an in-app guide.
    ShowGuide { topic: String },
}

/// A recommended action, generated fresh for every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationAction {
    /// Stable key; unique within a result.
    pub id: String,
    pub category: ActionCategory,
    pub title: String,
    pub description: String,
    /// 1–5, higher is more urgent.
    pub urgency: u8,
    /// Phone/URL target, opaque to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_handle: Option<String>,
    /// The caller must authenticate the user before acting.
    pub requires_auth: bool,
    pub action: ActionKind,
}

/// Ordered actions plus a summary keyed to the highest urgency present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationResult {
    pub actions: Vec<EscalationAction>,
    pub summary_message: String,
}

impl EscalationResult {
    pub fn max_urgency(&self) -> u8 {
        self.actions.iter().map(|a| a.urgency).max().unwrap_or(0)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.iter().any(|a| a.id == id)
    }
}

// ── Decision ────────────────────────────────────────────────────────

/// Combined output of severity aggregation and action resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub severity: SeverityTier,
    pub keywords: Vec<String>,
    pub recommendation: Recommendation,
    pub urgency_label: UrgencyLabel,
    pub reasoning: String,
    /// The escalation bump was applied.
    pub escalating: bool,
    /// A patient turn had non-text content and was scored as the default.
    pub degraded: bool,
    pub actions: Vec<EscalationAction>,
    pub summary_message: String,
    pub taxonomy_version: String,
}
