//! Escalation rule resolver.
//!
//! Answers "which actions are relevant" for a single message, independent
//! of severity scoring:
//! - each trigger category is checked on its own, and several may fire
//! - every fired category contributes its fixed action templates
//! - an informational action is always appended
//! - actions are deduplicated by id and stably sorted by urgency, descending

use std::collections::HashSet;

use tracing::debug;

use crate::triage::taxonomy::{KeywordTaxonomy, builtin_phrases};
use crate::triage::types::{
    ActionCategory, ActionKind, EscalationAction, EscalationResult, SeverityTier,
};

// ── Urgency bands ───────────────────────────────────────────────────

pub const URGENCY_IMMEDIATE: u8 = 5;
pub const URGENCY_URGENT: u8 = 4;
pub const URGENCY_PROMPT: u8 = 3;
pub const URGENCY_ROUTINE: u8 = 2;
pub const URGENCY_INFORMATIONAL: u8 = 1;

pub const SUMMARY_IMMEDIATE: &str =
    "This may be a medical emergency. Call emergency services now or go to the nearest emergency room.";
pub const SUMMARY_URGENT: &str =
    "Your symptoms need prompt attention. Visit urgent care or start a telehealth consultation today.";
pub const SUMMARY_PROMPT: &str =
    "We recommend seeing a doctor soon. You can book an appointment below.";
pub const SUMMARY_ROUTINE: &str =
    "Your symptoms can likely be managed at home. Review the guidance below and monitor how you feel.";
pub const SUMMARY_INFORMATIONAL: &str =
    "Here is some general health information. Reach out if anything changes.";

/// Summary message for the highest urgency present.
pub fn summary_for(max_urgency: u8) -> &'static str {
    if max_urgency >= URGENCY_IMMEDIATE {
        SUMMARY_IMMEDIATE
    } else if max_urgency >= URGENCY_URGENT {
        SUMMARY_URGENT
    } else if max_urgency >= URGENCY_PROMPT {
        SUMMARY_PROMPT
    } else if max_urgency >= URGENCY_ROUTINE {
        SUMMARY_ROUTINE
    } else {
        SUMMARY_INFORMATIONAL
    }
}

// ── Trigger categories ──────────────────────────────────────────────

/// Closed set of trigger buckets, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerCategory {
    Emergency,
    HighSeverity,
    Medication,
    Booking,
    SelfCare,
}

impl TriggerCategory {
    pub const ALL: [TriggerCategory; 5] = [
        TriggerCategory::Emergency,
        TriggerCategory::HighSeverity,
        TriggerCategory::Medication,
        TriggerCategory::Booking,
        TriggerCategory::SelfCare,
    ];

    /// Taxonomy tier whose phrases also fire this category.
    ///
    /// Keeps the action list in step with severity: every phrase that scores
    /// IMMEDIATE yields the emergency action, and every CRITICAL phrase yields
    /// urgent care.
    pub fn severity_tier(self) -> Option<SeverityTier> {
        match self {
            TriggerCategory::Emergency => Some(SeverityTier::Immediate),
            TriggerCategory::HighSeverity => Some(SeverityTier::Critical),
            _ => None,
        }
    }

    /// Built-in phrases for this category, tier phrases first.
    fn default_phrases(self) -> impl Iterator<Item = &'static str> {
        let shared = self.severity_tier().map(builtin_phrases).unwrap_or_default();
        shared.iter().chain(self.own_phrases()).copied()
    }

    fn own_phrases(self) -> &'static [&'static str] {
        match self {
            TriggerCategory::Emergency => &["emergency", "911"],
            TriggerCategory::HighSeverity => &[
                "severe",
                "intense pain",
                "getting worse",
                "worsening",
            ],
            TriggerCategory::Medication => &[
                "medication",
                "medicine",
                "prescription",
                "pills",
                "dose",
                "dosage",
                "refill",
                "pharmacy",
            ],
            TriggerCategory::Booking => &[
                "appointment",
                "book",
                "check-up",
                "checkup",
                "see a doctor",
                "schedule",
                "consultation",
                "specialist",
            ],
            TriggerCategory::SelfCare => &[
                "mild",
                "cold",
                "runny nose",
                "sore throat",
                "tired",
                "stress",
                "sleep",
                "headache",
            ],
        }
    }

    fn templates(self) -> &'static [ActionTemplate] {
        match self {
            TriggerCategory::Emergency => &[EMERGENCY_CALL],
            TriggerCategory::HighSeverity => &[URGENT_CARE, TELEHEALTH],
            TriggerCategory::Medication => &[PHARMACY, MEDICATION_GUIDE],
            TriggerCategory::Booking => &[BOOK_DOCTOR, SPECIALIST],
            TriggerCategory::SelfCare => &[SELF_CARE, WELLNESS],
        }
    }
}

// ── Action templates ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum TemplateKind {
    Dial(&'static str),
    OpenMap(&'static str),
    NavigateBooking(&'static str),
    ShowGuide(&'static str),
}

/// Static description of an action; instantiated per resolution.
#[derive(Debug)]
struct ActionTemplate {
    id: &'static str,
    category: ActionCategory,
    title: &'static str,
    description: &'static str,
    urgency: u8,
    contact_handle: Option<&'static str>,
    requires_auth: bool,
    kind: TemplateKind,
}

impl ActionTemplate {
    fn instantiate(&self) -> EscalationAction {
        let action = match self.kind {
            TemplateKind::Dial(number) => ActionKind::Dial {
                number: number.to_string(),
            },
            TemplateKind::OpenMap(query) => ActionKind::OpenMap {
                query: query.to_string(),
            },
            TemplateKind::NavigateBooking(route) => ActionKind::NavigateBooking {
                route: route.to_string(),
            },
            TemplateKind::ShowGuide(topic) => ActionKind::ShowGuide {
                topic: topic.to_string(),
            },
        };
        EscalationAction {
            id: self.id.to_string(),
            category: self.category,
            title: self.title.to_string(),
            description: self.description.to_string(),
            urgency: self.urgency,
            contact_handle: self.contact_handle.map(String::from),
            requires_auth: self.requires_auth,
            action,
        }
    }
}

const EMERGENCY_CALL: ActionTemplate = ActionTemplate {
    id: "emergency-call",
    category: ActionCategory::Emergency,
    title: "Call Emergency Services",
    description: "Call 911 now for immediate medical help.",
    urgency: URGENCY_IMMEDIATE,
    contact_handle: Some("tel:911"),
    requires_auth: false,
    kind: TemplateKind::Dial("911"),
};

const URGENT_CARE: ActionTemplate = ActionTemplate {
    id: "urgent-care",
    category: ActionCategory::HighSeverity,
    title: "Find Urgent Care",
    description: "Locate the nearest urgent care center.",
    urgency: URGENCY_URGENT,
    contact_handle: Some("https://maps.google.com/?q=urgent+care+near+me"),
    requires_auth: false,
    kind: TemplateKind::OpenMap("urgent care near me"),
};

const TELEHEALTH: ActionTemplate = ActionTemplate {
    id: "telehealth",
    category: ActionCategory::HighSeverity,
    title: "Start Telehealth Consultation",
    description: "Speak with a doctor by video within minutes.",
    urgency: URGENCY_URGENT,
    contact_handle: None,
    requires_auth: true,
    kind: TemplateKind::NavigateBooking("telehealth"),
};

const PHARMACY: ActionTemplate = ActionTemplate {
    id: "pharmacy",
    category: ActionCategory::Recommendation,
    title: "Find a Pharmacy",
    description: "Locate a pharmacy nearby for prescriptions and advice.",
    urgency: URGENCY_ROUTINE,
    contact_handle: Some("https://maps.google.com/?q=pharmacy+near+me"),
    requires_auth: false,
    kind: TemplateKind::OpenMap("pharmacy near me"),
};

const MEDICATION_GUIDE: ActionTemplate = ActionTemplate {
    id: "medication-guide",
    category: ActionCategory::Recommendation,
    title: "Medication Guide",
    description: "Read guidance on dosage, timing, and side effects.",
    urgency: URGENCY_ROUTINE,
    contact_handle: None,
    requires_auth: false,
    kind: TemplateKind::ShowGuide("medication"),
};

const BOOK_DOCTOR: ActionTemplate = ActionTemplate {
    id: "book-doctor",
    category: ActionCategory::Recommendation,
    title: "Book a Doctor",
    description: "Schedule an appointment with a general practitioner.",
    urgency: URGENCY_PROMPT,
    contact_handle: None,
    requires_auth: true,
    kind: TemplateKind::NavigateBooking("doctor"),
};

const SPECIALIST: ActionTemplate = ActionTemplate {
    id: "specialist",
    category: ActionCategory::Recommendation,
    title: "See a Specialist",
    description: "Request a referral to a specialist.",
    urgency: URGENCY_PROMPT,
    contact_handle: None,
    requires_auth: true,
    kind: TemplateKind::NavigateBooking("specialist"),
};

const SELF_CARE: ActionTemplate = ActionTemplate {
    id: "self-care",
    category: ActionCategory::SelfCare,
    title: "Self-Care Tips",
    description: "Home care steps for managing mild symptoms.",
    urgency: URGENCY_ROUTINE,
    contact_handle: None,
    requires_auth: false,
    kind: TemplateKind::ShowGuide("self-care"),
};

const WELLNESS: ActionTemplate = ActionTemplate {
    id: "wellness",
    category: ActionCategory::SelfCare,
    title: "Wellness Resources",
    description: "Sleep, stress, and nutrition resources.",
    urgency: URGENCY_INFORMATIONAL,
    contact_handle: None,
    requires_auth: false,
    kind: TemplateKind::ShowGuide("wellness"),
};

const HEALTH_INFO: ActionTemplate = ActionTemplate {
    id: "health-info",
    category: ActionCategory::Info,
    title: "Health Information",
    description: "Browse general health information and FAQs.",
    urgency: URGENCY_INFORMATIONAL,
    contact_handle: None,
    requires_auth: false,
    kind: TemplateKind::ShowGuide("health-info"),
};

/// Deduplicate by id (first occurrence wins), stably sort by urgency
/// descending, and attach the summary for the highest urgency.
fn finalize(candidates: impl IntoIterator<Item = EscalationAction>) -> EscalationResult {
    let mut seen = HashSet::new();
    let mut actions: Vec<EscalationAction> = candidates
        .into_iter()
        .filter(|action| seen.insert(action.id.clone()))
        .collect();

    // Stable: equal urgencies keep category scan order.
    actions.sort_by(|a, b| b.urgency.cmp(&a.urgency));

    let max_urgency = actions
        .iter()
        .map(|a| a.urgency)
        .max()
        .unwrap_or(URGENCY_INFORMATIONAL);

    EscalationResult {
        actions,
        summary_message: summary_for(max_urgency).to_string(),
    }
}

// ── Resolver ────────────────────────────────────────────────────────

/// A trigger phrase list for one category.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    pub category: TriggerCategory,
    /// Lowercase phrases; any substring match fires the category.
    pub phrases: Vec<String>,
}

/// Maps a message to a deduplicated, priority-ordered action list.
#[derive(Debug, Clone)]
pub struct EscalationRuleResolver {
    /// One rule per category, in `TriggerCategory::ALL` order.
    rules: Vec<TriggerRule>,
}

impl EscalationRuleResolver {
    /// Resolver with the default trigger phrases.
    pub fn default_rules() -> Self {
        let rules = TriggerCategory::ALL
            .into_iter()
            .map(|category| TriggerRule {
                category,
                phrases: category.default_phrases().map(String::from).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Default rules plus the emergency and urgent-care phrases of
    /// `taxonomy`, so a replacement table cannot leave a top-tier phrase
    /// without a matching action.
    pub fn for_taxonomy(taxonomy: &KeywordTaxonomy) -> Self {
        let mut resolver = Self::default_rules();
        for category in TriggerCategory::ALL {
            if let Some(tier) = category.severity_tier() {
                for phrase in taxonomy.phrases(tier) {
                    resolver.add_trigger(category, phrase);
                }
            }
        }
        resolver
    }

    /// Resolver with no trigger phrases (only the info action ever fires).
    pub fn empty() -> Self {
        let rules = TriggerCategory::ALL
            .into_iter()
            .map(|category| TriggerRule {
                category,
                phrases: Vec::new(),
            })
            .collect();
        Self { rules }
    }

    /// Add a trigger phrase to a category.
    pub fn add_trigger(&mut self, category: TriggerCategory, phrase: &str) {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return;
        }
        if let Some(rule) = self.rules.iter_mut().find(|r| r.category == category) {
            if !rule.phrases.contains(&phrase) {
                rule.phrases.push(phrase);
            }
        }
    }

    /// Categories whose phrases appear in the message, in scan order.
    pub fn triggered(&self, message: &str) -> Vec<TriggerCategory> {
        let normalized = message.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| {
                rule.phrases
                    .iter()
                    .any(|phrase| normalized.contains(phrase.as_str()))
            })
            .map(|rule| rule.category)
            .collect()
    }

    /// Resolve the actions for one message.
    pub fn resolve(&self, message: &str) -> EscalationResult {
        let triggered = self.triggered(message);

        let candidates = triggered
            .iter()
            .flat_map(|category| category.templates())
            .chain(std::iter::once(&HEALTH_INFO))
            .map(ActionTemplate::instantiate);

        let result = finalize(candidates);
        debug!(
            triggered = ?triggered,
            actions = result.actions.len(),
            max_urgency = result.max_urgency(),
            "Resolved escalation actions"
        );
        result
    }

    /// The result used when no usable message is available: info only.
    pub fn fallback() -> EscalationResult {
        EscalationResult {
            actions: vec![HEALTH_INFO.instantiate()],
            summary_message: summary_for(URGENCY_INFORMATIONAL).to_string(),
        }
    }
}
