//! Intent classification for the deterministic reply path.
//!
//! Pure keyword matching, no model required. Categories are tried in a fixed
//! priority order and the first hit wins, so specific or safety-relevant
//! intents are never shadowed by generic words further down the list.

use serde::Serialize;
use std::fmt;

use crate::models::SupplementRecord;

/// Detected intent of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<'a> {
    /// hello, hi, hey, good morning, good evening
    Greeting,
    /// Names one of the user's own supplements; the first match in regimen order is bound.
    SupplementMention(&'a SupplementRecord),
    /// interaction, interact
    Interaction,
    /// side effect, adverse
    SideEffect,
    /// dose, dosage, how much, amount
    Dosage,
    /// when, time, timing, schedule
    Timing,
    /// age, older, senior, or the user's age as a number
    AgeRelated,
    /// health, benefit, good for, help with
    GeneralHealth,
    /// Nothing matched
    Default,
}

/// Intent without the bound supplement, for logging and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    SupplementMention,
    Interaction,
    SideEffect,
    Dosage,
    Timing,
    AgeRelated,
    GeneralHealth,
    Default,
}

impl IntentKind {
    pub fn label(&self) -> &'static str {
        match self {
            IntentKind::Greeting => "greeting",
            IntentKind::SupplementMention => "supplement_mention",
            IntentKind::Interaction => "interaction",
            IntentKind::SideEffect => "side_effect",
            IntentKind::Dosage => "dosage",
            IntentKind::Timing => "timing",
            IntentKind::AgeRelated => "age_related",
            IntentKind::GeneralHealth => "general_health",
            IntentKind::Default => "default",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Intent<'_> {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Greeting => IntentKind::Greeting,
            Intent::SupplementMention(_) => IntentKind::SupplementMention,
            Intent::Interaction => IntentKind::Interaction,
            Intent::SideEffect => IntentKind::SideEffect,
            Intent::Dosage => IntentKind::Dosage,
            Intent::Timing => IntentKind::Timing,
            Intent::AgeRelated => IntentKind::AgeRelated,
            Intent::GeneralHealth => IntentKind::GeneralHealth,
            Intent::Default => IntentKind::Default,
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind().label()
    }
}

// Plain substring matching throughout: "hi" also fires on "this".
const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey", "good morning", "good evening"];
const INTERACTION_KEYWORDS: &[&str] = &["interaction", "interact"];
const SIDE_EFFECT_KEYWORDS: &[&str] = &["side effect", "adverse"];
const DOSAGE_KEYWORDS: &[&str] = &["dose", "dosage", "how much", "amount"];
const TIMING_KEYWORDS: &[&str] = &["when", "time", "timing", "schedule"];
const AGE_KEYWORDS: &[&str] = &["age", "older", "senior"];
const GENERAL_HEALTH_KEYWORDS: &[&str] = &["health", "benefit", "good for", "help with"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Rule-based classifier. Stateless; one instance can serve every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `message` against the user's regimen and age.
    pub fn classify<'a>(
        &self,
        message: &str,
        supplements: &'a [SupplementRecord],
        user_age: u32,
    ) -> Intent<'a> {
        let text = message.to_lowercase();

        if contains_any(&text, GREETING_KEYWORDS) {
            return Intent::Greeting;
        }

        if let Some(record) = mentioned_supplement(&text, supplements) {
            return Intent::SupplementMention(record);
        }

        if contains_any(&text, INTERACTION_KEYWORDS) {
            return Intent::Interaction;
        }
        if contains_any(&text, SIDE_EFFECT_KEYWORDS) {
            return Intent::SideEffect;
        }
        if contains_any(&text, DOSAGE_KEYWORDS) {
            return Intent::Dosage;
        }
        if contains_any(&text, TIMING_KEYWORDS) {
            return Intent::Timing;
        }
        if contains_any(&text, AGE_KEYWORDS) || text.contains(&user_age.to_string()) {
            return Intent::AgeRelated;
        }
        if contains_any(&text, GENERAL_HEALTH_KEYWORDS) {
            return Intent::GeneralHealth;
        }

        Intent::Default
    }
}

/// First supplement, in regimen order, whose name appears in the lower-cased text.
fn mentioned_supplement<'a>(
    text: &str,
    supplements: &'a [SupplementRecord],
) -> Option<&'a SupplementRecord> {
    supplements.iter().find(|s| {
        let name = s.name.trim().to_lowercase();
        !name.is_empty() && text.contains(&name)
    })
}
