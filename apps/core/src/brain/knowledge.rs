//! Static supplement knowledge base.
//!
//! Built once on first use and only ever read afterwards, so concurrent
//! lookups need no locking. Entries keep declaration order, which is the
//! order partial-name matching walks them in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Age bucket driving which advisory text is shown.
///
/// Lower bounds are inclusive: 40 is already `Forties`, 50 is `FiftyPlus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "general")]
    General,
    #[serde(rename = "40_50")]
    Forties,
    #[serde(rename = "50_plus")]
    FiftyPlus,
}

impl AgeBand {
    pub fn from_age(age: u32) -> Self {
        if age >= 50 {
            AgeBand::FiftyPlus
        } else if age >= 40 {
            AgeBand::Forties
        } else {
            AgeBand::General
        }
    }

    /// Key used for per-supplement age notes; the general band has none.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            AgeBand::General => None,
            AgeBand::Forties => Some("40_50"),
            AgeBand::FiftyPlus => Some("50_plus"),
        }
    }

    /// Canned advisory paragraph for the band, one bullet per line.
    pub fn advisory(&self) -> &'static str {
        match self {
            AgeBand::FiftyPlus => {
                "- Increased focus on cardiovascular and cognitive health\n\
                 - Enhanced need for Vitamin D, B12, and Omega-3\n\
                 - Important to monitor kidney and liver function\n\
                 - Consider bone density and joint health supplements\n\
                 - Regular screening for age-related conditions recommended"
            }
            AgeBand::Forties => {
                "- Preventive focus on heart health and bone density\n\
                 - Metabolism changes may affect supplement absorption\n\
                 - Hormone balance becomes increasingly important\n\
                 - Regular health screenings recommended\n\
                 - Stress management and sleep quality crucial"
            }
            AgeBand::General => {
                "- Focus on establishing healthy supplement routines\n\
                 - Building a strong foundation for long-term health\n\
                 - Emphasis on an active lifestyle and balanced nutrition"
            }
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().unwrap_or("general"))
    }
}

/// What the assistant knows about one supplement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    pub benefits: Vec<&'static str>,
    pub side_effects: Vec<&'static str>,
    pub interactions: Vec<&'static str>,
    pub timing: &'static str,
    pub age_notes: BTreeMap<AgeBand, &'static str>,
}

impl KnowledgeEntry {
    /// Age note for a user of `age`, if the entry has one for that band.
    pub fn age_note(&self, age: u32) -> Option<&'static str> {
        self.age_notes.get(&AgeBand::from_age(age)).copied()
    }
}

/// Owned, serializable answer for a supplement-info request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementInfo {
    pub supplement: String,
    pub matched_key: Option<String>,
    pub benefits: Vec<String>,
    pub side_effects: Vec<String>,
    pub interactions: Vec<String>,
    pub timing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_specific: Option<String>,
}

pub struct KnowledgeBase {
    entries: Vec<(&'static str, KnowledgeEntry)>,
    placeholder: KnowledgeEntry,
}

static KNOWLEDGE_BASE: LazyLock<KnowledgeBase> = LazyLock::new(KnowledgeBase::builtin);

/// Lower-case, with whitespace and hyphens turned into underscores.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '-' {
                '_'
            } else {
                c
            }
        })
        .flat_map(char::to_lowercase)
        .collect()
}

fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split('_').filter(|t| !t.is_empty())
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn entry(
    benefits: &[&'static str],
    side_effects: &[&'static str],
    interactions: &[&'static str],
    timing: &'static str,
    forties: &'static str,
    fifty_plus: &'static str,
) -> KnowledgeEntry {
    KnowledgeEntry {
        benefits: benefits.to_vec(),
        side_effects: side_effects.to_vec(),
        interactions: interactions.to_vec(),
        timing,
        age_notes: BTreeMap::from([(AgeBand::Forties, forties), (AgeBand::FiftyPlus, fifty_plus)]),
    }
}

impl KnowledgeBase {
    /// The process-wide table.
    pub fn global() -> &'static KnowledgeBase {
        &KNOWLEDGE_BASE
    }

    fn builtin() -> Self {
        let entries = vec![
            (
                "vitamin_d3",
                entry(
                    &["Bone health", "Immune support", "Calcium absorption", "Mood regulation"],
                    &["Nausea at high doses", "Kidney stones (rare)", "Hypercalcemia"],
                    &["Enhanced by magnesium", "Avoid with thiazide diuretics"],
                    "Best with fat-containing meals",
                    "Increased importance for bone health and immune function",
                    "Key for bone density and fall prevention; levels are worth checking yearly",
                ),
            ),
            (
                "omega_3",
                entry(
                    &["Heart health", "Brain function", "Anti-inflammatory", "Eye health"],
                    &["Fishy aftertaste", "Digestive upset", "Increased bleeding risk"],
                    &["May enhance blood thinners", "Avoid before surgery"],
                    "With meals to reduce side effects",
                    "Critical for cardiovascular and cognitive health",
                    "Supports heart rhythm and memory; discuss with your doctor if you take blood thinners",
                ),
            ),
            (
                "magnesium",
                entry(
                    &["Muscle function", "Sleep quality", "Bone health", "Heart rhythm"],
                    &["Diarrhea at high doses", "Digestive upset"],
                    &["Affects antibiotic absorption", "Enhances calcium"],
                    "Evening preferred for sleep benefits",
                    "Important for muscle and bone health maintenance",
                    "Helps with muscle cramps and sleep; kidney function affects how much is cleared",
                ),
            ),
            (
                "vitamin_c",
                entry(
                    &["Immune support", "Antioxidant", "Collagen synthesis", "Iron absorption"],
                    &["Digestive upset at high doses", "Kidney stones (rare)"],
                    &["Enhances iron absorption", "May affect some medications"],
                    "Flexible, water-soluble",
                    "Enhanced antioxidant needs with aging",
                    "Supports skin and immune health as natural defences slow down",
                ),
            ),
            (
                "probiotics",
                entry(
                    &["Digestive health", "Immune support", "Gut microbiome", "Mental health"],
                    &["Initial digestive changes", "Rare allergic reactions"],
                    &["Take away from antibiotics", "May affect immune medications"],
                    "With or after meals for survival",
                    "Gut health becomes increasingly important",
                    "Gut flora diversity declines with age; consistency matters more than dose",
                ),
            ),
            (
                "melatonin",
                entry(
                    &["Sleep regulation", "Circadian rhythm", "Antioxidant properties"],
                    &["Drowsiness", "Headache", "Vivid dreams", "Hormonal effects"],
                    &["Blood thinners", "Diabetes medications", "Immunosuppressants"],
                    "30-60 minutes before bedtime",
                    "Natural melatonin production decreases with age",
                    "Lower doses are often enough; start low and review with your doctor",
                ),
            ),
        ];

        Self {
            entries,
            placeholder: KnowledgeEntry {
                benefits: vec!["Consult healthcare provider for specific benefits"],
                side_effects: vec!["Monitor for any unusual symptoms"],
                interactions: vec!["Check with pharmacist for drug interactions"],
                timing: "Follow package instructions or healthcare provider guidance",
                age_notes: BTreeMap::new(),
            },
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// Matching entry and its key, or `None` when nothing matches.
    ///
    /// Single pass in declaration order: the first entry whose key equals the
    /// name, or shares any underscore-separated token with it, matches.
    /// An exact key declared later loses to an earlier token overlap.
    pub fn find(&self, raw_name: &str) -> Option<(&'static str, &KnowledgeEntry)> {
        let name = normalize_name(raw_name);
        if name.is_empty() {
            return None;
        }

        let name_tokens: Vec<&str> = tokens(&name).collect();
        self.entries
            .iter()
            .find(|(key, _)| *key == name || tokens(key).any(|t| name_tokens.contains(&t)))
            .map(|(key, entry)| (*key, entry))
    }

    /// Entry for `raw_name`, or the generic entry pointing at a professional.
    pub fn lookup(&self, raw_name: &str) -> &KnowledgeEntry {
        self.find(raw_name)
            .map(|(_, entry)| entry)
            .unwrap_or(&self.placeholder)
    }

    pub fn supplement_info(&self, raw_name: &str, age: u32) -> SupplementInfo {
        let (matched_key, entry) = match self.find(raw_name) {
            Some((key, entry)) => (Some(key.to_string()), entry),
            None => (None, &self.placeholder),
        };
        SupplementInfo {
            supplement: raw_name.to_string(),
            matched_key,
            benefits: owned(&entry.benefits),
            side_effects: owned(&entry.side_effects),
            interactions: owned(&entry.interactions),
            timing: entry.timing.to_string(),
            age_specific: entry.age_note(age).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_band_boundaries() {
        assert_eq!(AgeBand::from_age(0), AgeBand::General);
        assert_eq!(AgeBand::from_age(39), AgeBand::General);
        assert_eq!(AgeBand::from_age(40), AgeBand::Forties);
        assert_eq!(AgeBand::from_age(49), AgeBand::Forties);
        assert_eq!(AgeBand::from_age(50), AgeBand::FiftyPlus);
        assert_eq!(AgeBand::from_age(120), AgeBand::FiftyPlus);
    }

    #[test]
    fn test_band_keys() {
        assert_eq!(AgeBand::General.key(), None);
        assert_eq!(AgeBand::Forties.key(), Some("40_50"));
        assert_eq!(AgeBand::FiftyPlus.key(), Some("50_plus"));
        assert_eq!(AgeBand::General.to_string(), "general");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Vitamin D3"), "vitamin_d3");
        assert_eq!(normalize_name("vitamin-d3"), "vitamin_d3");
        assert_eq!(normalize_name("VITAMIN_D3"), "vitamin_d3");
        assert_eq!(normalize_name("  Omega-3 "), "omega_3");
    }

    #[test]
    fn test_lookup_is_case_and_punctuation_insensitive() {
        let kb = KnowledgeBase::global();
        let a = kb.find("Vitamin D3").unwrap();
        let b = kb.find("vitamin-d3").unwrap();
        let c = kb.find("VITAMIN_D3").unwrap();
        assert_eq!(a.0, "vitamin_d3");
        assert_eq!(a.0, b.0);
        assert_eq!(b.0, c.0);
    }

    #[test]
    fn test_earlier_token_overlap_beats_later_exact_key() {
        // "vitamin" is also a token of vitamin_d3, declared before vitamin_c.
        let kb = KnowledgeBase::global();
        assert_eq!(kb.find("Vitamin C").unwrap().0, "vitamin_d3");
        assert_eq!(kb.lookup("Vitamin C"), kb.lookup("Vitamin D3"));
        assert_eq!(kb.find("melatonin").unwrap().0, "melatonin");
    }

    #[test]
    fn test_token_overlap_takes_first_in_order() {
        let kb = KnowledgeBase::global();
        assert_eq!(kb.find("Nordic Omega Fish Oil").unwrap().0, "omega_3");
        assert_eq!(kb.find("Magnesium Glycinate").unwrap().0, "magnesium");
        // No ranking: the first entry with a shared token wins.
        assert_eq!(kb.find("Vitamin B12").unwrap().0, "vitamin_d3");
    }

    #[test]
    fn test_unknown_supplement_gets_placeholder() {
        let kb = KnowledgeBase::global();
        assert!(kb.find("Ashwagandha").is_none());
        assert!(kb.find("").is_none());

        let entry = kb.lookup("Ashwagandha");
        assert!(!entry.benefits.is_empty());
        assert!(entry.benefits[0].contains("healthcare provider"));
        assert!(entry.age_note(60).is_none());
    }

    #[test]
    fn test_age_note_by_band() {
        let entry = KnowledgeBase::global().lookup("melatonin");
        assert!(entry.age_note(30).is_none());
        assert_eq!(
            entry.age_note(45),
            Some("Natural melatonin production decreases with age")
        );
        assert!(entry.age_note(50).is_some());
        assert_ne!(entry.age_note(50), entry.age_note(45));
    }

    #[test]
    fn test_supplement_info() {
        let info = KnowledgeBase::global().supplement_info("Omega-3", 52);
        assert_eq!(info.matched_key.as_deref(), Some("omega_3"));
        assert_eq!(info.benefits.len(), 4);
        assert_eq!(info.timing, "With meals to reduce side effects");
        assert!(info.age_specific.is_some());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["supplement"], "Omega-3");

        let young = KnowledgeBase::global().supplement_info("Omega-3", 25);
        assert!(young.age_specific.is_none());
        let json = serde_json::to_value(&young).unwrap();
        assert!(json.get("age_specific").is_none());
    }

    #[test]
    fn test_lookup_never_mutates() {
        let kb = KnowledgeBase::global();
        let before: Vec<_> = kb.keys().collect();
        let _ = kb.lookup("Something New");
        let _ = kb.supplement_info("Another One", 70);
        let after: Vec<_> = kb.keys().collect();
        assert_eq!(before, after);
    }
}
