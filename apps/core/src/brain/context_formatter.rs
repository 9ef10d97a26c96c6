//! Context block and full prompt for the generative model.
//!
//! Pure functions of their inputs: the caller supplies the clock reading, so
//! identical inputs always render identical text.

use chrono::{DateTime, FixedOffset};

use super::knowledge::AgeBand;
use crate::models::{ChatTurn, SupplementRecord, UserProfile};

const SAFETY_PREAMBLE: &str = "\
You are SafeDoser Assistant, an AI specializing in medications, supplements, and health guidance.

CRITICAL SAFETY GUIDELINES:
1. ALWAYS prioritize user safety - recommend consulting healthcare providers for serious concerns
2. Provide evidence-based information from reliable medical sources
3. Never diagnose conditions - only provide educational information
4. Always mention consulting healthcare providers for personalized medical advice
5. Be aware of drug interactions, contraindications, and side effects
6. Consider age-specific factors and individual health contexts";

const RESPONSE_GUIDELINES: &str = "\
RESPONSE GUIDELINES:
- Be empathetic, professional, and reassuring
- Provide actionable, evidence-based advice
- Ask clarifying questions when needed
- Reference the user's current supplement regimen when relevant
- Always emphasize the importance of healthcare provider consultation
- Consider age-related factors in all recommendations";

pub const NO_SUPPLEMENTS: &str = "No supplements currently tracked";

/// Shown in place of a time for records with no scheduled dose.
pub const UNSCHEDULED: &str = "not scheduled";

/// One line per scheduled dose: `• name at HH:MM (form) - status - mute | Tags: .. | Alerts: n`.
/// A record without any time still gets one line, `at not scheduled`.
pub fn format_supplements(supplements: &[SupplementRecord]) -> String {
    if supplements.is_empty() {
        return NO_SUPPLEMENTS.to_string();
    }

    let mut lines = Vec::new();
    for supplement in supplements {
        let times: Vec<&str> = supplement.scheduled_times().collect();
        if times.is_empty() {
            lines.push(supplement_line(supplement, UNSCHEDULED));
        }
        lines.extend(times.into_iter().map(|time| supplement_line(supplement, time)));
    }
    lines.join("\n")
}

fn supplement_line(supplement: &SupplementRecord, time: &str) -> String {
    let status = if supplement.completed {
        "✅ Completed"
    } else {
        "⏳ Pending"
    };
    let muted = if supplement.is_muted() {
        "🔇 Muted"
    } else {
        "🔔 Active"
    };
    let tags = if supplement.tags.is_empty() {
        "none".to_string()
    } else {
        supplement.tags.join(", ")
    };

    let mut line = format!(
        "• {} at {} ({}) - {} - {} | Tags: {}",
        supplement.name,
        time,
        supplement.form_label(),
        status,
        muted,
        tags
    );
    if !supplement.alerts.is_empty() {
        line.push_str(&format!(" | Alerts: {}", supplement.alerts.len()));
    }
    line
}

/// Safety preamble, user context, regimen and the age-band advisory.
pub fn format_context(
    user: &UserProfile,
    supplements: &[SupplementRecord],
    now: DateTime<FixedOffset>,
) -> String {
    let band = AgeBand::from_age(user.age);

    format!(
        "{preamble}\n\n\
         USER CONTEXT:\n\
         - Name: {name}\n\
         - Age: {age} years old\n\
         - Current Time: {time}\n\
         - Number of Supplements: {count}\n\n\
         CURRENT SUPPLEMENT REGIMEN:\n\
         {regimen}\n\n\
         {guidelines}\n\n\
         AGE-SPECIFIC CONSIDERATIONS FOR {age} YEARS OLD:\n\
         {advisory}",
        preamble = SAFETY_PREAMBLE,
        name = user.name,
        age = user.age,
        time = now.format("%Y-%m-%d %H:%M"),
        count = supplements.len(),
        regimen = format_supplements(supplements),
        guidelines = RESPONSE_GUIDELINES,
        advisory = band.advisory(),
    )
}

/// Renders the last `window` turns as `SENDER: text`, oldest first.
pub fn format_history(history: &[ChatTurn], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.sender.as_str().to_uppercase(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full prompt sent to the model.
pub fn build_prompt(
    context_block: &str,
    history: &[ChatTurn],
    message: &str,
    window: usize,
    user_age: u32,
) -> String {
    format!(
        "{context}\n\n\
         RECENT CONVERSATION HISTORY:\n\
         {history}\n\n\
         USER MESSAGE: {message}\n\n\
         Please provide a helpful response considering the user's context, age ({age}), \
         and current supplement regimen. Always prioritize safety and recommend consulting \
         healthcare providers when appropriate.",
        context = context_block,
        history = format_history(history, window),
        message = message,
        age = user_age,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Period, SupplementAlert};
    use chrono::TimeZone;

    fn jane() -> UserProfile {
        UserProfile {
            id: "u-1".to_string(),
            name: "Jane".to_string(),
            age: 52,
            email: None,
        }
    }

    fn nine_am() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_supplement_line_format() {
        let mut omega = SupplementRecord::new("Omega-3", Period::Morning, "09:00")
            .with_dosage_form("softgel")
            .with_tags(["heart", "brain"]);
        omega.alerts.push(SupplementAlert {
            message: "Take with food".to_string(),
            kind: "info".to_string(),
        });
        omega.remind_me = false;

        assert_eq!(
            format_supplements(&[omega]),
            "• Omega-3 at 09:00 (softgel) - ⏳ Pending - 🔇 Muted | Tags: heart, brain | Alerts: 1"
        );
    }

    #[test]
    fn test_one_line_per_scheduled_time() {
        let mut magnesium =
            SupplementRecord::new("Magnesium", Period::Evening, "21:00").completed(true);
        magnesium
            .times_of_day
            .insert(Period::Morning, vec!["08:00".to_string()]);

        let rendered = format_supplements(&[magnesium]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("at 08:00 (default) - ✅ Completed - 🔔 Active"));
        assert!(lines[1].contains("at 21:00"));
        assert!(!rendered.contains("Alerts"));
    }

    #[test]
    fn test_empty_regimen() {
        assert_eq!(format_supplements(&[]), NO_SUPPLEMENTS);
    }

    #[test]
    fn test_unscheduled_record_keeps_its_line() {
        let mut zinc = SupplementRecord::new("Zinc", Period::Morning, "08:00").with_dosage_form("tablet");
        zinc.times_of_day.clear();
        let mut iron = SupplementRecord::new("Iron", Period::Evening, "20:00");
        iron.times_of_day.insert(Period::Evening, Vec::new());
        let omega = SupplementRecord::new("Omega-3", Period::Morning, "09:00");

        let block = format_supplements(&[zinc, omega, iron]);
        let lines: Vec<&str> = block.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("• Zinc at not scheduled (tablet) - ⏳ Pending"));
        assert!(lines[1].starts_with("• Omega-3 at 09:00"));
        assert!(lines[2].starts_with("• Iron at not scheduled (default)"));
        assert!(!block.contains(NO_SUPPLEMENTS));
    }

    #[test]
    fn test_context_block_contents() {
        let supplements = vec![SupplementRecord::new("Omega-3", Period::Morning, "09:00")];
        let block = format_context(&jane(), &supplements, nine_am());

        assert!(block.starts_with("You are SafeDoser Assistant"));
        assert!(block.contains("Never diagnose conditions"));
        assert!(block.contains("- Name: Jane"));
        assert!(block.contains("- Age: 52 years old"));
        assert!(block.contains("- Current Time: 2024-05-01 09:00"));
        assert!(block.contains("- Number of Supplements: 1"));
        assert!(block.contains("• Omega-3 at 09:00"));
        assert!(block.ends_with(AgeBand::FiftyPlus.advisory()));
    }

    #[test]
    fn test_context_is_deterministic() {
        let supplements = vec![SupplementRecord::new("Omega-3", Period::Morning, "09:00")];
        assert_eq!(
            format_context(&jane(), &supplements, nine_am()),
            format_context(&jane(), &supplements, nine_am())
        );
    }

    #[test]
    fn test_history_window_keeps_latest_turns_in_order() {
        let history: Vec<ChatTurn> = (1..=8)
            .map(|i| {
                if i % 2 == 1 {
                    ChatTurn::user(format!("question {}", i))
                } else {
                    ChatTurn::assistant(format!("answer {}", i))
                }
            })
            .collect();

        let rendered = format_history(&history, 6);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "USER: question 3");
        assert_eq!(lines[5], "ASSISTANT: answer 8");

        assert_eq!(format_history(&history[..2], 6).lines().count(), 2);
        assert!(format_history(&[], 6).is_empty());
    }

    #[test]
    fn test_build_prompt_layout() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("Hello Jane!")];
        let prompt = build_prompt("CONTEXT", &history, "when should I take it?", 6, 52);

        let history_at = prompt.find("RECENT CONVERSATION HISTORY:").unwrap();
        let message_at = prompt.find("USER MESSAGE: when should I take it?").unwrap();
        assert!(prompt.starts_with("CONTEXT"));
        assert!(history_at < message_at);
        assert!(prompt.contains("USER: hi\nASSISTANT: Hello Jane!"));
        assert!(prompt.contains("age (52)"));
        assert!(prompt.contains("consulting healthcare providers"));
    }
}
