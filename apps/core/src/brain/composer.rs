//! Deterministic replies, one template per intent.
//!
//! Used whenever the generative model is unavailable or fails. Every reply
//! names the user and points them at a healthcare professional.

use std::fmt::Write;

use super::context_formatter::UNSCHEDULED;
use super::intent::Intent;
use super::knowledge::{AgeBand, KnowledgeBase};
use crate::error::AppError;
use crate::models::{SupplementRecord, UserProfile};

const CONSULT_LINE: &str =
    "**Important:** I provide educational information only. Always consult your healthcare provider or pharmacist for personalized medical advice.";

const TIMING_TIPS: &str = "\
**Optimal Timing Tips:**
🌅 **Morning (6-10 AM):** Energy supplements, B vitamins, iron
🌞 **Midday (10 AM-2 PM):** Most vitamins, especially with lunch
🌆 **Evening (6-9 PM):** Relaxing supplements, magnesium
🌙 **Bedtime:** Melatonin, calcium (if not taken with other minerals)";

/// Builds fallback replies from the knowledge base and the caller's snapshot.
#[derive(Clone, Copy)]
pub struct FallbackComposer {
    knowledge: &'static KnowledgeBase,
}

impl Default for FallbackComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackComposer {
    pub fn new() -> Self {
        Self {
            knowledge: KnowledgeBase::global(),
        }
    }

    /// Reply for `intent`. Fails only on a formatting error or an empty result.
    pub fn compose(
        &self,
        intent: &Intent<'_>,
        user: &UserProfile,
        supplements: &[SupplementRecord],
    ) -> Result<String, AppError> {
        let mut out = String::new();

        match intent {
            Intent::Greeting => greeting(&mut out, user, supplements)?,
            Intent::SupplementMention(record) => self.mention(&mut out, user, record)?,
            Intent::Interaction => interaction(&mut out, user, supplements)?,
            Intent::SideEffect => side_effect(&mut out, user, supplements)?,
            Intent::Dosage => dosage(&mut out, user, supplements)?,
            Intent::Timing => timing(&mut out, user, supplements)?,
            Intent::AgeRelated => age_related(&mut out, user, supplements)?,
            Intent::GeneralHealth => general_health(&mut out, user, supplements)?,
            Intent::Default => capabilities(&mut out, user, supplements)?,
        }

        if out.trim().is_empty() {
            return Err(AppError::Composition(format!(
                "empty reply for intent '{}'",
                intent.label()
            )));
        }
        Ok(out)
    }

    fn mention(
        &self,
        out: &mut String,
        user: &UserProfile,
        record: &SupplementRecord,
    ) -> Result<(), AppError> {
        let entry = self.knowledge.lookup(&record.name);
        let status = if record.completed {
            "completed today ✅"
        } else {
            "pending ⏳"
        };
        let times: Vec<&str> = record.scheduled_times().collect();
        let schedule = if times.is_empty() {
            UNSCHEDULED.to_string()
        } else {
            times.join(", ")
        };
        let tags = if record.tags.is_empty() {
            "none".to_string()
        } else {
            record.tags.join(", ")
        };
        let benefits: Vec<&str> = entry.benefits.iter().take(3).copied().collect();

        writeln!(out, "Great question about {}, {}!", record.name, user.name)?;
        writeln!(out)?;
        writeln!(out, "**Your Current Schedule:** {} - Status: {}", schedule, status)?;
        writeln!(out, "**Type:** {} | **Tags:** {}", record.form_label(), tags)?;
        writeln!(out)?;
        writeln!(out, "**Key Benefits:** {}", benefits.join(", "))?;
        writeln!(out, "**Timing:** {}", entry.timing)?;
        writeln!(
            out,
            "**Age Consideration:** {}",
            entry
                .age_note(user.age)
                .unwrap_or("Beneficial for your age group")
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "**Important:** Always consult your healthcare provider for personalized advice, especially at {} years old.",
            user.age
        )?;
        writeln!(out)?;
        write!(
            out,
            "Is there something specific about {} you'd like to know more about? 💊",
            record.name
        )?;
        Ok(())
    }
}

fn greeting(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    writeln!(
        out,
        "Hello {}! 👋 I'm your SafeDoser assistant, here to help with your medication and supplement questions.",
        user.name
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "I can see you're currently managing {} supplements. At {} years old, maintaining a good supplement routine is excellent for your health!",
        supplements.len(),
        user.age
    )?;
    writeln!(out)?;
    writeln!(out, "How can I assist you today? I can help with:")?;
    writeln!(out, "💊 Supplement information and benefits")?;
    writeln!(out, "⏰ Timing and dosage guidance")?;
    writeln!(out, "🔄 Interaction questions")?;
    writeln!(out, "⚕️ General health questions")?;
    writeln!(out)?;
    write!(out, "{}", CONSULT_LINE)?;
    Ok(())
}

fn interaction(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    if supplements.is_empty() {
        write!(
            out,
            "{}, you don't have any supplements tracked yet. When you add them, your pharmacist or healthcare provider can review them for potential interactions! 🔍",
            user.name
        )?;
        return Ok(());
    }

    let names: Vec<&str> = supplements.iter().map(|s| s.name.as_str()).collect();
    writeln!(
        out,
        "Excellent question about interactions, {}! Interactions are crucial to monitor, especially at {}.",
        user.name, user.age
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "**Your Current Supplements ({}):** {}",
        supplements.len(),
        names.join(", ")
    )?;
    writeln!(out)?;
    writeln!(out, "**Key Interaction Guidelines:**")?;
    writeln!(out, "🔹 **Timing Separation:** Some supplements compete for absorption")?;
    writeln!(out, "🔹 **Food Interactions:** Some need food, others work better on an empty stomach")?;
    writeln!(out, "🔹 **Prescription Drugs:** Always check with your pharmacist")?;
    writeln!(
        out,
        "🔹 **Age Factor:** Metabolism changes at {} can affect interactions",
        user.age
    )?;
    writeln!(out)?;
    write!(
        out,
        "**Immediate Action:** Please consult your pharmacist or healthcare provider for a comprehensive interaction review. They have access to complete drug interaction databases. ⚕️"
    )?;
    Ok(())
}

fn side_effect(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    writeln!(
        out,
        "Side effects are an important consideration, {}, especially at {} years old.",
        user.name, user.age
    )?;
    writeln!(out)?;
    writeln!(out, "**General Monitoring Guidelines:**")?;
    writeln!(out, "⚠️ **Watch for:** Digestive upset, headaches, allergic reactions")?;
    writeln!(out, "🩺 **Age-Related:** Kidney and liver function are more important to monitor")?;
    writeln!(out, "📞 **When to Call Your Doctor:** Severe symptoms, persistent issues, new symptoms")?;
    writeln!(out)?;
    writeln!(
        out,
        "**Your Supplements:** I can share general side effect information for each of your {} supplements.",
        supplements.len()
    )?;
    writeln!(out)?;
    write!(
        out,
        "**Important:** If you're experiencing any concerning symptoms, contact your healthcare provider immediately. Never ignore potential side effects. 🔍"
    )?;
    Ok(())
}

fn dosage(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    writeln!(
        out,
        "Dosage questions are critical for safety, {}! At {}, proper dosing is especially important.",
        user.name, user.age
    )?;
    writeln!(out)?;
    writeln!(out, "**Safety Guidelines:**")?;
    writeln!(out, "📋 **Never adjust doses** without healthcare provider approval")?;
    writeln!(
        out,
        "🔍 **Age Considerations:** Metabolism and kidney function affect dosing at {}",
        user.age
    )?;
    writeln!(out, "⚕️ **Individual Factors:** Your health conditions and other medications matter")?;
    writeln!(out, "📞 **When Unsure:** Always consult your doctor or pharmacist")?;
    writeln!(out)?;
    writeln!(
        out,
        "**Your Current Regimen:** You're tracking {} supplements, but dosage verification should always be done with your healthcare provider.",
        supplements.len()
    )?;
    writeln!(out)?;
    write!(
        out,
        "For immediate dosage questions, contact your pharmacist - they're excellent resources for this information! 💊"
    )?;
    Ok(())
}

fn timing(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    let mut schedule: Vec<(&str, &str)> = supplements
        .iter()
        .flat_map(|s| s.scheduled_times().map(move |time| (time, s.name.as_str())))
        .collect();
    let mut unscheduled: Vec<&str> = supplements
        .iter()
        .filter(|s| s.scheduled_times().next().is_none())
        .map(|s| s.name.as_str())
        .collect();

    if supplements.is_empty() {
        write!(
            out,
            "{}, you don't have any supplements scheduled yet. When you add them, I can help you plan timing, and your healthcare provider can confirm what works best for you! ⏰",
            user.name
        )?;
        return Ok(());
    }

    schedule.sort();
    unscheduled.sort();

    writeln!(out, "Here's your current supplement schedule, {}:", user.name)?;
    writeln!(out)?;
    for (time, name) in &schedule {
        writeln!(out, "• {} - {}", time, name)?;
    }
    for name in &unscheduled {
        writeln!(out, "• {} - {}", name, UNSCHEDULED)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", TIMING_TIPS)?;
    writeln!(out)?;
    writeln!(
        out,
        "**Age Consideration:** At {}, consistent timing becomes more important for optimal absorption.",
        user.age
    )?;
    writeln!(out)?;
    write!(
        out,
        "Before changing your schedule, check with your healthcare provider or pharmacist. ⏰"
    )?;
    Ok(())
}

fn age_related(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    writeln!(
        out,
        "Great question about age-related supplement considerations, {}!",
        user.name
    )?;
    writeln!(out)?;
    writeln!(out, "**At {} years old, here are key considerations:**", user.age)?;
    writeln!(out, "{}", AgeBand::from_age(user.age).advisory())?;
    writeln!(out)?;
    writeln!(
        out,
        "**Your Current Regimen:** You're managing {} supplements, which shows good attention to health maintenance.",
        supplements.len()
    )?;
    writeln!(out)?;
    writeln!(out, "**Recommendations:**")?;
    writeln!(out, "🩺 Regular health screenings become more important")?;
    writeln!(out, "💊 Supplement absorption may change with age")?;
    writeln!(out, "📋 Keep detailed records of supplements and any effects")?;
    writeln!(out)?;
    write!(
        out,
        "Always discuss your supplement regimen with your healthcare provider, especially any changes or new additions! 👨‍⚕️"
    )?;
    Ok(())
}

fn general_health(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    writeln!(
        out,
        "Excellent focus on health, {}! Your supplement regimen shows great attention to wellness.",
        user.name
    )?;
    writeln!(out)?;
    writeln!(out, "**Your Current Health Support:**")?;
    writeln!(
        out,
        "💊 **{} Supplements** - A foundation for health maintenance",
        supplements.len()
    )?;
    writeln!(out, "🎯 **Age {}** - A good time to focus on preventive health", user.age)?;
    writeln!(out, "⏰ **Scheduled Routine** - Consistency is key for supplement effectiveness")?;
    writeln!(out)?;
    writeln!(out, "**Remember:** Supplements work best alongside:")?;
    writeln!(out, "🥗 Balanced nutrition")?;
    writeln!(out, "🏃 Regular exercise")?;
    writeln!(out, "😴 Quality sleep")?;
    writeln!(out, "🩺 Regular medical check-ups")?;
    writeln!(out)?;
    write!(out, "{}", CONSULT_LINE)?;
    Ok(())
}

fn capabilities(
    out: &mut String,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    writeln!(
        out,
        "I'd be happy to help you with that, {}! I'm your SafeDoser assistant.",
        user.name
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "**I can see you're managing {} supplements** - that's great health awareness at {} years old!",
        supplements.len(),
        user.age
    )?;
    writeln!(out)?;
    writeln!(out, "**I can help you with:**")?;
    writeln!(out, "💊 **Supplement Information** - Benefits, side effects, interactions")?;
    writeln!(out, "⏰ **Timing Optimization** - Best absorption and effectiveness")?;
    writeln!(out, "🩺 **Health Questions** - General educational information")?;
    writeln!(out, "📋 **Adherence Tips** - Staying consistent with your regimen")?;
    writeln!(
        out,
        "⚕️ **Age-Specific Advice** - Tailored for your {} years",
        user.age
    )?;
    writeln!(out)?;
    writeln!(out, "{}", CONSULT_LINE)?;
    writeln!(out)?;
    write!(out, "Could you be more specific about what you'd like to know? 🌟")?;
    Ok(())
}
