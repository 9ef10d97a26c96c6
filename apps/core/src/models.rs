use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Longest message the assistant accepts in one turn.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

// NOTE: expect() is acceptable here, the pattern is a compile-time constant.
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("Invalid regex: HH:MM time pattern")
});

/// Returns true when `value` is a 24-hour `HH:MM` time.
pub fn is_valid_time(value: &str) -> bool {
    TIME_PATTERN.is_match(value)
}

/// The person the assistant is talking to.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    /// Opaque identifier issued by the account service.
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(max = 150))]
    pub age: u32,
    #[serde(default)]
    pub email: Option<String>,
}

/// Part of the day a dose is scheduled in. Ordering follows the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

/// A warning attached to a supplement by the registry (interaction, recall).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementAlert {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One supplement in a user's regimen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SupplementRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    /// softgel, tablet, gummy, liquid, powder...
    #[serde(default)]
    pub dosage_form: String,
    #[serde(default)]
    pub dose_quantity: String,
    #[serde(default)]
    pub dose_unit: String,
    #[serde(default)]
    pub frequency: String,
    /// Scheduled `HH:MM` times per period, each list in the user's order.
    #[serde(default)]
    pub times_of_day: BTreeMap<Period, Vec<String>>,
    #[serde(default)]
    pub interactions: BTreeSet<String>,
    #[serde(default = "default_remind_me")]
    pub remind_me: bool,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alerts: Vec<SupplementAlert>,
}

fn default_remind_me() -> bool {
    true
}

impl SupplementRecord {
    /// Creates a record with a single scheduled time and everything else defaulted.
    pub fn new(name: impl Into<String>, period: Period, time: impl Into<String>) -> Self {
        let mut times_of_day = BTreeMap::new();
        times_of_day.insert(period, vec![time.into()]);
        Self {
            id: None,
            name: name.into(),
            brand: String::new(),
            dosage_form: String::new(),
            dose_quantity: String::new(),
            dose_unit: String::new(),
            frequency: String::new(),
            times_of_day,
            interactions: BTreeSet::new(),
            remind_me: true,
            expiration_date: None,
            quantity: String::new(),
            completed: false,
            tags: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn with_dosage_form(mut self, form: impl Into<String>) -> Self {
        self.dosage_form = form.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// All scheduled times, Morning first, each period in its stored order.
    pub fn scheduled_times(&self) -> impl Iterator<Item = &str> {
        self.times_of_day
            .values()
            .flat_map(|times| times.iter().map(String::as_str))
    }

    /// Human label for the dosage form, `default` when the registry left it blank.
    pub fn form_label(&self) -> &str {
        if self.dosage_form.trim().is_empty() {
            "default"
        } else {
            self.dosage_form.as_str()
        }
    }

    pub fn is_muted(&self) -> bool {
        !self.remind_me
    }

    /// Checks every scheduled time against the `HH:MM` format.
    pub fn validate_schedule(&self) -> Result<(), AppError> {
        match self.scheduled_times().find(|time| !is_valid_time(time)) {
            Some(bad) => Err(AppError::Validation(format!(
                "Invalid time '{}' for supplement '{}': expected HH:MM",
                bad, self.name
            ))),
            None => Ok(()),
        }
    }
}

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            other => Err(AppError::Validation(format!("Unknown sender: {}", other))),
        }
    }
}

/// A single message in a user's conversation with the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub sender: Sender,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Inbound payload: one user message plus the snapshot the reply is grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user: UserProfile,
    #[serde(default)]
    pub supplements: Vec<SupplementRecord>,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
    /// The user's local time; the server clock is used when absent.
    #[serde(default)]
    pub current_time: Option<DateTime<FixedOffset>>,
}

impl ChatRequest {
    /// Full validation of the request, including nested records and time formats.
    pub fn ensure_valid(&self) -> Result<(), AppError> {
        validate_chat_input(&self.message, &self.user, &self.supplements)
    }
}

/// Checks one inbound message and the snapshot it will be answered against.
pub fn validate_chat_input(
    message: &str,
    user: &UserProfile,
    supplements: &[SupplementRecord],
) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "Message exceeds {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    user.validate()?;
    for supplement in supplements {
        supplement.validate()?;
        supplement.validate_schedule()?;
    }
    Ok(())
}

/// Outbound payload returned to the HTTP layer / CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            user: UserProfile {
                id: "user-1".to_string(),
                name: "Jane".to_string(),
                age: 52,
                email: None,
            },
            supplements: vec![SupplementRecord::new("Omega-3", Period::Morning, "09:00")],
            chat_history: vec![],
            current_time: None,
        }
    }

    #[test]
    fn test_time_format() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("09:30"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("9:30"));
        assert!(!is_valid_time("09:60"));
        assert!(!is_valid_time("morning"));
    }

    #[test]
    fn test_scheduled_times_follow_day_order() {
        let mut record = SupplementRecord::new("Magnesium", Period::Evening, "21:00");
        record
            .times_of_day
            .insert(Period::Morning, vec!["07:00".to_string(), "08:30".to_string()]);

        let times: Vec<&str> = record.scheduled_times().collect();
        assert_eq!(times, vec!["07:00", "08:30", "21:00"]);
    }

    #[test]
    fn test_request_validation() {
        assert!(sample_request("when should I take my omega-3?").ensure_valid().is_ok());
        assert!(matches!(
            sample_request("   ").ensure_valid(),
            Err(AppError::Validation(_))
        ));

        let mut request = sample_request("hello");
        request.supplements[0]
            .times_of_day
            .insert(Period::Evening, vec!["7pm".to_string()]);
        let err = request.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("7pm"));
    }

    #[test]
    fn test_supplement_deserializes_with_defaults() {
        let json = r#"{
            "name": "Vitamin D3",
            "dosage_form": "softgel",
            "times_of_day": {"Morning": ["08:00"]},
            "interactions": ["thiazide diuretics"]
        }"#;
        let record: SupplementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Vitamin D3");
        assert!(record.remind_me);
        assert!(!record.completed);
        assert_eq!(record.scheduled_times().collect::<Vec<_>>(), vec!["08:00"]);
        assert_eq!(record.form_label(), "softgel");
    }

    #[test]
    fn test_sender_round_trip_through_str() {
        assert_eq!("user".parse::<Sender>().unwrap(), Sender::User);
        assert_eq!(Sender::Assistant.as_str(), "assistant");
        assert!("bot".parse::<Sender>().is_err());
    }
}
