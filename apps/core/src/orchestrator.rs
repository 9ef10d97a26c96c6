use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use futures::FutureExt;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::brain::{
    build_prompt, format_context, FallbackComposer, IntentClassifier, IntentKind,
};
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::models::{ChatTurn, SupplementRecord, UserProfile};
use crate::provider::{GeminiProvider, GenerativeProvider, ProviderError};

/// Whether a generative model can be called. Decided once at construction.
#[derive(Clone)]
pub enum ProviderState {
    Available(Arc<dyn GenerativeProvider>),
    Unavailable,
}

/// Which path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    Provider,
    Fallback { intent: IntentKind },
    Apology,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantReply {
    pub text: String,
    pub source: ReplySource,
}

/// Snapshot of how the engine is wired, for health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub provider_configured: bool,
    pub model: Option<String>,
    pub history_window: usize,
}

/// Produces the assistant's reply to one user message.
///
/// Holds no per-user state: every call works only on the snapshot it is
/// given plus the read-only knowledge base, so one instance can be shared
/// across concurrent requests.
#[derive(Clone)]
pub struct ResponseOrchestrator {
    provider: ProviderState,
    classifier: IntentClassifier,
    composer: FallbackComposer,
    history_window: usize,
}

impl ResponseOrchestrator {
    pub fn new(provider: ProviderState, history_window: usize) -> Self {
        Self {
            provider,
            classifier: IntentClassifier::new(),
            composer: FallbackComposer::new(),
            history_window,
        }
    }

    /// Deterministic-only engine.
    pub fn unavailable() -> Self {
        Self::new(
            ProviderState::Unavailable,
            crate::config::DEFAULT_HISTORY_WINDOW,
        )
    }

    pub fn with_provider(provider: Arc<dyn GenerativeProvider>, history_window: usize) -> Self {
        Self::new(ProviderState::Available(provider), history_window)
    }

    /// Wires the Gemini adapter when a key is configured.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AppError> {
        let provider = match &config.provider {
            Some(settings) => {
                let gemini = GeminiProvider::new(settings)?;
                info!(model = %settings.model, "Generative provider configured");
                ProviderState::Available(Arc::new(gemini))
            }
            None => {
                warn!("Gemini API key not configured. Using fallback responses.");
                ProviderState::Unavailable
            }
        };
        Ok(Self::new(provider, config.history_window))
    }

    pub fn status(&self) -> EngineStatus {
        match &self.provider {
            ProviderState::Available(provider) => EngineStatus {
                provider_configured: true,
                model: Some(provider.model_name().to_string()),
                history_window: self.history_window,
            },
            ProviderState::Unavailable => EngineStatus {
                provider_configured: false,
                model: None,
                history_window: self.history_window,
            },
        }
    }

    /// Reply text using the server clock (UTC) as the user's current time.
    pub async fn respond(
        &self,
        message: &str,
        user: &UserProfile,
        supplements: &[SupplementRecord],
        history: &[ChatTurn],
    ) -> String {
        self.respond_at(message, user, supplements, history, Utc::now().fixed_offset())
            .await
    }

    pub async fn respond_at(
        &self,
        message: &str,
        user: &UserProfile,
        supplements: &[SupplementRecord],
        history: &[ChatTurn],
        now: DateTime<FixedOffset>,
    ) -> String {
        self.respond_detailed(message, user, supplements, history, now)
            .await
            .text
    }

    /// Model first when available, deterministic fallback otherwise or on any
    /// provider failure, fixed apology if even the fallback cannot be built.
    #[instrument(skip_all, fields(user_id = %user.id, message_len = message.len()))]
    pub async fn respond_detailed(
        &self,
        message: &str,
        user: &UserProfile,
        supplements: &[SupplementRecord],
        history: &[ChatTurn],
        now: DateTime<FixedOffset>,
    ) -> AssistantReply {
        if let ProviderState::Available(provider) = &self.provider {
            let context = format_context(user, supplements, now);
            let prompt = build_prompt(&context, history, message, self.history_window, user.age);

            let outcome = AssertUnwindSafe(provider.generate(&prompt))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(ProviderError::Panicked(panic_message(payload.as_ref())))
                });

            match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    info!(model = provider.model_name(), "Reply generated by provider");
                    return AssistantReply {
                        text,
                        source: ReplySource::Provider,
                    };
                }
                Ok(_) => warn!("Provider returned an empty reply, falling back"),
                Err(e) if e.is_quota() => warn!("Provider quota exhausted, falling back: {}", e),
                Err(e) => error!("Provider call failed, falling back: {}", e),
            }
        }

        self.fallback(message, user, supplements)
    }

    fn fallback(
        &self,
        message: &str,
        user: &UserProfile,
        supplements: &[SupplementRecord],
    ) -> AssistantReply {
        let intent = self.classifier.classify(message, supplements, user.age);
        info!(intent = intent.label(), "Composing fallback reply");

        let composed = guarded(|| self.composer.compose(&intent, user, supplements));
        settle(composed, intent.kind(), user)
    }
}

/// Runs a composition step, turning a panic into a composition error.
fn guarded<F>(compose: F) -> Result<String, AppError>
where
    F: FnOnce() -> Result<String, AppError>,
{
    panic::catch_unwind(AssertUnwindSafe(compose)).unwrap_or_else(|payload| {
        Err(AppError::Composition(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Turns a composition result into a reply; failures become the apology.
fn settle(
    composed: Result<String, AppError>,
    intent: IntentKind,
    user: &UserProfile,
) -> AssistantReply {
    match composed {
        Ok(text) => AssistantReply {
            text,
            source: ReplySource::Fallback { intent },
        },
        Err(e) => {
            error!(intent = %intent, "Fallback composition failed: {}", e);
            AssistantReply {
                text: apology(&user.name),
                source: ReplySource::Apology,
            }
        }
    }
}

/// Fixed reply used when no other reply could be produced.
pub fn apology(user_name: &str) -> String {
    format!(
        "I'm experiencing some technical difficulties right now, {}, but I'm still here to help! 🔧\n\n\
         **For immediate assistance:**\n\
         📞 **Urgent Medical Questions:** Contact your healthcare provider\n\
         💊 **Medication Information:** Consult your pharmacist\n\
         🌐 **Reliable Sources:** Your medication package inserts\n\n\
         In the meantime, never hesitate to reach out to your healthcare team for any concerns.",
        user_name
    )
}
