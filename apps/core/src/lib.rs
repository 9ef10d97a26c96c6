//! SafeDoser conversational response engine.
//!
//! Given a user's profile, supplement regimen and recent conversation, the
//! [`orchestrator::ResponseOrchestrator`] produces a safe, context-aware reply:
//! from a generative model when one is configured, otherwise (or whenever the
//! model fails) from the rule-based [`brain`].

pub mod brain;
pub mod chat_service;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod telemetry;

pub use chat_service::{ChatReply, ChatService};
pub use config::AssistantConfig;
pub use error::AppError;
pub use orchestrator::{AssistantReply, EngineStatus, ProviderState, ReplySource, ResponseOrchestrator};

#[cfg(test)]
mod tests;
