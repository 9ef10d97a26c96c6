//! # Brain Module
//!
//! Rule-based side of the assistant. Everything here is synchronous, pure and
//! works without a model.
//!
//! ## Components
//! - `knowledge`: Static supplement knowledge base and age bands
//! - `context_formatter`: Context block and prompt text for the model
//! - `intent`: Fixed-priority intent classification
//! - `composer`: Deterministic fallback replies per intent

pub mod composer;
pub mod context_formatter;
pub mod intent;
pub mod knowledge;

pub use composer::FallbackComposer;
pub use context_formatter::{build_prompt, format_context};
pub use intent::{Intent, IntentClassifier, IntentKind};
pub use knowledge::{AgeBand, KnowledgeBase, KnowledgeEntry, SupplementInfo};
