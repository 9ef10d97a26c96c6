//! # Provider Module
//!
//! The generative model is an opaque capability: `generate(prompt) -> text`.
//! The response engine only sees the [`GenerativeProvider`] trait, so tests
//! can swap in stubs and the fallback path runs without network access.
//!
//! ## Components
//! - `traits`: the capability itself
//! - `error`: classified provider failures
//! - `gemini`: HTTP adapter for Google's Gemini `generateContent` API

pub mod error;
pub mod gemini;
pub mod traits;

pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use traits::GenerativeProvider;
