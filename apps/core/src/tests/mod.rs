//! Test Module
//!
//! Cross-module test suite for the SafeDoser response engine.
//!
//! ## Test Categories
//! - `brain_tests`: Knowledge base, classifier and composer working together
//! - `orchestrator_tests`: Provider and fallback paths of the response engine
//! - `database_tests`: Chat history store
//! - `integration_tests`: Full chat exchange through `ChatService`
//! - `concurrency_tests`: Independent concurrent requests


use crate::models::{Period, SupplementRecord, UserProfile};

pub(crate) fn user(name: &str, age: u32) -> UserProfile {
    UserProfile {
        id: format!("user-{}", name.to_lowercase()),
        name: name.to_string(),
        age,
        email: None,
    }
}

pub(crate) fn omega_softgel() -> SupplementRecord {
    SupplementRecord::new("Omega-3", Period::Morning, "09:00").with_dosage_form("softgel")
}
