//! Domain layer for the SmartSaver backend.
//!
//! This crate contains:
//! - Domain models (notifications, preferences, accounts, bills, billing)
//! - The notification rule engine and its store/channel seams
//! - The scripted financial advisor and account-sync provider stubs

pub mod models;
pub mod services;
