//! Shared utilities and common types for the SmartSaver backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Bearer token (JWT) verification for user-scoped endpoints
//! - Cursor pagination helpers
//! - Currency formatting for notification and email copy
//! - Webhook signature verification
//! - Field validators for request bodies

pub mod currency;
pub mod jwt;
pub mod pagination;
pub mod signature;
pub mod validation;
