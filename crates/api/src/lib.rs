//! SmartSaver HTTP API: notification rule engine endpoints, transactional
//! email, Stripe billing and account sync.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;
