//! Setu terminology server.
//!
//! Dual-coding FHIR terminology service bridging the NAMASTE traditional
//! medicine code system and WHO ICD-11. Exposes `$expand`, `$lookup`, and
//! `$translate`, a dual-coded Condition surface, JWT-protected routes, and an
//! admin surface for CSV uploads and audit inspection.

pub mod admin;
pub mod auth_routes;
pub mod conditions;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod operations;
pub mod server;

pub use config::AppConfig;
pub use server::{AppState, ServerBuilder, SetuServer, build_app};
