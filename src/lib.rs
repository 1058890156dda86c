//! # SCOURT Sync Library
//!
//! Deduplicated sync-job queue for court-portal (SCOURT) case refreshes:
//! dedup key derivation, idempotent enqueue, the periodic scheduler and the
//! HTTP surface that triggers them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod scheduler;
pub mod server;
pub mod sync_queue;
pub mod telemetry;
pub use migration;
