//! HTTP API layer for Consensus Core.
//!
//! Provides REST endpoints for claim verification and provider status.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
