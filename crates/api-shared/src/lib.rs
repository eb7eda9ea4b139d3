//! # API Shared
//!
//! Shared definitions for the consultation API.
//!
//! Contains:
//! - JSON wire types with OpenAPI schemas (`wire` module)
//! - Shared services like `HealthService`
//! - Bearer-token extraction (usable by any HTTP transport)
//!
//! Used by `api-rest`; kept separate so other transports can reuse the same bodies.

pub mod auth;
pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
