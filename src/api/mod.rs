//! HTTP surface over the decision engine.
//!
//! Thin axum layer: request decoding, the response envelope, and CORS.
//! No triage logic lives here.

pub mod routes;
pub mod server;

pub use routes::{DISCLAIMER, DecisionResponse, TriageRouteState, triage_routes};
pub use server::{build_router, serve};
