//! Triage Engine — deterministic severity classification and escalation decisions.

pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod triage;
