//! Core types for the clan calendar.
//!
//! This crate provides everything the front ends share:
//! - `event` for the event model and its enumerations
//! - `calendar` for the month grid and timezone-aware day bucketing
//! - `timefmt` and `zone` for rendering instants in the reference or local zone
//! - `store`, `identity` and `notify` for the hosted backend and the chat webhook
//! - `actions` for the CRUD layer that ties them together

pub mod actions;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod filter;
mod http;
pub mod identity;
pub mod notify;
pub mod store;
pub mod timefmt;
pub mod zone;

// Re-export the event model at crate root for convenience
pub use event::*;
