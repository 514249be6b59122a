//! # PlayStack Common Library
//!
//! Shared code for the PlayStack web service and its tests:
//! - Error type
//! - Configuration file loading and tiered setting resolution
//! - Pipeline event types and the broadcast EventBus
//! - Server-Sent Events stream helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
