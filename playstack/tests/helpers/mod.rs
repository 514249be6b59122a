//! Test Helper Utilities
//!
//! Shared utilities for testing playstack

#![allow(dead_code)]

pub mod app;
pub mod fake_toolchain;
pub mod fixtures;

// Re-export commonly used items
pub use app::{
    body_json, get, multipart_body, post_instrumental, post_transcribe, scratch_is_empty,
    TestApp,
};
pub use fake_toolchain::{Behavior, FakeToolchain};
pub use fixtures::{generate_test_midi, generate_test_wav};
