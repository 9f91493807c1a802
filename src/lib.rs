//! Reelforge - scheduled content-to-video pipeline
//!
//! This library crate exposes the binary's wiring for integration testing.

pub mod collaborators;
pub mod config;
pub mod driver;
