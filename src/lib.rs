//! Plcimages - captured image metadata for catalog products
//!
//! This library crate exposes the core functionality for integration testing.

pub mod client;
pub mod config;
pub mod server;
pub mod sync;
