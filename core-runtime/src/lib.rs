//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the companion core:
//! - Logging and tracing infrastructure
//! - Configuration management (bridges, endpoints, cache policy)
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other modules depend on.
//! It establishes the logging conventions, configuration builder, and event
//! broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
