//! # GutenKu Common Library
//!
//! Shared code for the GutenKu crates including:
//! - Error types
//! - Configuration file resolution and TOML loading
//! - Event types (HaikuEvent enum) and the EventBus sink

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
