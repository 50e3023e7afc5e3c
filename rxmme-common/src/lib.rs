//! # rxmme Common Library
//!
//! Shared code for the rxmme crates:
//! - Error and result types
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
