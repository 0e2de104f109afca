//! TABULA Core - Core types and definitions for the TABULA Feature Engine
//!
//! This crate provides the fundamental types used across the TABULA ecosystem:
//! - Value types for runtime data
//! - Table type for ordered, named columns
//! - Group key type for single and composite grouping
//! - Error types

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use types::{GroupKey, Table, Value};
