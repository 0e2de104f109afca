//! Type definitions for the TABULA Feature Engine

pub mod group;
pub mod table;
pub mod value;

pub use group::GroupKey;
pub use table::Table;
pub use value::Value;
