//! Row structs for the registry and tenant databases.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus conversions into the `hotelier_core` domain types.

pub mod bill;
pub mod room;
pub mod stay;
pub mod tenant;
