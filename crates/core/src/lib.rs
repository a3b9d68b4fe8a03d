//! Domain types and pure logic shared by every hotelier crate.
//!
//! Apart from reading environment variables in [`config`], nothing in here
//! performs I/O: tenant resolution and charge computation are plain
//! functions over their inputs so they can be exercised directly from unit
//! tests.

pub mod bill;
pub mod billing;
pub mod config;
pub mod error;
pub mod tenant;
pub mod types;
