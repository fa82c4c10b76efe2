//! CLI command implementations.

pub mod announce;
pub mod apply;
pub mod common;
