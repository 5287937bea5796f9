//! CLI command implementations.

pub mod apply;
