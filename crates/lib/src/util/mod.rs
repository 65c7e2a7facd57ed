//! Shared utilities.
//!
//! Glob matching for resource and directory filters, plus test helpers.

pub mod glob;

#[cfg(test)]
pub mod testutil;
