//! Shared utilities.

pub mod paths;

#[cfg(test)]
pub mod testutil;
