//! Shared utilities.
//!
//! Hashing for content-addressed storage, plus test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;
