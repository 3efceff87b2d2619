//! # relq Configuration Module
//!
//! Centralizes the on-disk format constants and execution minimums.
//! Interdependent values are co-located and checked with compile-time
//! assertions so the page geometry cannot drift out of sync with the codec.

pub mod constants;
pub use constants::*;
