//! Shared helpers used outside the scoring core.

pub mod validation;
