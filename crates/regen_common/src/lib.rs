//! Shared foundational types used across the regen workspace.
//!
//! This crate provides snapshot fingerprinting and the cancellation flag that
//! the host passes into every comparison.

#![warn(missing_docs)]

pub mod cancel;
pub mod hash;

pub use cancel::CancelFlag;
pub use hash::ContentHash;
