//! Games shipped with the crate.
//!
//! - `tree`: explicit scripted game trees for exercising the engines
//! - `settlers`: a compact Catan-like board game

pub mod settlers;
pub mod tree;
