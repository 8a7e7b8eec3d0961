//! Configuration types
//!
//! Board-agnostic monitor configuration, optionally stored as a
//! postcard-encoded config image.

#[cfg(feature = "serde")]
pub mod image;
pub mod types;

#[cfg(feature = "serde")]
pub use image::*;
pub use types::*;
