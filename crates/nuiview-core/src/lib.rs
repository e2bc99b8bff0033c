//! nuiview core
//!
//! Shared building blocks for the nuiview crates: hashed collections,
//! colors, integer geometry, logging and profiling hooks.

pub mod alloc;
pub mod color;
pub mod logging;
pub mod math;
pub mod profiling;

pub use color::Color;
