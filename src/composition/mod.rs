//! # Composition
//!
//! Turns the on-screen styled container (backdrop, padding, rounded video)
//! into output-resolution frames for the encoder.

pub mod compositor;
pub mod layout;

pub use compositor::{FrameCompositor, FrameSource};
pub use layout::{ContainerLayout, QualityTier};
