//! Core engine types and utilities for the memory tree.
//!
//! This crate provides the foundational types used across all systems:
//! - Frame timing (the per-frame hook input)
//! - Cancellable timers for scheduled transitions
//! - Easing curves and tweens
//! - Transform and spatial helpers

pub mod time;
pub mod timer;
pub mod transform;
pub mod tween;

pub use time::*;
pub use timer::*;
pub use transform::*;
pub use tween::*;

// Re-export commonly used types
pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
