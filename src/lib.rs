// src/lib.rs

pub mod animator;
pub mod color;
pub mod config;
pub mod demo_fields;
pub mod error;
pub mod grid;
pub mod markers;
pub mod phase_field;
pub mod visualisation;

pub use animator::PAticAnimator;
pub use error::{AnimError, Result};
pub use phase_field::PhaseField;
