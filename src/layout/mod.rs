//! Rect splitting used to compose chrome, overlays and view bodies.
//!
//! Callers import from here while the distribution logic lives in `core`.

mod core;

pub use core::{Constraint, Direction, Flex};
