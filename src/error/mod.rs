//! Error types shared across the shell.
//!
//! Call sites import `ShellError`/`Result` from the crate root; the variants
//! live in `types`.

mod types;

pub use types::{Result, ShellError};
