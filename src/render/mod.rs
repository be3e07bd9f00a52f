//! Frame composition: views and chrome emit [`DrawOp`]s through a
//! [`RenderContext`], the ops are applied to a [`Canvas`], and the
//! [`AnsiRenderer`] flushes changed rows to the terminal.

mod canvas;
mod context;
mod core;
mod ops;

pub use canvas::{Canvas, Cell, Style};
pub use context::RenderContext;
pub use core::{AnsiRenderer, RendererSettings};
pub use ops::{CallOp, DrawOp, Macro, OpList};
