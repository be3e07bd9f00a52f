//! Small stateful widgets shared by the views.

mod list;
mod reply;
mod text_field;

pub use list::{ListEvent, ListState};
pub use reply::{Highlight, ReplyRow, format_timestamp, paint_reply, REPLY_ROW_HEIGHT};
pub use text_field::{FieldEvent, TextField};
