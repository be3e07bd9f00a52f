//! Concrete screens registered with the navigation manager.
//!
//! Each view is built with exactly the shared handles it reads; nothing is
//! reached through globals.

mod community;
mod connect;
mod consent;
mod identity;
mod reply;
mod theme_editor;

use std::sync::{Arc, RwLock};

use crate::logging::{LogLevel, Logger, json_str};
use crate::nav::ViewId;
use crate::store::NodeId;

pub use community::CommunityMenuView;
pub use connect::ConnectFormView;
pub use consent::ConsentView;
pub use identity::IdentityFormView;
pub use reply::{ReplyThreadView, ThreadHighlight};
pub use theme_editor::ThemeEditorView;

/// Community picked in the community menu; the reply thread is scoped to it.
pub type ActiveCommunity = Arc<RwLock<Option<NodeId>>>;

pub fn active_community() -> ActiveCommunity {
    Arc::new(RwLock::new(None))
}

fn target(id: ViewId) -> String {
    format!("arbor::views.{id}")
}

/// Log a degraded store read from inside a view.
fn log_store_error(logger: &Logger, id: ViewId, message: &str, err: impl ToString) {
    logger.emit(
        LogLevel::Warn,
        &target(id),
        message,
        [json_str("error", err.to_string())],
    );
}
