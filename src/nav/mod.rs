//! View navigation and lifecycle management.
//!
//! The [`NavigationManager`] owns every registered [`View`], the back stack
//! and the chrome derived from the active view. Views talk back to it through
//! a [`ManagerHandle`] whose requests are applied right after the call that
//! issued them returns.

mod audit;
mod handle;
mod manager;
mod registry;
mod stack;
mod view;

use std::fmt;

use serde::Serialize;

pub use audit::{
    BufferedNavAudit, NavAudit, NavAuditEvent, NavAuditEventBuilder, NavAuditStage, NullNavAudit,
};
pub use handle::{ManagerHandle, ManagerRequest};
pub use manager::{HostRequest, MAX_REQUEST_ROUNDS, NavigationManager};
pub use registry::ViewRegistry;
pub use stack::NavStack;
pub use view::{AppBarAction, AppBarData, Icon, NavItem, OverflowAction, View};

/// Identifies one registered screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    ConnectForm,
    IdentityForm,
    CommunityMenu,
    ReplyThread,
    Consent,
    ThemeEditor,
}

impl ViewId {
    pub const ALL: [ViewId; 6] = [
        ViewId::ConnectForm,
        ViewId::IdentityForm,
        ViewId::CommunityMenu,
        ViewId::ReplyThread,
        ViewId::Consent,
        ViewId::ThemeEditor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewId::ConnectForm => "connect_form",
            ViewId::IdentityForm => "identity_form",
            ViewId::CommunityMenu => "community_menu",
            ViewId::ReplyThread => "reply_thread",
            ViewId::Consent => "consent",
            ViewId::ThemeEditor => "theme_editor",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event was handled or should fall through to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

impl EventFlow {
    pub fn is_consumed(self) -> bool {
        self == EventFlow::Consumed
    }
}
