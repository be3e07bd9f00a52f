use crate::error::Result;
use crate::geometry::Dimensions;
use crate::input::ActionTag;
use crate::render::RenderContext;

use super::ManagerHandle;

/// Glyphs available to app-bar actions and drawer entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Menu,
    Overflow,
    Back,
    Clear,
    Reply,
    CancelReply,
    SendReply,
    CreateConversation,
    Copy,
    Paste,
    Communities,
    Messages,
    Theme,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Menu => "≡",
            Icon::Overflow => "⋮",
            Icon::Back => "←",
            Icon::Clear => "✕",
            Icon::Reply => "↩",
            Icon::CancelReply => "⊘",
            Icon::SendReply => "➤",
            Icon::CreateConversation => "+",
            Icon::Copy => "⧉",
            Icon::Paste => "⎘",
            Icon::Communities => "#",
            Icon::Messages => "✉",
            Icon::Theme => "◐",
        }
    }
}

/// Primary app-bar action. `accelerator` binds Alt+key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBarAction {
    pub name: String,
    pub icon: Icon,
    pub tag: ActionTag,
    pub accelerator: Option<char>,
}

impl AppBarAction {
    pub fn new(name: impl Into<String>, icon: Icon, tag: ActionTag) -> Self {
        Self {
            name: name.into(),
            icon,
            tag,
            accelerator: None,
        }
    }

    pub fn with_accelerator(mut self, key: char) -> Self {
        self.accelerator = Some(key);
        self
    }
}

/// Entry of the overflow menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowAction {
    pub name: String,
    pub tag: ActionTag,
}

impl OverflowAction {
    pub fn new(name: impl Into<String>, tag: ActionTag) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }
}

/// Chrome a view asks for when it becomes active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBarData {
    pub visible: bool,
    pub title: String,
    pub actions: Vec<AppBarAction>,
    pub overflow: Vec<OverflowAction>,
}

impl AppBarData {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            visible: true,
            title: title.into(),
            actions: Vec::new(),
            overflow: Vec::new(),
        }
    }

    /// No app bar at all; the view owns the whole content area.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::titled("")
        }
    }

    pub fn with_action(mut self, action: AppBarAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_overflow(mut self, action: OverflowAction) -> Self {
        self.overflow.push(action);
        self
    }
}

/// Drawer entry declared by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub name: String,
    pub icon: Icon,
}

impl NavItem {
    pub fn new(name: impl Into<String>, icon: Icon) -> Self {
        Self {
            name: name.into(),
            icon,
        }
    }
}

/// Capability set every screen implements.
///
/// The manager calls `update` then `layout` once per frame while the view is
/// current. Errors from either are logged and contained to the frame.
pub trait View: Send {
    /// Short name used in log targets.
    fn name(&self) -> &'static str;

    /// Consume this frame's input events.
    fn update(&mut self, _ctx: &mut RenderContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Draw into `ctx` and report the space used.
    fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions>;

    /// Clipboard contents delivered while this view is current.
    fn handle_clipboard(&mut self, _text: &str) {}

    /// Called once per forward activation, before its first `layout`.
    fn become_visible(&mut self) {}

    fn app_bar_data(&self) -> AppBarData;

    fn nav_item(&self) -> Option<NavItem> {
        None
    }

    fn set_manager(&mut self, _manager: ManagerHandle) {}
}
