//! App bar, contextual bar and navigation drawer around the active view.

mod app_bar;
mod drawer;

use crate::input::{ActionTag, InputEvent, KeyMap};
use crate::logging::{CHROME_TARGET, LogLevel, Logger, json_kv, json_str};
use crate::nav::{AppBarAction, AppBarData, NavItem, OverflowAction, ViewId};
use crate::render::RenderContext;
use crate::theme::Theme;

pub use app_bar::{AppBar, BAR_HEIGHT, BarInput};
pub use drawer::{DrawerEntry, NavDrawer};

/// Comparable view of everything chrome currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeSnapshot {
    pub bar_visible: bool,
    pub title: String,
    pub actions: Vec<ActionTag>,
    pub overflow: Vec<ActionTag>,
    pub contextual: bool,
    pub overflow_open: bool,
    pub drawer_open: bool,
    pub destination: Option<ViewId>,
}

/// Owns the app bar and the drawer and decides which input they keep.
pub struct ChromeCoordinator {
    bar: AppBar,
    drawer: NavDrawer,
    logger: Logger,
}

impl ChromeCoordinator {
    pub fn new(logger: Logger) -> Self {
        Self {
            bar: AppBar::new(),
            drawer: NavDrawer::new(),
            logger,
        }
    }

    pub fn add_nav_item(&mut self, id: ViewId, item: NavItem) {
        self.drawer.add_item(id, item);
    }

    /// Re-derive the bar from a newly active view. Leaves contextual mode
    /// and closes the overflow menu.
    pub fn apply_app_bar_data(&mut self, data: &AppBarData) {
        self.bar.dismiss_contextual();
        self.bar.close_overflow();
        self.bar.apply(data);
    }

    pub fn set_destination(&mut self, id: ViewId) {
        self.drawer.set_destination(id);
    }

    pub fn take_destination_change(&mut self) -> Option<ViewId> {
        self.drawer.take_destination_change()
    }

    pub fn request_contextual_bar(
        &mut self,
        title: String,
        actions: Vec<AppBarAction>,
        overflow: Vec<OverflowAction>,
    ) {
        // A view without an app bar has nowhere to show a contextual bar.
        if !self.bar.is_visible() {
            self.logger.emit(
                LogLevel::Debug,
                CHROME_TARGET,
                "contextual_bar_hidden",
                [json_str("title", title)],
            );
            return;
        }
        self.logger.emit(
            LogLevel::Debug,
            CHROME_TARGET,
            "contextual_bar",
            [json_str("title", title.clone()), json_kv("actions", actions.len())],
        );
        self.bar.request_contextual(title, actions, overflow);
    }

    pub fn dismiss_contextual_bar(&mut self) {
        self.bar.dismiss_contextual();
    }

    pub fn dismiss_overflow(&mut self) {
        self.bar.close_overflow();
    }

    pub fn bar_visible(&self) -> bool {
        self.bar.is_visible()
    }

    pub fn drawer_open(&self) -> bool {
        self.drawer.is_open()
    }

    pub fn overflow_open(&self) -> bool {
        self.bar.overflow_open()
    }

    pub fn in_contextual(&self) -> bool {
        self.bar.in_contextual()
    }

    /// Escape belongs to chrome while a drawer or menu is open, or while a
    /// visible contextual bar is up (Escape leaves contextual mode first).
    pub fn captures_escape(&self) -> bool {
        self.drawer_open() || self.overflow_open() || (self.bar_visible() && self.in_contextual())
    }

    pub fn app_bar(&self) -> &AppBar {
        &self.bar
    }

    pub fn drawer(&self) -> &NavDrawer {
        &self.drawer
    }

    /// Keep the events chrome owns and return the rest, with bar activations
    /// translated into [`InputEvent::Action`].
    pub fn filter_input(&mut self, events: &[InputEvent], keys: &KeyMap) -> Vec<InputEvent> {
        let mut forwarded = Vec::with_capacity(events.len());
        for event in events {
            if self.drawer.is_open() {
                if event.pressed().is_some_and(|key| keys.menu.matches(key)) {
                    self.drawer.close();
                } else {
                    self.drawer.handle_input(event);
                }
                continue;
            }
            if event.pressed().is_some_and(|key| keys.menu.matches(key)) {
                self.open_drawer();
                continue;
            }
            match self.bar.handle_input(event, keys) {
                BarInput::Ignored => forwarded.push(event.clone()),
                BarInput::Consumed => {}
                BarInput::OpenDrawer => self.open_drawer(),
                BarInput::Forward(translated) => forwarded.push(translated),
            }
        }
        forwarded
    }

    fn open_drawer(&mut self) {
        self.bar.close_overflow();
        if self.drawer.open() {
            self.logger
                .emit(LogLevel::Debug, CHROME_TARGET, "drawer_opened", []);
        }
    }

    pub fn paint_bar(&mut self, ctx: &mut RenderContext<'_>, theme: &Theme) {
        let nav_icon = !self.drawer.entries().is_empty();
        self.bar.paint(ctx, theme, nav_icon);
    }

    /// Returns whether anything was painted.
    pub fn paint_drawer(&mut self, ctx: &mut RenderContext<'_>, theme: &Theme) -> bool {
        if !self.drawer.is_open() {
            return false;
        }
        self.drawer.paint(ctx, theme);
        true
    }

    pub fn snapshot(&self) -> ChromeSnapshot {
        ChromeSnapshot {
            bar_visible: self.bar.is_visible(),
            title: self.bar.title().to_string(),
            actions: self.bar.actions().iter().map(|action| action.tag).collect(),
            overflow: self.bar.overflow().iter().map(|action| action.tag).collect(),
            contextual: self.bar.in_contextual(),
            overflow_open: self.bar.overflow_open(),
            drawer_open: self.drawer.is_open(),
            destination: self.drawer.destination(),
        }
    }
}
