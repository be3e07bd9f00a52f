use crossterm::event::KeyCode;

use crate::geometry::Rect;
use crate::input::InputEvent;
use crate::nav::{NavItem, ViewId};
use crate::render::{RenderContext, Style};
use crate::theme::Theme;

const PANEL_WIDTH: u16 = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawerEntry {
    pub id: ViewId,
    pub item: NavItem,
}

/// Modal slide-over list of navigation destinations.
///
/// Selecting an entry latches a destination change that the navigation
/// manager picks up with [`NavDrawer::take_destination_change`]. Programmatic
/// updates through [`NavDrawer::set_destination`] never latch.
#[derive(Debug, Clone, Default)]
pub struct NavDrawer {
    entries: Vec<DrawerEntry>,
    open: bool,
    cursor: usize,
    destination: Option<ViewId>,
    changed: bool,
    panel: Rect,
    hits: Vec<(Rect, usize)>,
}

impl NavDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, id: ViewId, item: NavItem) {
        self.entries.push(DrawerEntry { id, item });
    }

    pub fn entries(&self) -> &[DrawerEntry] {
        &self.entries
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.open = true;
        self.cursor = self
            .destination
            .and_then(|id| self.position(id))
            .unwrap_or(0);
        true
    }

    pub fn close(&mut self) {
        self.open = false;
        self.hits.clear();
    }

    /// Area covered by the last paint.
    pub fn panel(&self) -> Rect {
        self.panel
    }

    pub fn destination(&self) -> Option<ViewId> {
        self.destination
    }

    pub fn set_destination(&mut self, id: ViewId) {
        self.destination = Some(id);
        if let Some(pos) = self.position(id) {
            self.cursor = pos;
        }
    }

    /// Destination picked by the user since the last call, if any.
    pub fn take_destination_change(&mut self) -> Option<ViewId> {
        if std::mem::take(&mut self.changed) {
            self.destination
        } else {
            None
        }
    }

    fn position(&self, id: ViewId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn select(&mut self, index: usize) {
        if let Some(entry) = self.entries.get(index) {
            self.destination = Some(entry.id);
            self.changed = true;
        }
        self.close();
    }

    /// Handle one event while open. Every key and click is consumed.
    pub fn handle_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Key(_) => {
                let Some(key) = event.pressed() else {
                    return;
                };
                match key.code {
                    KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
                    KeyCode::Down => {
                        if self.cursor + 1 < self.entries.len() {
                            self.cursor += 1;
                        }
                    }
                    KeyCode::Enter => self.select(self.cursor),
                    KeyCode::Esc => self.close(),
                    _ => {}
                }
            }
            InputEvent::Click { column, row } => {
                let hit = self
                    .hits
                    .iter()
                    .find(|(rect, _)| rect.contains(*column, *row))
                    .map(|(_, index)| *index);
                match hit {
                    Some(index) => self.select(index),
                    None if !self.panel.contains(*column, *row) => self.close(),
                    None => {}
                }
            }
            _ => {}
        }
    }

    pub fn paint(&mut self, ctx: &mut RenderContext<'_>, theme: &Theme) {
        self.hits.clear();
        let area = ctx.area();
        self.panel = Rect::new(area.x, area.y, PANEL_WIDTH.min(area.width), area.height);
        let base = Style::fg(theme.text).on(theme.drawer_background);
        ctx.fill(self.panel, base);
        ctx.text(self.panel.x + 1, self.panel.y, "Navigate", base.bold());

        let entries: Vec<(String, bool)> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    format!(" {} {}", entry.item.icon.glyph(), entry.item.name),
                    Some(entry.id) == self.destination,
                )
            })
            .collect();
        for (index, (label, current)) in entries.into_iter().enumerate() {
            let y = self.panel.y.saturating_add(2 + index as u16);
            if y >= self.panel.bottom() {
                break;
            }
            let row = Rect::new(self.panel.x, y, self.panel.width, 1);
            let mut style = if current { base.bold() } else { base };
            if index == self.cursor {
                style = style.reversed();
            }
            ctx.fill(row, style);
            ctx.text(row.x, y, &label, style);
            self.hits.push((row, index));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::Icon;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn drawer() -> NavDrawer {
        let mut drawer = NavDrawer::new();
        drawer.add_item(ViewId::CommunityMenu, NavItem::new("Communities", Icon::Communities));
        drawer.add_item(ViewId::ReplyThread, NavItem::new("Messages", Icon::Messages));
        drawer.set_destination(ViewId::CommunityMenu);
        drawer
    }

    #[test]
    fn programmatic_destination_does_not_latch() {
        let mut drawer = drawer();
        drawer.set_destination(ViewId::ReplyThread);
        assert_eq!(drawer.take_destination_change(), None);
        assert_eq!(drawer.destination(), Some(ViewId::ReplyThread));
    }

    #[test]
    fn keyboard_selection_latches_once_and_closes() {
        let mut drawer = drawer();
        assert!(drawer.open());
        drawer.handle_input(&key(KeyCode::Down));
        drawer.handle_input(&key(KeyCode::Enter));
        assert!(!drawer.is_open());
        assert_eq!(drawer.take_destination_change(), Some(ViewId::ReplyThread));
        assert_eq!(drawer.take_destination_change(), None);
    }

    #[test]
    fn empty_drawer_refuses_to_open() {
        let mut drawer = NavDrawer::new();
        assert!(!drawer.open());
    }
}
