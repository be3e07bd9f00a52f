use crossterm::event::KeyCode;

use crate::geometry::Rect;
use crate::input::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    Unchanged,
    Moved(usize),
    Activated(usize),
}

/// Selection and scroll offset for a list of `len` entries, each
/// `row_height` rows tall.
#[derive(Debug, Clone, Copy)]
pub struct ListState {
    selected: Option<usize>,
    offset: usize,
    len: usize,
    row_height: u16,
}

impl ListState {
    pub fn new(row_height: u16) -> Self {
        Self {
            selected: None,
            offset: 0,
            len: 0,
            row_height: row_height.max(1),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Track a new entry count, clamping selection and offset.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = None;
            self.offset = 0;
            return;
        }
        if let Some(selected) = self.selected {
            self.selected = Some(selected.min(len - 1));
        }
        self.offset = self.offset.min(len - 1);
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|index| *index < self.len);
    }

    /// How many entries fit in `height` rows.
    pub fn page(&self, height: u16) -> usize {
        ((height / self.row_height) as usize).max(1)
    }

    /// Scroll so the selection is inside a viewport of `height` rows.
    pub fn ensure_visible(&mut self, height: u16) {
        let Some(selected) = self.selected else {
            return;
        };
        let page = self.page(height);
        if selected < self.offset {
            self.offset = selected;
        } else if selected >= self.offset + page {
            self.offset = selected + 1 - page;
        }
    }

    /// Visible entry indices for a viewport of `height` rows.
    pub fn visible(&self, height: u16) -> std::ops::Range<usize> {
        let end = (self.offset + self.page(height)).min(self.len);
        self.offset.min(end)..end
    }

    /// Apply one input event; `area` is where the list was last drawn.
    pub fn handle(&mut self, event: &InputEvent, area: Rect) -> ListEvent {
        if self.len == 0 {
            return ListEvent::Unchanged;
        }
        match event {
            InputEvent::Click { column, row } if area.contains(*column, *row) => {
                let index = self.offset + ((row - area.y) / self.row_height) as usize;
                if index >= self.len {
                    return ListEvent::Unchanged;
                }
                self.selected = Some(index);
                ListEvent::Activated(index)
            }
            InputEvent::Scroll { column, row, down } if area.contains(*column, *row) => {
                let last = self.len.saturating_sub(self.page(area.height));
                self.offset = if *down {
                    (self.offset + 1).min(last)
                } else {
                    self.offset.saturating_sub(1)
                };
                ListEvent::Unchanged
            }
            InputEvent::Key(_) => {
                let Some(key) = event.pressed() else {
                    return ListEvent::Unchanged;
                };
                let next = match (key.code, self.selected) {
                    (KeyCode::Up, Some(index)) => index.saturating_sub(1),
                    (KeyCode::Down, Some(index)) => (index + 1).min(self.len - 1),
                    (KeyCode::Up | KeyCode::Down | KeyCode::Home, None) | (KeyCode::Home, _) => 0,
                    (KeyCode::End, _) => self.len - 1,
                    (KeyCode::Enter, Some(index)) => return ListEvent::Activated(index),
                    _ => return ListEvent::Unchanged,
                };
                self.selected = Some(next);
                self.ensure_visible(area.height);
                ListEvent::Moved(next)
            }
            _ => ListEvent::Unchanged,
        }
    }
}
