use crossterm::event::{KeyCode, KeyModifiers};

use crate::geometry::Rect;
use crate::input::InputEvent;
use crate::render::{RenderContext, Style};
use crate::theme::Theme;
use crate::width::{display_width, truncate_display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Unchanged,
    Changed,
    /// Enter pressed with non-blank contents (trimmed).
    Submitted(String),
}

/// Single-line text input. The caret always sits at the end of the buffer.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    buffer: String,
    placeholder: String,
}

impl TextField {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            placeholder: placeholder.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    /// Append pasted text; line breaks collapse to spaces.
    pub fn insert(&mut self, text: &str) {
        self.buffer.extend(
            text.chars()
                .filter(|ch| *ch != '\r')
                .map(|ch| if ch == '\n' { ' ' } else { ch }),
        );
    }

    pub fn handle(&mut self, event: &InputEvent) -> FieldEvent {
        let Some(key) = event.pressed() else {
            return FieldEvent::Unchanged;
        };
        match key.code {
            KeyCode::Backspace => {
                if self.buffer.pop().is_some() {
                    FieldEvent::Changed
                } else {
                    FieldEvent::Unchanged
                }
            }
            KeyCode::Enter => {
                let text = self.buffer.trim();
                if text.is_empty() {
                    FieldEvent::Unchanged
                } else {
                    FieldEvent::Submitted(text.to_string())
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.clear();
                FieldEvent::Changed
            }
            _ => match event.typed_char() {
                Some(ch) => {
                    self.buffer.push(ch);
                    FieldEvent::Changed
                }
                None => FieldEvent::Unchanged,
            },
        }
    }

    /// Draw `> text█` on `row` of the context, keeping the tail visible when
    /// the text is wider than the area.
    pub fn paint(&self, ctx: &mut RenderContext<'_>, row: u16, theme: &Theme, focused: bool) {
        let area = ctx.area();
        let width = area.width as usize;
        let style = Style::fg(theme.text).on(theme.background_light);
        ctx.fill(Rect::new(area.x, area.y.saturating_add(row), area.width, 1), style);

        let (body, body_style) = if self.buffer.is_empty() && !focused {
            (self.placeholder.clone(), Style::fg(theme.text_muted).on(theme.background_light))
        } else {
            let mut body = self.buffer.clone();
            if focused {
                body.push('█');
            }
            (body, style)
        };
        let room = width.saturating_sub(2);
        let shown = if display_width(&body) > room {
            let skip = body.chars().count().saturating_sub(room);
            body.chars().skip(skip).collect()
        } else {
            truncate_display(&body, room)
        };
        ctx.text_at(0, row, "> ", style.bold());
        ctx.text_at(2, row, &shown, body_style);
    }
}
