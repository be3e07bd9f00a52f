use std::time::Instant;

use crate::geometry::{Rect, Size};
use crate::input::InputEvent;
use crate::width::char_width;

use super::{CallOp, DrawOp, Macro, OpList, Style};

/// Per-frame context handed to views and chrome.
///
/// Carries the area the callee may draw into, the frame's input events and
/// the op buffer. Every drawing call is clipped to `area`.
pub struct RenderContext<'a> {
    area: Rect,
    now: Instant,
    events: &'a [InputEvent],
    ops: &'a mut OpList,
}

impl<'a> RenderContext<'a> {
    pub fn new(area: Rect, now: Instant, events: &'a [InputEvent], ops: &'a mut OpList) -> Self {
        Self {
            area,
            now,
            events,
            ops,
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn size(&self) -> Size {
        self.area.size()
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Input events delivered for this frame.
    pub fn events(&self) -> &'a [InputEvent] {
        self.events
    }

    /// Narrow the context to `area` (clipped to the current area).
    pub fn child(&mut self, area: Rect) -> RenderContext<'_> {
        RenderContext {
            area: self.area.intersect(area),
            now: self.now,
            events: self.events,
            ops: &mut *self.ops,
        }
    }

    /// Same area, but a different set of input events.
    pub fn with_events<'b>(&'b mut self, events: &'b [InputEvent]) -> RenderContext<'b> {
        RenderContext {
            area: self.area,
            now: self.now,
            events,
            ops: &mut *self.ops,
        }
    }

    pub fn fill(&mut self, area: Rect, style: Style) {
        let clipped = self.area.intersect(area);
        if clipped.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Fill {
            area: clipped,
            style,
        });
    }

    pub fn fill_all(&mut self, style: Style) {
        self.fill(self.area, style);
    }

    /// Draw `text` at absolute `(x, y)`, clipped to the context area.
    /// Returns the number of columns the text occupies after clipping.
    pub fn text(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        if y < self.area.y || y >= self.area.bottom() || x < self.area.x || x >= self.area.right()
        {
            return 0;
        }
        let max_width = self.area.right() - x;
        let mut used = 0u16;
        for ch in text.chars() {
            let w = char_width(ch) as u16;
            if used + w > max_width {
                break;
            }
            used += w;
        }
        if used == 0 {
            return 0;
        }
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            style,
            max_width,
        });
        used
    }

    /// Draw `text` relative to the top-left corner of the context area.
    pub fn text_at(&mut self, column: u16, row: u16, text: &str, style: Style) -> u16 {
        let x = self.area.x.saturating_add(column);
        let y = self.area.y.saturating_add(row);
        self.text(x, y, text, style)
    }

    /// Start recording ops for later replay.
    pub fn record(&self) -> Macro {
        Macro::new(self.ops.len())
    }

    pub fn stop(&mut self, recording: Macro) -> CallOp {
        recording.stop(self.ops)
    }

    pub fn replay(&mut self, call: CallOp) {
        call.add_to(self.ops);
    }
}
