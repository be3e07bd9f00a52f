use crate::geometry::{Rect, Size};
use crate::theme::Rgb;
use crate::width::char_width;

use super::{DrawOp, OpList};

/// Cell styling. `None` colours inherit from whatever is already painted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub bold: bool,
    pub dim: bool,
    pub reverse: bool,
}

impl Style {
    pub fn fg(color: Rgb) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    pub fn bg(color: Rgb) -> Self {
        Self {
            bg: Some(color),
            ..Self::default()
        }
    }

    pub fn on(mut self, color: Rgb) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    fn over(self, below: Style) -> Style {
        Style {
            fg: self.fg.or(below.fg),
            bg: self.bg.or(below.bg),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: char,
    pub style: Style,
    /// Right half of a double-width glyph; skipped when emitting.
    pub continuation: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            symbol: ' ',
            style: Style::default(),
            continuation: false,
        }
    }
}

/// In-memory cell grid that a frame's ops are applied to.
#[derive(Debug, Clone)]
pub struct Canvas {
    size: Size,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            cells: vec![Cell::default(); size.width as usize * size.height as usize],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        if size != self.size {
            *self = Self::new(size);
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    pub fn apply(&mut self, ops: &OpList) {
        for op in ops.ops() {
            match op {
                DrawOp::Fill { area, style } => self.fill(*area, *style),
                DrawOp::Text {
                    x,
                    y,
                    text,
                    style,
                    max_width,
                } => self.put_text(*x, *y, text, *style, *max_width),
            }
        }
    }

    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.size.height {
            return &[];
        }
        let width = self.size.width as usize;
        let start = y as usize * width;
        &self.cells[start..start + width]
    }

    /// Plain text of a row, for assertions and diagnostics.
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .iter()
            .filter(|cell| !cell.continuation)
            .map(|cell| cell.symbol)
            .collect()
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    /// First `(x, y)` at which `needle` appears, scanning rows top-down.
    pub fn find_text(&self, needle: &str) -> Option<(u16, u16)> {
        (0..self.size.height).find_map(|y| {
            let text = self.row_text(y);
            text.find(needle).map(|byte_idx| {
                let column: usize = text[..byte_idx].chars().map(char_width).sum();
                (column as u16, y)
            })
        })
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    fn fill(&mut self, area: Rect, style: Style) {
        let area = area.intersect(Rect::from_size(self.size));
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(idx) = self.index(x, y) {
                    let below = self.cells[idx].style;
                    self.cells[idx] = Cell {
                        symbol: ' ',
                        style: style.over(below),
                        continuation: false,
                    };
                }
            }
        }
    }

    fn put_text(&mut self, x: u16, y: u16, text: &str, style: Style, max_width: u16) {
        let limit = x.saturating_add(max_width).min(self.size.width);
        let mut column = x;
        for ch in text.chars() {
            if ch == '\n' {
                break;
            }
            let w = char_width(ch) as u16;
            if w == 0 {
                continue;
            }
            if column + w > limit {
                break;
            }
            if let Some(idx) = self.index(column, y) {
                let below = self.cells[idx].style;
                self.cells[idx] = Cell {
                    symbol: ch,
                    style: style.over(below),
                    continuation: false,
                };
            }
            if w == 2 {
                if let Some(idx) = self.index(column + 1, y) {
                    let below = self.cells[idx].style;
                    self.cells[idx] = Cell {
                        symbol: ' ',
                        style: style.over(below),
                        continuation: true,
                    };
                }
            }
            column += w;
        }
    }
}
