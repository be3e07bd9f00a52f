use std::io::Write;

use blake3::Hash;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};

use crate::error::Result;

use super::{Canvas, Cell, Style};

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    pub restore_cursor: Option<(u16, u16)>,
    /// Emit every row on every frame instead of only the changed ones.
    pub full_redraw: bool,
}

/// ANSI renderer that re-emits only rows whose encoded bytes changed since
/// the previous frame.
pub struct AnsiRenderer {
    settings: RendererSettings,
    row_hashes: Vec<Option<Hash>>,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self {
            settings,
            row_hashes: Vec::new(),
        }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Forget what is on screen so the next frame repaints every row.
    pub fn invalidate(&mut self) {
        self.row_hashes.clear();
    }

    /// Write changed rows of `canvas` to `writer`, returning how many rows
    /// were emitted.
    pub fn render(&mut self, writer: &mut impl Write, canvas: &Canvas) -> Result<usize> {
        let height = canvas.size().height as usize;
        if self.row_hashes.len() != height {
            self.row_hashes = vec![None; height];
        }

        let mut written = 0usize;
        let mut line = Vec::new();
        for y in 0..canvas.size().height {
            line.clear();
            encode_row(&mut line, y, canvas.row(y))?;
            let hash = blake3::hash(&line);
            let slot = &mut self.row_hashes[y as usize];
            if !self.settings.full_redraw && *slot == Some(hash) {
                continue;
            }
            *slot = Some(hash);
            writer.write_all(&line)?;
            written += 1;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            queue!(writer, MoveTo(col, row))?;
        }

        writer.flush()?;
        Ok(written)
    }
}

fn encode_row(buf: &mut Vec<u8>, y: u16, cells: &[Cell]) -> Result<()> {
    queue!(buf, MoveTo(0, y))?;
    let mut active: Option<Style> = None;
    let mut run = String::new();
    for cell in cells.iter().filter(|cell| !cell.continuation) {
        if active != Some(cell.style) {
            if !run.is_empty() {
                queue!(buf, Print(&run))?;
                run.clear();
            }
            apply_style(buf, cell.style)?;
            active = Some(cell.style);
        }
        run.push(cell.symbol);
    }
    if !run.is_empty() {
        queue!(buf, Print(&run))?;
    }
    queue!(buf, SetAttribute(Attribute::Reset))?;
    Ok(())
}

fn apply_style(buf: &mut Vec<u8>, style: Style) -> Result<()> {
    queue!(buf, SetAttribute(Attribute::Reset))?;
    if let Some(fg) = style.fg {
        queue!(buf, SetForegroundColor(to_color(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(buf, SetBackgroundColor(to_color(bg)))?;
    }
    if style.bold {
        queue!(buf, SetAttribute(Attribute::Bold))?;
    }
    if style.dim {
        queue!(buf, SetAttribute(Attribute::Dim))?;
    }
    if style.reverse {
        queue!(buf, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

fn to_color(rgb: crate::theme::Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}
