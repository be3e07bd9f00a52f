use chrono::{DateTime, Utc};

use crate::geometry::Rect;
use crate::render::{RenderContext, Style};
use crate::theme::{Rgb, Theme};
use crate::width::{display_width, truncate_display};

/// Rows taken by one reply: header, content and a spacer.
pub const REPLY_ROW_HEIGHT: u16 = 3;

/// How a reply relates to the selected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    None,
    /// Same thread as the selection.
    Conversation,
    Ancestor,
    Descendant,
    Selected,
}

impl Highlight {
    pub fn indent(self) -> u16 {
        match self {
            Highlight::None => 0,
            Highlight::Conversation => 1,
            Highlight::Ancestor | Highlight::Selected => 2,
            Highlight::Descendant => 3,
        }
    }

    pub fn background(self, theme: &Theme) -> Rgb {
        match self {
            Highlight::Selected => theme.reply_selected,
            Highlight::Ancestor | Highlight::Descendant => theme.reply_related,
            Highlight::None | Highlight::Conversation => theme.reply_background,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplyRow<'a> {
    /// Empty when the author could not be resolved.
    pub author: &'a str,
    pub created_ms: u64,
    pub content: &'a str,
    pub highlight: Highlight,
}

/// `YYYY/MM/DD HH:MM` in UTC; blank for timestamps out of range.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.format("%Y/%m/%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Paint one reply card in the first rows of `area`.
pub fn paint_reply(ctx: &mut RenderContext<'_>, area: Rect, row: &ReplyRow<'_>, theme: &Theme) {
    let indent = row.highlight.indent().min(area.width);
    let card = Rect::new(
        area.x + indent,
        area.y,
        area.width - indent,
        (REPLY_ROW_HEIGHT - 1).min(area.height),
    );
    if card.is_empty() {
        return;
    }
    let base = Style::fg(theme.text).on(row.highlight.background(theme));
    ctx.fill(card, base);
    if row.highlight != Highlight::None {
        let accent = Style::fg(theme.reply_accent);
        for y in card.y..card.bottom() {
            ctx.text(card.x, y, "▌", accent);
        }
    }

    let author = if row.author.is_empty() { " " } else { row.author };
    let x = (card.x + 2).saturating_add(ctx.text(card.x + 2, card.y, author, base.bold()));
    let date = format_timestamp(row.created_ms);
    let date_x = card
        .right()
        .saturating_sub(display_width(&date) as u16 + 1)
        .max(x.saturating_add(2));
    ctx.text(date_x, card.y, &date, Style::fg(theme.text_muted));

    if card.height > 1 {
        let room = (card.width as usize).saturating_sub(3);
        let first_line = row.content.lines().next().unwrap_or_default();
        let mut content = truncate_display(first_line, room);
        if display_width(&content) < display_width(row.content) && room > 1 {
            content = truncate_display(first_line, room - 1);
            content.push('…');
        }
        ctx.text(card.x + 2, card.y + 1, &content, base);
    }
}
