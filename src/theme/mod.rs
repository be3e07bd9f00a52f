//! Colour palette shared by chrome and views.

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::render::Style;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    /// Shift one channel by `delta`, saturating at the ends of the range.
    pub fn adjust(&mut self, channel: Channel, delta: i16) {
        let slot = match channel {
            Channel::Red => &mut self.r,
            Channel::Green => &mut self.g,
            Channel::Blue => &mut self.b,
        };
        *slot = (*slot as i16 + delta).clamp(0, 255) as u8;
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub fn next(self) -> Self {
        match self {
            Channel::Red => Channel::Green,
            Channel::Green => Channel::Blue,
            Channel::Blue => Channel::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Red => "R",
            Channel::Green => "G",
            Channel::Blue => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub background_dark: Rgb,
    pub background_default: Rgb,
    pub background_light: Rgb,
    pub primary: Rgb,
    pub on_primary: Rgb,
    pub text: Rgb,
    pub text_muted: Rgb,
    pub reply_background: Rgb,
    pub reply_related: Rgb,
    pub reply_selected: Rgb,
    pub reply_accent: Rgb,
    pub drawer_background: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_dark: Rgb::gray(40),
            background_default: Rgb::gray(60),
            background_light: Rgb::gray(90),
            primary: Rgb::new(0, 95, 95),
            on_primary: Rgb::gray(250),
            text: Rgb::gray(15),
            text_muted: Rgb::gray(110),
            reply_background: Rgb::gray(175),
            reply_related: Rgb::gray(230),
            reply_selected: Rgb::gray(255),
            reply_accent: Rgb::new(0, 128, 128),
            drawer_background: Rgb::gray(235),
        }
    }
}

impl Theme {
    pub fn bar_style(&self) -> Style {
        Style::fg(self.on_primary).on(self.primary)
    }

    pub fn body_style(&self) -> Style {
        Style::fg(self.on_primary).on(self.background_default)
    }

    pub fn slot(&self, slot: ThemeSlot) -> Rgb {
        *self.slot_ref(slot)
    }

    pub fn slot_mut(&mut self, slot: ThemeSlot) -> &mut Rgb {
        match slot {
            ThemeSlot::BackgroundDark => &mut self.background_dark,
            ThemeSlot::BackgroundDefault => &mut self.background_default,
            ThemeSlot::BackgroundLight => &mut self.background_light,
            ThemeSlot::Primary => &mut self.primary,
            ThemeSlot::OnPrimary => &mut self.on_primary,
            ThemeSlot::Text => &mut self.text,
            ThemeSlot::TextMuted => &mut self.text_muted,
            ThemeSlot::ReplyBackground => &mut self.reply_background,
            ThemeSlot::ReplyRelated => &mut self.reply_related,
            ThemeSlot::ReplySelected => &mut self.reply_selected,
            ThemeSlot::ReplyAccent => &mut self.reply_accent,
            ThemeSlot::DrawerBackground => &mut self.drawer_background,
        }
    }

    fn slot_ref(&self, slot: ThemeSlot) -> &Rgb {
        match slot {
            ThemeSlot::BackgroundDark => &self.background_dark,
            ThemeSlot::BackgroundDefault => &self.background_default,
            ThemeSlot::BackgroundLight => &self.background_light,
            ThemeSlot::Primary => &self.primary,
            ThemeSlot::OnPrimary => &self.on_primary,
            ThemeSlot::Text => &self.text,
            ThemeSlot::TextMuted => &self.text_muted,
            ThemeSlot::ReplyBackground => &self.reply_background,
            ThemeSlot::ReplyRelated => &self.reply_related,
            ThemeSlot::ReplySelected => &self.reply_selected,
            ThemeSlot::ReplyAccent => &self.reply_accent,
            ThemeSlot::DrawerBackground => &self.drawer_background,
        }
    }
}

/// Every editable palette entry, in editor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSlot {
    BackgroundDark,
    BackgroundDefault,
    BackgroundLight,
    Primary,
    OnPrimary,
    Text,
    TextMuted,
    ReplyBackground,
    ReplyRelated,
    ReplySelected,
    ReplyAccent,
    DrawerBackground,
}

impl ThemeSlot {
    pub const ALL: [ThemeSlot; 12] = [
        ThemeSlot::BackgroundDark,
        ThemeSlot::BackgroundDefault,
        ThemeSlot::BackgroundLight,
        ThemeSlot::Primary,
        ThemeSlot::OnPrimary,
        ThemeSlot::Text,
        ThemeSlot::TextMuted,
        ThemeSlot::ReplyBackground,
        ThemeSlot::ReplyRelated,
        ThemeSlot::ReplySelected,
        ThemeSlot::ReplyAccent,
        ThemeSlot::DrawerBackground,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ThemeSlot::BackgroundDark => "Background (dark)",
            ThemeSlot::BackgroundDefault => "Background",
            ThemeSlot::BackgroundLight => "Background (light)",
            ThemeSlot::Primary => "Primary",
            ThemeSlot::OnPrimary => "On primary",
            ThemeSlot::Text => "Text",
            ThemeSlot::TextMuted => "Text (muted)",
            ThemeSlot::ReplyBackground => "Reply",
            ThemeSlot::ReplyRelated => "Reply (related)",
            ThemeSlot::ReplySelected => "Reply (selected)",
            ThemeSlot::ReplyAccent => "Reply accent",
            ThemeSlot::DrawerBackground => "Drawer",
        }
    }
}

/// Theme shared by reference between every view and the chrome.
pub type SharedTheme = Arc<RwLock<Theme>>;

pub fn shared(theme: Theme) -> SharedTheme {
    Arc::new(RwLock::new(theme))
}

/// Copy of the current theme; falls back to the default palette if the lock
/// was poisoned.
pub fn snapshot(theme: &SharedTheme) -> Theme {
    theme.read().map(|guard| guard.clone()).unwrap_or_default()
}
