//! Input delivered to chrome and views during a frame's update pass.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Identifies an app-bar or overflow action; chrome turns activations into
/// [`InputEvent::Action`] for the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionTag(pub &'static str);

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Click { column: u16, row: u16 },
    Scroll { column: u16, row: u16, down: bool },
    /// An app-bar, overflow or contextual action was activated.
    Action(ActionTag),
    /// The contextual bar was closed from the chrome side.
    ContextualDismissed,
}

impl InputEvent {
    /// The key event, if this is a press or repeat (releases are ignored).
    pub fn pressed(&self) -> Option<&KeyEvent> {
        match self {
            InputEvent::Key(key) if key.kind != KeyEventKind::Release => Some(key),
            _ => None,
        }
    }

    /// Plain character typed without Ctrl/Alt.
    pub fn typed_char(&self) -> Option<char> {
        let key = self.pressed()?;
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match key.code {
            KeyCode::Char(ch) => Some(ch),
            _ => None,
        }
    }

    pub fn is_key(&self, code: KeyCode) -> bool {
        self.pressed().is_some_and(|key| key.code == code)
    }

    pub fn action(&self) -> Option<ActionTag> {
        match self {
            InputEvent::Action(tag) => Some(*tag),
            _ => None,
        }
    }
}

/// A key plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn ctrl(ch: char) -> Self {
        Self {
            code: KeyCode::Char(ch),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.kind != KeyEventKind::Release
            && key.code == self.code
            && key.modifiers.contains(self.modifiers)
    }
}

/// Shell-level key bindings; everything else is view input.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Toggles the navigation drawer (the app bar's menu icon).
    pub menu: KeyBinding,
    /// Opens the app bar's overflow menu.
    pub overflow: KeyBinding,
    /// Moves input between the active view and the theme side panel.
    pub panel_focus: KeyBinding,
    /// Destroys the window.
    pub quit: Vec<KeyBinding>,
    /// Platform back command.
    pub back: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            menu: KeyBinding::ctrl('n'),
            overflow: KeyBinding::ctrl('o'),
            panel_focus: KeyBinding::plain(KeyCode::F(2)),
            quit: vec![KeyBinding::ctrl('q'), KeyBinding::ctrl('c')],
            back: KeyBinding::plain(KeyCode::Esc),
        }
    }
}

impl KeyMap {
    pub fn is_quit(&self, key: &KeyEvent) -> bool {
        self.quit.iter().any(|binding| binding.matches(key))
    }
}
