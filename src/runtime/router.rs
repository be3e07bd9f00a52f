//! Platform events: what the terminal produces and where each one goes.

use std::time::Instant;

use crossterm::event::{
    Event as CrosstermEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use crate::geometry::Size;
use crate::input::{InputEvent, KeyMap};
use crate::logging::{LogLevel, Logger, RUNTIME_TARGET, json_kv, json_str};
use crate::nav::{EventFlow, NavigationManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEvent {
    pub size: Size,
    pub now: Instant,
}

/// Events delivered by the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The window is going away, with an error when it failed.
    Destroy { error: Option<String> },
    ClipboardDelivered(String),
    /// Platform back command; structural, never seen by `update`.
    Back,
    Frame(FrameEvent),
    Input(InputEvent),
    Resize(Size),
}

impl PlatformEvent {
    pub fn describe(&self) -> &'static str {
        match self {
            PlatformEvent::Destroy { .. } => "destroy",
            PlatformEvent::ClipboardDelivered(_) => "clipboard",
            PlatformEvent::Back => "back",
            PlatformEvent::Frame(_) => "frame",
            PlatformEvent::Input(_) => "input",
            PlatformEvent::Resize(_) => "resize",
        }
    }
}

/// What the loop should do after an event was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Ignored,
    Redraw,
    Render(FrameEvent),
    Resized(Size),
    /// Back was not consumed; the host's default action applies.
    HostBack,
    Exit { error: Option<String> },
}

/// Dispatches platform events to the navigation manager and holds input
/// until the next frame.
pub struct EventRouter {
    pending: Vec<InputEvent>,
    logger: Logger,
}

impl EventRouter {
    pub fn new(logger: Logger) -> Self {
        Self {
            pending: Vec::new(),
            logger,
        }
    }

    pub fn route(&mut self, manager: &mut NavigationManager, event: PlatformEvent) -> Routed {
        match event {
            PlatformEvent::Destroy { error } => {
                let level = if error.is_some() {
                    LogLevel::Error
                } else {
                    LogLevel::Info
                };
                self.logger.emit(
                    level,
                    RUNTIME_TARGET,
                    "window_destroyed",
                    [json_str("error", error.clone().unwrap_or_default())],
                );
                Routed::Exit { error }
            }
            PlatformEvent::ClipboardDelivered(text) => {
                manager.handle_clipboard(&text);
                Routed::Redraw
            }
            PlatformEvent::Back => match manager.handle_back_navigation() {
                EventFlow::Consumed => Routed::Redraw,
                EventFlow::Continue => Routed::HostBack,
            },
            PlatformEvent::Frame(frame) => Routed::Render(frame),
            PlatformEvent::Input(input) => {
                self.pending.push(input);
                Routed::Redraw
            }
            PlatformEvent::Resize(size) => {
                self.logger.emit(
                    LogLevel::Debug,
                    RUNTIME_TARGET,
                    "resized",
                    [json_kv("width", size.width), json_kv("height", size.height)],
                );
                Routed::Resized(size)
            }
        }
    }

    /// Input queued since the last frame, oldest first.
    pub fn take_pending(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Map a terminal event onto a platform event. `escape_captured` is set while
/// chrome owns Escape, in which case it is ordinary input.
pub fn translate(
    event: CrosstermEvent,
    keys: &KeyMap,
    escape_captured: bool,
) -> Option<PlatformEvent> {
    match event {
        CrosstermEvent::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return None;
            }
            if keys.is_quit(&key) {
                Some(PlatformEvent::Destroy { error: None })
            } else if keys.back.matches(&key) && !escape_captured {
                Some(PlatformEvent::Back)
            } else {
                Some(PlatformEvent::Input(InputEvent::Key(key)))
            }
        }
        CrosstermEvent::Mouse(mouse) => translate_mouse(mouse).map(PlatformEvent::Input),
        CrosstermEvent::Paste(text) => Some(PlatformEvent::ClipboardDelivered(text)),
        CrosstermEvent::Resize(width, height) => Some(PlatformEvent::Resize(Size::new(width, height))),
        CrosstermEvent::FocusGained | CrosstermEvent::FocusLost => None,
    }
}

fn translate_mouse(mouse: MouseEvent) -> Option<InputEvent> {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::Click { column, row }),
        MouseEventKind::ScrollDown => Some(InputEvent::Scroll {
            column,
            row,
            down: true,
        }),
        MouseEventKind::ScrollUp => Some(InputEvent::Scroll {
            column,
            row,
            down: false,
        }),
        _ => None,
    }
}
