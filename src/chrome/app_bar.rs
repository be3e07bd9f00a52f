use crossterm::event::{KeyCode, KeyModifiers};

use crate::geometry::Rect;
use crate::input::{ActionTag, InputEvent, KeyMap};
use crate::nav::{AppBarAction, AppBarData, Icon, OverflowAction};
use crate::render::RenderContext;
use crate::theme::Theme;
use crate::width::display_width;

pub const BAR_HEIGHT: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Contextual {
    title: String,
    actions: Vec<AppBarAction>,
    overflow: Vec<OverflowAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitTarget {
    NavIcon,
    Action(ActionTag),
    OverflowButton,
    OverflowItem(ActionTag),
}

/// What the bar made of one input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarInput {
    Ignored,
    Consumed,
    OpenDrawer,
    /// Forward to the view as this event instead.
    Forward(InputEvent),
}

/// Top app bar with its overflow menu and contextual mode.
#[derive(Debug, Clone)]
pub struct AppBar {
    visible: bool,
    title: String,
    actions: Vec<AppBarAction>,
    overflow: Vec<OverflowAction>,
    contextual: Option<Contextual>,
    overflow_open: bool,
    overflow_cursor: usize,
    hits: Vec<(Rect, HitTarget)>,
}

impl Default for AppBar {
    fn default() -> Self {
        Self {
            visible: true,
            title: String::new(),
            actions: Vec::new(),
            overflow: Vec::new(),
            contextual: None,
            overflow_open: false,
            overflow_cursor: 0,
            hits: Vec::new(),
        }
    }
}

impl AppBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a newly active view's declaration. Title and actions are only
    /// replaced when the bar is visible.
    pub fn apply(&mut self, data: &AppBarData) {
        self.visible = data.visible;
        if data.visible {
            self.title = data.title.clone();
            self.actions = data.actions.clone();
            self.overflow = data.overflow.clone();
        }
        self.hits.clear();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Title currently on screen, contextual title included.
    pub fn title(&self) -> &str {
        self.contextual
            .as_ref()
            .map_or(self.title.as_str(), |ctx| ctx.title.as_str())
    }

    pub fn actions(&self) -> &[AppBarAction] {
        self.contextual
            .as_ref()
            .map_or(self.actions.as_slice(), |ctx| ctx.actions.as_slice())
    }

    pub fn overflow(&self) -> &[OverflowAction] {
        self.contextual
            .as_ref()
            .map_or(self.overflow.as_slice(), |ctx| ctx.overflow.as_slice())
    }

    pub fn contextual_title(&self) -> Option<&str> {
        self.contextual.as_ref().map(|ctx| ctx.title.as_str())
    }

    pub fn in_contextual(&self) -> bool {
        self.contextual.is_some()
    }

    pub fn overflow_open(&self) -> bool {
        self.overflow_open
    }

    pub fn request_contextual(
        &mut self,
        title: String,
        actions: Vec<AppBarAction>,
        overflow: Vec<OverflowAction>,
    ) {
        self.contextual = Some(Contextual {
            title,
            actions,
            overflow,
        });
        self.close_overflow();
    }

    /// Returns whether anything changed.
    pub fn dismiss_contextual(&mut self) -> bool {
        let was = self.contextual.take().is_some();
        if was {
            self.close_overflow();
        }
        was
    }

    pub fn open_overflow(&mut self) -> bool {
        if self.overflow().is_empty() {
            return false;
        }
        self.overflow_open = true;
        self.overflow_cursor = 0;
        true
    }

    /// Returns whether the menu was open.
    pub fn close_overflow(&mut self) -> bool {
        let was = self.overflow_open;
        self.overflow_open = false;
        self.overflow_cursor = 0;
        was
    }

    pub fn handle_input(&mut self, event: &InputEvent, keys: &KeyMap) -> BarInput {
        if !self.visible {
            return BarInput::Ignored;
        }
        if self.overflow_open {
            return self.handle_overflow_input(event);
        }
        match event {
            InputEvent::Key(_) => {
                let Some(key) = event.pressed() else {
                    return BarInput::Ignored;
                };
                if self.in_contextual() && keys.back.matches(key) {
                    self.dismiss_contextual();
                    return BarInput::Forward(InputEvent::ContextualDismissed);
                }
                if keys.overflow.matches(key) {
                    return if self.open_overflow() {
                        BarInput::Consumed
                    } else {
                        BarInput::Ignored
                    };
                }
                if key.modifiers.contains(KeyModifiers::ALT) {
                    if let KeyCode::Char(ch) = key.code {
                        let ch = ch.to_ascii_lowercase();
                        if let Some(action) = self
                            .actions()
                            .iter()
                            .find(|action| action.accelerator == Some(ch))
                        {
                            return BarInput::Forward(InputEvent::Action(action.tag));
                        }
                    }
                }
                BarInput::Ignored
            }
            InputEvent::Click { column, row } => match self.hit(*column, *row) {
                Some(HitTarget::NavIcon) if self.in_contextual() => {
                    self.dismiss_contextual();
                    BarInput::Forward(InputEvent::ContextualDismissed)
                }
                Some(HitTarget::NavIcon) => BarInput::OpenDrawer,
                Some(HitTarget::Action(tag)) => BarInput::Forward(InputEvent::Action(tag)),
                Some(HitTarget::OverflowButton) => {
                    self.open_overflow();
                    BarInput::Consumed
                }
                Some(HitTarget::OverflowItem(_)) | None => BarInput::Ignored,
            },
            _ => BarInput::Ignored,
        }
    }

    fn handle_overflow_input(&mut self, event: &InputEvent) -> BarInput {
        let count = self.overflow().len();
        match event {
            InputEvent::Click { column, row } => {
                let hit = self.hit(*column, *row);
                self.close_overflow();
                match hit {
                    Some(HitTarget::OverflowItem(tag)) => {
                        BarInput::Forward(InputEvent::Action(tag))
                    }
                    _ => BarInput::Consumed,
                }
            }
            InputEvent::Key(_) => {
                let Some(key) = event.pressed() else {
                    return BarInput::Consumed;
                };
                match key.code {
                    KeyCode::Up => {
                        self.overflow_cursor = self.overflow_cursor.saturating_sub(1);
                        BarInput::Consumed
                    }
                    KeyCode::Down => {
                        if self.overflow_cursor + 1 < count {
                            self.overflow_cursor += 1;
                        }
                        BarInput::Consumed
                    }
                    KeyCode::Enter => {
                        let tag = self.overflow().get(self.overflow_cursor).map(|a| a.tag);
                        self.close_overflow();
                        tag.map_or(BarInput::Consumed, |tag| {
                            BarInput::Forward(InputEvent::Action(tag))
                        })
                    }
                    KeyCode::Esc => {
                        self.close_overflow();
                        BarInput::Consumed
                    }
                    _ => BarInput::Consumed,
                }
            }
            _ => BarInput::Consumed,
        }
    }

    fn hit(&self, column: u16, row: u16) -> Option<HitTarget> {
        self.hits
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(column, row))
            .map(|(_, target)| *target)
    }

    /// Paint the bar in the first row of `ctx` and, when open, the overflow
    /// menu below it on top of whatever the view drew there.
    pub fn paint(&mut self, ctx: &mut RenderContext<'_>, theme: &Theme, nav_icon: bool) {
        self.hits.clear();
        let area = ctx.area();
        let bar = Rect::new(area.x, area.y, area.width, BAR_HEIGHT.min(area.height));
        if bar.is_empty() {
            return;
        }
        let style = theme.bar_style();
        ctx.fill(bar, style);

        let mut x = bar.x;
        let leading = if self.in_contextual() {
            Some(Icon::Clear)
        } else if nav_icon {
            Some(Icon::Menu)
        } else {
            None
        };
        if let Some(icon) = leading {
            let label = format!(" {} ", icon.glyph());
            let used = ctx.text(x, bar.y, &label, style.bold());
            self.hits
                .push((Rect::new(x, bar.y, used, 1), HitTarget::NavIcon));
            x = x.saturating_add(used);
        }

        let mut right = bar.right();
        let has_overflow = !self.overflow().is_empty();
        if has_overflow {
            let label = format!(" {} ", Icon::Overflow.glyph());
            let width = display_width(&label) as u16;
            if right >= x.saturating_add(width) {
                right -= width;
                ctx.text(right, bar.y, &label, style);
                self.hits
                    .push((Rect::new(right, bar.y, width, 1), HitTarget::OverflowButton));
            }
        }

        let labels: Vec<(String, ActionTag)> = self
            .actions()
            .iter()
            .rev()
            .map(|action| (format!(" {} {} ", action.icon.glyph(), action.name), action.tag))
            .collect();
        for (label, tag) in labels {
            let width = display_width(&label) as u16;
            if right < x.saturating_add(width) {
                break;
            }
            right -= width;
            ctx.text(right, bar.y, &label, style);
            self.hits
                .push((Rect::new(right, bar.y, width, 1), HitTarget::Action(tag)));
        }

        let title = self.title().to_string();
        ctx.text(x.saturating_add(1), bar.y, &title, style.bold());

        if self.overflow_open {
            self.paint_overflow(ctx, theme, bar);
        }
    }

    fn paint_overflow(&mut self, ctx: &mut RenderContext<'_>, theme: &Theme, bar: Rect) {
        let entries: Vec<(String, ActionTag)> = self
            .overflow()
            .iter()
            .map(|action| (action.name.clone(), action.tag))
            .collect();
        let width = entries
            .iter()
            .map(|(name, _)| display_width(name) as u16 + 4)
            .max()
            .unwrap_or(0)
            .min(bar.width);
        let x = bar.right().saturating_sub(width);
        let menu_style = crate::render::Style::fg(theme.text).on(theme.background_light);
        for (idx, (name, tag)) in entries.iter().enumerate() {
            let y = bar.bottom().saturating_add(idx as u16);
            let row = Rect::new(x, y, width, 1);
            let style = if idx == self.overflow_cursor {
                menu_style.reversed()
            } else {
                menu_style
            };
            ctx.fill(row, style);
            ctx.text(x.saturating_add(2), y, name, style);
            self.hits.push((row, HitTarget::OverflowItem(*tag)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use std::time::Instant;

    use crate::render::OpList;

    const COPY: ActionTag = ActionTag("copy");
    const SETTINGS: ActionTag = ActionTag("settings");

    fn bar() -> AppBar {
        let mut bar = AppBar::new();
        bar.apply(
            &AppBarData::titled("Messages")
                .with_action(AppBarAction::new("Copy", Icon::Copy, COPY).with_accelerator('c'))
                .with_overflow(OverflowAction::new("Settings", SETTINGS)),
        );
        bar
    }

    fn paint(bar: &mut AppBar) -> OpList {
        let mut ops = OpList::new();
        let mut ctx = RenderContext::new(Rect::new(0, 0, 40, 10), Instant::now(), &[], &mut ops);
        bar.paint(&mut ctx, &Theme::default(), true);
        ops
    }

    #[test]
    fn alt_accelerator_becomes_action() {
        let mut bar = bar();
        let alt_c = InputEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::ALT));
        assert_eq!(
            bar.handle_input(&alt_c, &KeyMap::default()),
            BarInput::Forward(InputEvent::Action(COPY))
        );
    }

    #[test]
    fn clicks_hit_painted_actions_and_nav_icon() {
        let mut bar = bar();
        let ops = paint(&mut bar);
        assert!(ops.texts().any(|text| text.contains("Messages")));

        let keys = KeyMap::default();
        assert_eq!(
            bar.handle_input(&InputEvent::Click { column: 1, row: 0 }, &keys),
            BarInput::OpenDrawer
        );
        let (rect, _) = bar
            .hits
            .iter()
            .find(|(_, target)| *target == HitTarget::Action(COPY))
            .copied()
            .unwrap();
        assert_eq!(
            bar.handle_input(
                &InputEvent::Click {
                    column: rect.x,
                    row: 0
                },
                &keys
            ),
            BarInput::Forward(InputEvent::Action(COPY))
        );
    }

    #[test]
    fn overflow_menu_owns_keys_until_closed() {
        let mut bar = bar();
        let keys = KeyMap::default();
        let ctrl_o = InputEvent::Key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert_eq!(bar.handle_input(&ctrl_o, &keys), BarInput::Consumed);
        assert!(bar.overflow_open());

        let typed = InputEvent::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
        assert_eq!(bar.handle_input(&typed, &keys), BarInput::Consumed);

        let enter = InputEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(
            bar.handle_input(&enter, &keys),
            BarInput::Forward(InputEvent::Action(SETTINGS))
        );
        assert!(!bar.overflow_open());
    }

    #[test]
    fn contextual_close_dismisses_and_notifies() {
        let mut bar = bar();
        bar.request_contextual("1 selected".into(), Vec::new(), Vec::new());
        paint(&mut bar);
        assert_eq!(bar.title(), "1 selected");
        assert_eq!(
            bar.handle_input(&InputEvent::Click { column: 1, row: 0 }, &KeyMap::default()),
            BarInput::Forward(InputEvent::ContextualDismissed)
        );
        assert!(!bar.in_contextual());
        assert_eq!(bar.title(), "Messages");
    }

    #[test]
    fn hidden_bar_keeps_previous_title() {
        let mut bar = bar();
        bar.apply(&AppBarData::hidden());
        assert!(!bar.is_visible());
        assert_eq!(bar.title(), "Messages");
    }
}
