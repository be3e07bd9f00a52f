use crossterm::event::KeyCode;

use crate::error::Result;
use crate::geometry::{Dimensions, Rect};
use crate::input::{ActionTag, InputEvent};
use crate::logging::{LogLevel, Logger, json_str};
use crate::nav::{AppBarAction, AppBarData, Icon, ManagerHandle, NavItem, View, ViewId};
use crate::render::{RenderContext, Style};
use crate::theme::{Channel, SharedTheme, Theme, ThemeSlot};
use crate::widget::ListState;
use crate::width::truncate_display;

use super::target;

const RESET: ActionTag = ActionTag("reset_theme");
const STEP: i16 = 5;
const SWATCH_WIDTH: u16 = 4;

/// Edits the shared palette in place. The same type backs the theming side
/// panel, so every change is visible in the content half immediately.
pub struct ThemeEditorView {
    theme: SharedTheme,
    logger: Logger,
    manager: ManagerHandle,
    list: ListState,
    list_area: Rect,
    channel: Channel,
}

impl ThemeEditorView {
    pub fn new(theme: SharedTheme, logger: Logger) -> Self {
        let mut list = ListState::new(1);
        list.set_len(ThemeSlot::ALL.len());
        list.select(Some(0));
        Self {
            theme,
            logger,
            manager: ManagerHandle::new(),
            list,
            list_area: Rect::default(),
            channel: Channel::Red,
        }
    }

    fn slot(&self) -> ThemeSlot {
        let index = self.list.selected().unwrap_or(0);
        ThemeSlot::ALL[index.min(ThemeSlot::ALL.len() - 1)]
    }

    fn adjust(&mut self, delta: i16) {
        let slot = self.slot();
        let Ok(mut theme) = self.theme.write() else {
            return;
        };
        let color = theme.slot_mut(slot);
        color.adjust(self.channel, delta);
        let value = color.to_string();
        drop(theme);
        self.logger.emit(
            LogLevel::Debug,
            &target(ViewId::ThemeEditor),
            "theme_adjusted",
            [json_str("slot", slot.label()), json_str("color", value)],
        );
        self.manager.invalidate();
    }

    fn reset(&mut self) {
        if let Ok(mut theme) = self.theme.write() {
            *theme = Theme::default();
        }
        self.logger
            .emit(LogLevel::Info, &target(ViewId::ThemeEditor), "theme_reset", []);
        self.manager.invalidate();
    }
}

impl View for ThemeEditorView {
    fn name(&self) -> &'static str {
        ViewId::ThemeEditor.as_str()
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        for event in ctx.events() {
            if event.action() == Some(RESET) {
                self.reset();
                continue;
            }
            let Some(key) = event.pressed() else {
                self.list.handle(event, self.list_area);
                continue;
            };
            match key.code {
                KeyCode::Left => self.adjust(-STEP),
                KeyCode::Right => self.adjust(STEP),
                KeyCode::Tab => self.channel = self.channel.next(),
                _ => {
                    self.list.handle(event, self.list_area);
                }
            }
        }
        Ok(())
    }

    fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions> {
        let theme = crate::theme::snapshot(&self.theme);
        let (header, list_area) = ctx.area().split_top(2);
        self.list_area = list_area;

        let hint = format!("←/→ adjust {} · Tab channel", self.channel.label());
        let hint = truncate_display(&hint, header.width.saturating_sub(2) as usize);
        ctx.text(header.x + 1, header.y, &hint, Style::fg(theme.text_muted));

        let label_width = list_area.width.saturating_sub(SWATCH_WIDTH + 14) as usize;
        for (slot_row, index) in self.list.visible(list_area.height).enumerate() {
            let slot = ThemeSlot::ALL[index];
            let color = theme.slot(slot);
            let y = list_area.y + slot_row as u16;
            let selected = self.list.selected() == Some(index);
            let mut style = Style::fg(theme.on_primary);
            if selected {
                style = style.on(theme.background_light).bold();
                ctx.fill(Rect::new(list_area.x, y, list_area.width, 1), style);
            }
            ctx.fill(Rect::new(list_area.x + 1, y, SWATCH_WIDTH - 1, 1), Style::bg(color));
            let label = truncate_display(slot.label(), label_width);
            let x = list_area.x + SWATCH_WIDTH + 1;
            let used = ctx.text(x, y, &label, style);
            let value = if selected {
                format!("{} {}={}", color, self.channel.label(), color.channel(self.channel))
            } else {
                color.to_string()
            };
            ctx.text(x + used.max(label_width as u16) + 1, y, &value, style);
        }
        Ok(ctx.size())
    }

    fn app_bar_data(&self) -> AppBarData {
        AppBarData::titled("Theme")
            .with_action(AppBarAction::new("Reset", Icon::Clear, RESET).with_accelerator('r'))
    }

    fn nav_item(&self) -> Option<NavItem> {
        Some(NavItem::new("Theme", Icon::Theme))
    }

    fn set_manager(&mut self, manager: ManagerHandle) {
        self.manager = manager;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    use crate::theme::{self, Rgb};
    use crate::nav::ManagerRequest;
    use crate::views::testing::{attach, frame, requests};

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn right_brightens_the_selected_channel() {
        let shared = theme::shared(Theme::default());
        let mut view = ThemeEditorView::new(shared.clone(), Logger::null());
        let handle = attach(&mut view, ViewId::ThemeEditor);

        frame(&mut view, &[key(KeyCode::Right), key(KeyCode::Tab), key(KeyCode::Left)]);
        let dark = theme::snapshot(&shared).background_dark;
        assert_eq!(dark, Rgb::new(45, 35, 40));
        assert_eq!(
            requests(&handle),
            vec![ManagerRequest::Invalidate, ManagerRequest::Invalidate]
        );
    }

    #[test]
    fn moving_down_edits_the_next_slot() {
        let shared = theme::shared(Theme::default());
        let mut view = ThemeEditorView::new(shared.clone(), Logger::null());
        frame(&mut view, &[]);
        frame(&mut view, &[key(KeyCode::Down), key(KeyCode::Right)]);

        let palette = theme::snapshot(&shared);
        assert_eq!(palette.background_dark, Theme::default().background_dark);
        assert_eq!(palette.background_default, Rgb::new(65, 60, 60));
    }

    #[test]
    fn reset_restores_defaults_for_every_holder() {
        let shared = theme::shared(Theme::default());
        let mut editor = ThemeEditorView::new(shared.clone(), Logger::null());
        let mut panel = ThemeEditorView::new(shared.clone(), Logger::null());

        frame(&mut panel, &[key(KeyCode::Right)]);
        assert_ne!(theme::snapshot(&shared), Theme::default());
        frame(&mut editor, &[InputEvent::Action(RESET)]);
        assert_eq!(theme::snapshot(&shared), Theme::default());
    }

    #[test]
    fn paints_every_slot_label() {
        let mut view = ThemeEditorView::new(theme::shared(Theme::default()), Logger::null());
        let canvas = frame(&mut view, &[]);
        assert!(canvas.find_text("Background (dark)").is_some());
        assert!(canvas.find_text("Drawer").is_some());
        assert!(view.nav_item().is_some());
    }
}
