use crossterm::event::KeyCode;

use crate::config::{NOTICE_VERSION, SettingsHandle, after_consent};
use crate::error::Result;
use crate::geometry::Dimensions;
use crate::logging::{LogLevel, Logger, json_kv};
use crate::nav::{AppBarData, ManagerHandle, View, ViewId};
use crate::render::{RenderContext, Style};
use crate::theme::{self, SharedTheme};
use crate::width::truncate_display;

use super::target;

const NOTICE: &[&str] = &[
    "This client is experimental software.",
    "Everything you post is public and signed by your identity.",
    "Replies cannot be deleted once relayed.",
];

/// First-launch notice. Runs full screen with the app bar hidden.
pub struct ConsentView {
    settings: SettingsHandle,
    theme: SharedTheme,
    logger: Logger,
    manager: ManagerHandle,
}

impl ConsentView {
    pub fn new(settings: SettingsHandle, theme: SharedTheme, logger: Logger) -> Self {
        Self {
            settings,
            theme,
            logger,
            manager: ManagerHandle::new(),
        }
    }

    fn accept(&mut self) {
        self.settings
            .update(|settings| settings.acknowledged_notice_version = NOTICE_VERSION);
        self.logger.emit(
            LogLevel::Info,
            &target(ViewId::Consent),
            "notice_acknowledged",
            [json_kv("version", NOTICE_VERSION)],
        );
        let next = after_consent(&self.settings.snapshot());
        self.manager.request_view_switch(next);
    }
}

impl View for ConsentView {
    fn name(&self) -> &'static str {
        ViewId::Consent.as_str()
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let accepted = ctx
            .events()
            .iter()
            .any(|event| event.is_key(KeyCode::Enter) || event.typed_char() == Some('a'));
        if accepted {
            self.accept();
        }
        Ok(())
    }

    fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions> {
        let theme = theme::snapshot(&self.theme);
        let width = ctx.area().width.saturating_sub(2) as usize;
        ctx.text_at(1, 1, "Before you start", Style::fg(theme.primary).bold());
        for (row, line) in NOTICE.iter().enumerate() {
            let line = truncate_display(line, width);
            ctx.text_at(1, 3 + row as u16, &line, Style::fg(theme.on_primary));
        }
        let footer = 4 + NOTICE.len() as u16;
        ctx.text_at(
            1,
            footer,
            "Press Enter or 'a' to accept",
            Style::fg(theme.text_muted),
        );
        Ok(ctx.size())
    }

    fn app_bar_data(&self) -> AppBarData {
        AppBarData::hidden()
    }

    fn set_manager(&mut self, manager: ManagerHandle) {
        self.manager = manager;
    }
}
