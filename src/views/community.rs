use std::sync::Arc;

use crossterm::event::KeyCode;

use crate::config::SettingsHandle;
use crate::error::Result;
use crate::geometry::{Dimensions, Rect};
use crate::input::{ActionTag, InputEvent};
use crate::logging::{LogLevel, Logger, current_ms, json_str};
use crate::nav::{
    AppBarAction, AppBarData, Icon, ManagerHandle, NavItem, OverflowAction, View, ViewId,
};
use crate::render::{RenderContext, Style};
use crate::store::{Community, ConversationStore, Node};
use crate::theme::{self, SharedTheme};
use crate::widget::{FieldEvent, ListEvent, ListState, TextField};
use crate::width::truncate_display;

use super::{ActiveCommunity, log_store_error, target};

const NEW_COMMUNITY: ActionTag = ActionTag("new_community");
const CANCEL: ActionTag = ActionTag("cancel_community");
const THEME_EDITOR: ActionTag = ActionTag("open_theme_editor");

/// Lists known communities; picking one opens its reply thread.
pub struct CommunityMenuView {
    store: Arc<dyn ConversationStore>,
    settings: SettingsHandle,
    active: ActiveCommunity,
    theme: SharedTheme,
    logger: Logger,
    manager: ManagerHandle,
    communities: Vec<Community>,
    list: ListState,
    list_area: Rect,
    compose: Option<TextField>,
}

impl CommunityMenuView {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        settings: SettingsHandle,
        active: ActiveCommunity,
        theme: SharedTheme,
        logger: Logger,
    ) -> Self {
        Self {
            store,
            settings,
            active,
            theme,
            logger,
            manager: ManagerHandle::new(),
            communities: Vec::new(),
            list: ListState::new(1),
            list_area: Rect::default(),
            compose: None,
        }
    }

    fn refresh(&mut self) {
        match self.store.communities() {
            Ok(communities) => {
                self.communities = communities;
                self.list.set_len(self.communities.len());
            }
            Err(err) => log_store_error(&self.logger, ViewId::CommunityMenu, "communities_failed", err),
        }
    }

    fn open(&mut self, index: usize) {
        let Some(community) = self.communities.get(index) else {
            return;
        };
        if let Ok(mut active) = self.active.write() {
            *active = Some(community.id);
        }
        self.logger.emit(
            LogLevel::Info,
            &target(ViewId::CommunityMenu),
            "community_opened",
            [json_str("community", community.name.clone())],
        );
        self.manager.request_view_switch(ViewId::ReplyThread);
    }

    fn create(&mut self, name: String) {
        let Some(author) = self.settings.snapshot().active_identity else {
            log_store_error(
                &self.logger,
                ViewId::CommunityMenu,
                "community_create_failed",
                "no active identity",
            );
            return;
        };
        let community = Community::new(name, author, current_ms() as u64);
        if let Err(err) = self.store.add(Node::Community(community)) {
            log_store_error(&self.logger, ViewId::CommunityMenu, "community_create_failed", err);
            return;
        }
        self.compose = None;
        self.manager.dismiss_contextual_bar();
        self.refresh();
    }

    fn start_compose(&mut self) {
        self.compose = Some(TextField::new("community name"));
        self.manager.request_contextual_bar(
            "New community",
            vec![AppBarAction::new("Cancel", Icon::Clear, CANCEL)],
            Vec::new(),
        );
    }

    fn update_compose(&mut self, event: &InputEvent) -> bool {
        let Some(field) = self.compose.as_mut() else {
            return false;
        };
        if event.is_key(KeyCode::Esc) {
            self.compose = None;
            self.manager.dismiss_contextual_bar();
            return true;
        }
        if let FieldEvent::Submitted(name) = field.handle(event) {
            self.create(name);
        }
        true
    }
}

impl View for CommunityMenuView {
    fn name(&self) -> &'static str {
        ViewId::CommunityMenu.as_str()
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        self.refresh();
        for event in ctx.events() {
            match event {
                InputEvent::Action(NEW_COMMUNITY) => self.start_compose(),
                InputEvent::Action(CANCEL) | InputEvent::ContextualDismissed => {
                    if self.compose.take().is_some() {
                        self.manager.dismiss_contextual_bar();
                    }
                }
                InputEvent::Action(THEME_EDITOR) => {
                    self.manager.request_view_switch(ViewId::ThemeEditor)
                }
                _ => {
                    if self.update_compose(event) {
                        continue;
                    }
                    if let ListEvent::Activated(index) = self.list.handle(event, self.list_area) {
                        self.open(index);
                    }
                }
            }
        }
        Ok(())
    }

    fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions> {
        let theme = theme::snapshot(&self.theme);
        let area = ctx.area();
        let mut list_area = area;

        if let Some(field) = &self.compose {
            field.paint(ctx, 0, &theme, true);
            let (_, rest) = area.split_top(2);
            list_area = rest;
        }
        self.list_area = list_area;

        if self.communities.is_empty() {
            ctx.text(
                list_area.x + 1,
                list_area.y,
                "No communities yet. Alt+N creates one.",
                Style::fg(theme.text_muted),
            );
            return Ok(ctx.size());
        }

        let width = list_area.width.saturating_sub(2) as usize;
        for (slot, index) in self.list.visible(list_area.height).enumerate() {
            let community = &self.communities[index];
            let y = list_area.y + slot as u16;
            let mut style = Style::fg(theme.on_primary);
            if self.list.selected() == Some(index) {
                style = style.on(theme.background_light).bold();
                ctx.fill(Rect::new(list_area.x, y, list_area.width, 1), style);
            }
            let label = truncate_display(&format!("# {}", community.name), width);
            ctx.text(list_area.x + 1, y, &label, style);
        }
        Ok(ctx.size())
    }

    fn become_visible(&mut self) {
        self.refresh();
    }

    fn app_bar_data(&self) -> AppBarData {
        AppBarData::titled("Communities")
            .with_action(
                AppBarAction::new("New", Icon::CreateConversation, NEW_COMMUNITY)
                    .with_accelerator('n'),
            )
            .with_overflow(OverflowAction::new("Theme editor", THEME_EDITOR))
    }

    fn nav_item(&self) -> Option<NavItem> {
        Some(NavItem::new("Communities", Icon::Communities))
    }

    fn set_manager(&mut self, manager: ManagerHandle) {
        self.manager = manager;
    }
}
