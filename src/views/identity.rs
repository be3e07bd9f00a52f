use std::sync::Arc;

use crate::config::SettingsHandle;
use crate::error::Result;
use crate::geometry::Dimensions;
use crate::input::{ActionTag, InputEvent};
use crate::logging::{LogLevel, Logger, current_ms, json_str};
use crate::nav::{AppBarAction, AppBarData, Icon, ManagerHandle, View, ViewId};
use crate::render::{RenderContext, Style};
use crate::store::{ConversationStore, Identity, Node};
use crate::theme::{self, SharedTheme};
use crate::widget::{FieldEvent, TextField};

use super::{log_store_error, target};

const CREATE: ActionTag = ActionTag("create_identity");

/// Creates the local identity and makes it the active one.
pub struct IdentityFormView {
    settings: SettingsHandle,
    store: Arc<dyn ConversationStore>,
    theme: SharedTheme,
    logger: Logger,
    manager: ManagerHandle,
    name: TextField,
}

impl IdentityFormView {
    pub fn new(
        settings: SettingsHandle,
        store: Arc<dyn ConversationStore>,
        theme: SharedTheme,
        logger: Logger,
    ) -> Self {
        Self {
            settings,
            store,
            theme,
            logger,
            manager: ManagerHandle::new(),
            name: TextField::new("display name"),
        }
    }

    fn submit(&mut self, name: String) {
        let identity = Identity::new(name, current_ms() as u64);
        let id = identity.id;
        if let Err(err) = self.store.add(Node::Identity(identity)) {
            log_store_error(&self.logger, ViewId::IdentityForm, "identity_create_failed", err);
            return;
        }
        self.settings.update(|settings| settings.active_identity = Some(id));
        self.logger.emit(
            LogLevel::Info,
            &target(ViewId::IdentityForm),
            "identity_created",
            [json_str("identity", id.to_hex())],
        );
        self.name.clear();
        self.manager.request_view_switch(ViewId::CommunityMenu);
    }
}

impl View for IdentityFormView {
    fn name(&self) -> &'static str {
        ViewId::IdentityForm.as_str()
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        for event in ctx.events() {
            if event.action() == Some(CREATE) {
                if !self.name.is_blank() {
                    let name = self.name.text().trim().to_string();
                    self.submit(name);
                }
                continue;
            }
            if let FieldEvent::Submitted(name) = self.name.handle(event) {
                self.submit(name);
            }
        }
        Ok(())
    }

    fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions> {
        let theme = theme::snapshot(&self.theme);
        ctx.text_at(1, 1, "Choose a name", Style::fg(theme.on_primary).bold());
        self.name.paint(ctx, 3, &theme, true);
        ctx.text_at(
            1,
            5,
            "Others see this next to your replies.",
            Style::fg(theme.text_muted),
        );
        Ok(ctx.size())
    }

    fn app_bar_data(&self) -> AppBarData {
        AppBarData::titled("Create identity")
            .with_action(AppBarAction::new("Create", Icon::SendReply, CREATE).with_accelerator('s'))
    }

    fn set_manager(&mut self, manager: ManagerHandle) {
        self.manager = manager;
    }
}
