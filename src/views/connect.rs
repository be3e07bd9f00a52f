use std::sync::Arc;

use crate::config::SettingsHandle;
use crate::error::Result;
use crate::geometry::Dimensions;
use crate::input::{ActionTag, InputEvent};
use crate::logging::{LogLevel, Logger, json_str};
use crate::nav::{AppBarAction, AppBarData, Icon, ManagerHandle, View, ViewId};
use crate::render::{RenderContext, Style};
use crate::store::{ConversationStore, RelayWorker};
use crate::theme::{self, SharedTheme};
use crate::widget::{FieldEvent, TextField};

use super::{log_store_error, target};

const PASTE: ActionTag = ActionTag("paste");
const CONNECT: ActionTag = ActionTag("connect");

/// Asks for the relay address.
pub struct ConnectFormView {
    settings: SettingsHandle,
    store: Arc<dyn ConversationStore>,
    relay: Arc<dyn RelayWorker>,
    theme: SharedTheme,
    logger: Logger,
    manager: ManagerHandle,
    address: TextField,
}

impl ConnectFormView {
    pub fn new(
        settings: SettingsHandle,
        store: Arc<dyn ConversationStore>,
        relay: Arc<dyn RelayWorker>,
        theme: SharedTheme,
        logger: Logger,
    ) -> Self {
        Self {
            settings,
            store,
            relay,
            theme,
            logger,
            manager: ManagerHandle::new(),
            address: TextField::new("host:port"),
        }
    }

    fn submit(&mut self, address: String) {
        self.settings.update(|settings| settings.address = address.clone());
        self.relay.restart(&address);
        self.logger.emit(
            LogLevel::Info,
            &target(ViewId::ConnectForm),
            "address_set",
            [json_str("address", address)],
        );

        let identity = self.settings.snapshot().active_identity;
        let known = match identity.map(|id| self.store.identity(&id)) {
            Some(Ok(found)) => found.is_some(),
            Some(Err(err)) => {
                log_store_error(&self.logger, ViewId::ConnectForm, "identity_lookup_failed", err);
                false
            }
            None => false,
        };
        let next = if known {
            ViewId::CommunityMenu
        } else {
            ViewId::IdentityForm
        };
        self.manager.request_view_switch(next);
    }
}

impl View for ConnectFormView {
    fn name(&self) -> &'static str {
        ViewId::ConnectForm.as_str()
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        for event in ctx.events() {
            match event {
                InputEvent::Action(PASTE) => self.manager.request_clipboard_paste(),
                InputEvent::Action(CONNECT) => {
                    if !self.address.is_blank() {
                        let address = self.address.text().trim().to_string();
                        self.submit(address);
                    }
                }
                _ => {
                    if let FieldEvent::Submitted(address) = self.address.handle(event) {
                        self.submit(address);
                    }
                }
            }
        }
        Ok(())
    }

    fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions> {
        let theme = theme::snapshot(&self.theme);
        let body = Style::fg(theme.on_primary);
        ctx.text_at(1, 1, "Relay address", body.bold());
        self.address.paint(ctx, 3, &theme, true);
        ctx.text_at(
            1,
            5,
            "Enter to connect · Alt+V to paste",
            Style::fg(theme.text_muted),
        );
        Ok(ctx.size())
    }

    fn handle_clipboard(&mut self, text: &str) {
        self.address.insert(text.trim());
    }

    fn become_visible(&mut self) {
        let address = self.settings.snapshot().address;
        self.address.set_text(address);
    }

    fn app_bar_data(&self) -> AppBarData {
        AppBarData::titled("Connect")
            .with_action(AppBarAction::new("Paste", Icon::Paste, PASTE).with_accelerator('v'))
            .with_action(AppBarAction::new("Connect", Icon::SendReply, CONNECT).with_accelerator('s'))
    }

    fn set_manager(&mut self, manager: ManagerHandle) {
        self.manager = manager;
    }
}
