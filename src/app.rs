//! Composition root: builds the shared collaborators once, hands each view
//! exactly the handles it needs and wires the store into the render loop.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{
    Cli, SettingsFile, SettingsHandle, ShellConfig, initial_view, prepare_data_dir,
    resolve_data_dir,
};
use crate::error::Result;
use crate::geometry::Size;
use crate::logging::{CONFIG_TARGET, FileSink, LogLevel, Logger, current_ms, json_str};
use crate::metrics::ShellMetrics;
use crate::nav::{NavigationManager, ViewId};
use crate::runtime::{RedrawSignal, ShellNotice, ShellRuntime};
use crate::store::{
    ConversationStore, LogNotifier, LoggingRelay, MemoryStore, Node, Notifier, RelayWorker,
    SubscriptionId,
};
use crate::theme::{self, SharedTheme, Theme};
use crate::views::{
    ActiveCommunity, CommunityMenuView, ConnectFormView, ConsentView, IdentityFormView,
    ReplyThreadView, ThemeEditorView, active_community,
};

pub const LOG_FILE: &str = "arbor.log";

/// Everything that outlives a single view.
pub struct AppState {
    pub data_dir: Option<PathBuf>,
    pub settings: SettingsHandle,
    pub store: Arc<dyn ConversationStore>,
    pub relay: Arc<dyn RelayWorker>,
    pub notifier: Arc<dyn Notifier>,
    pub theme: SharedTheme,
    pub active: ActiveCommunity,
    pub logger: Logger,
    pub launched_ms: u64,
    subscription: Option<SubscriptionId>,
}

impl AppState {
    /// Resolve the data directory, open the log file and load settings.
    /// Failures are logged and the shell continues without persistence.
    pub fn from_cli(cli: &Cli) -> Self {
        let data_dir = resolve_data_dir(cli.data_dir.clone());
        let prepared = data_dir.clone().map(prepare_data_dir);
        let (data_dir, dir_error) = match prepared {
            Some(Ok(dir)) => (Some(dir), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => (None, Some("no platform data directory".to_string())),
        };

        let log_path = cli
            .log_file
            .clone()
            .or_else(|| data_dir.as_ref().map(|dir| dir.join(LOG_FILE)));
        let logger = log_path
            .and_then(|path| FileSink::new(path, cli.log_max_bytes).ok())
            .map(Logger::new)
            .unwrap_or_else(Logger::null);

        if let Some(error) = dir_error {
            logger.emit(
                LogLevel::Warn,
                CONFIG_TARGET,
                "data_dir_unavailable",
                [json_str("error", error)],
            );
        }
        Self::new(data_dir, logger)
    }

    pub fn new(data_dir: Option<PathBuf>, logger: Logger) -> Self {
        let settings = match &data_dir {
            Some(dir) => SettingsHandle::load(SettingsFile::in_dir(dir), logger.clone()),
            None => SettingsHandle::in_memory(Default::default()),
        };
        let launched_ms = current_ms() as u64;
        let store: Arc<dyn ConversationStore> = Arc::new(MemoryStore::new());
        let relay: Arc<dyn RelayWorker> = Arc::new(LoggingRelay::new(logger.clone()));
        let notifier: Arc<dyn Notifier> =
            Arc::new(LogNotifier::new(logger.clone(), launched_ms, settings.clone()));
        Self {
            data_dir,
            settings,
            store,
            relay,
            notifier,
            theme: theme::shared(Theme::default()),
            active: active_community(),
            logger,
            launched_ms,
            subscription: None,
        }
    }

    /// Persist a relay address given on the command line and restart the
    /// relay worker with it.
    pub fn apply_address(&self, address: &str) {
        let address = address.trim();
        if address.is_empty() {
            return;
        }
        self.settings
            .update(|settings| settings.address = address.to_string());
        self.relay.restart(address);
        self.logger.emit(
            LogLevel::Info,
            CONFIG_TARGET,
            "address_from_cli",
            [json_str("address", address)],
        );
    }

    /// Register every view, attach the theme panel and activate the first
    /// view chosen by the bootstrap table.
    pub fn build_manager(&self, config: &ShellConfig) -> Result<NavigationManager> {
        let metrics = config
            .metrics_handle()
            .unwrap_or_else(|| Arc::new(std::sync::Mutex::new(ShellMetrics::new())));
        let mut manager = NavigationManager::new(self.logger.clone(), metrics, self.theme.clone())
            .with_clipboard_routing(config.clipboard_routing)
            .with_keymap(config.keymap.clone());

        manager.register_view(
            ViewId::Consent,
            Box::new(ConsentView::new(
                self.settings.clone(),
                self.theme.clone(),
                self.logger.clone(),
            )),
        )?;
        manager.register_view(
            ViewId::ConnectForm,
            Box::new(ConnectFormView::new(
                self.settings.clone(),
                self.store.clone(),
                self.relay.clone(),
                self.theme.clone(),
                self.logger.clone(),
            )),
        )?;
        manager.register_view(
            ViewId::IdentityForm,
            Box::new(IdentityFormView::new(
                self.settings.clone(),
                self.store.clone(),
                self.theme.clone(),
                self.logger.clone(),
            )),
        )?;
        manager.register_view(
            ViewId::CommunityMenu,
            Box::new(CommunityMenuView::new(
                self.store.clone(),
                self.settings.clone(),
                self.active.clone(),
                self.theme.clone(),
                self.logger.clone(),
            )),
        )?;
        manager.register_view(
            ViewId::ReplyThread,
            Box::new(ReplyThreadView::new(
                self.store.clone(),
                self.settings.clone(),
                self.active.clone(),
                self.theme.clone(),
                self.logger.clone(),
            )),
        )?;
        manager.register_view(
            ViewId::ThemeEditor,
            Box::new(ThemeEditorView::new(self.theme.clone(), self.logger.clone())),
        )?;
        manager.set_theme_panel(Box::new(ThemeEditorView::new(
            self.theme.clone(),
            self.logger.clone(),
        )));

        let first = initial_view(&self.settings.snapshot());
        manager.request_view_switch(first)?;
        Ok(manager)
    }

    /// Forward new replies to the render loop and the notifier. The callback
    /// runs on whichever thread added the node.
    pub fn subscribe(&mut self, signal: RedrawSignal) {
        if let Some(previous) = self.subscription.take() {
            self.store.unsubscribe(previous);
        }
        let notifier = Arc::clone(&self.notifier);
        let id = self
            .store
            .subscribe_new_messages(Box::new(move |node: &Node| {
                if node.as_reply().is_none() {
                    return;
                }
                signal.notify(ShellNotice::NewMessage(node.id()));
                notifier.notify(node);
            }));
        self.subscription = Some(id);
    }

    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
    }

    /// Manager, runtime and store subscription in one step.
    pub fn build_runtime(&mut self, config: ShellConfig, size: Size) -> Result<ShellRuntime> {
        let manager = self.build_manager(&config)?;
        let signal = RedrawSignal::default();
        self.subscribe(signal.clone());
        Ok(ShellRuntime::new(manager, self.theme.clone(), config, size).with_signal(signal))
    }
}

/// Runtime knobs derived from the command line.
pub fn shell_config(cli: &Cli, logger: Logger) -> ShellConfig {
    let mut config = ShellConfig {
        logger: Some(logger),
        clipboard_routing: cli.clipboard_routing,
        profiling: cli.profile,
        theming: cli.theme_editor,
        ..ShellConfig::default()
    };
    config.enable_metrics();
    config
}
