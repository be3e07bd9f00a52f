//! Startup configuration: CLI flags, persisted settings, the bootstrap table
//! and the runtime knobs in [`ShellConfig`].

mod bootstrap;
mod cli;
mod settings;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::ValueEnum;

use crate::input::KeyMap;
use crate::logging::Logger;
use crate::metrics::ShellMetrics;

pub use bootstrap::{
    APP_DIR, NOTICE_VERSION, after_consent, initial_view, prepare_data_dir, resolve_data_dir,
};
pub use cli::Cli;
pub use settings::{SETTINGS_FILE, Settings, SettingsError, SettingsFile, SettingsHandle};

/// Which view receives clipboard contents once the host delivers them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ClipboardRouting {
    /// Whatever view is current at delivery time.
    #[default]
    ActiveView,
    /// Only the view that asked for the paste; dropped if it is no longer
    /// current. Unsolicited deliveries still go to the current view.
    Requester,
}

/// Knobs for the shell runtime.
#[derive(Clone)]
pub struct ShellConfig {
    /// Upper bound on how long the loop blocks waiting for input.
    pub frame_interval: Duration,
    /// Structured logger shared with the manager and views.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for the overlay and periodic snapshots.
    pub metrics: Option<Arc<Mutex<ShellMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    pub clipboard_routing: ClipboardRouting,
    pub keymap: KeyMap,
    /// Exit when back is pressed with nothing left to pop.
    pub exit_on_unhandled_back: bool,
    pub profiling: bool,
    pub theming: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(100),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(30),
            clipboard_routing: ClipboardRouting::default(),
            keymap: KeyMap::default(),
            exit_on_unhandled_back: true,
            profiling: false,
            theming: false,
        }
    }
}

impl ShellConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(ShellMetrics::new())));
        }
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<ShellMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }

    pub fn logger(&self) -> Logger {
        self.logger.clone().unwrap_or_else(Logger::null)
    }
}
