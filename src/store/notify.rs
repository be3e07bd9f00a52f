use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::SettingsHandle;
use crate::logging::{LogLevel, Logger, STORE_TARGET, json_kv, json_str};

use super::Node;

/// Receives every node the store announces.
pub trait Notifier: Send + Sync {
    /// Returns `true` when the node produced a user-facing notification.
    fn notify(&self, node: &Node) -> bool;
}

/// Notifies about replies that arrived after launch and were written by
/// someone other than the active identity. The terminal has no notification
/// tray, so the notification is a log line.
pub struct LogNotifier {
    logger: Logger,
    launched_ms: u64,
    settings: SettingsHandle,
}

impl LogNotifier {
    pub fn new(logger: Logger, launched_ms: u64, settings: SettingsHandle) -> Self {
        Self {
            logger,
            launched_ms,
            settings,
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, node: &Node) -> bool {
        let Some(reply) = node.as_reply() else {
            return false;
        };
        if reply.created_ms <= self.launched_ms {
            return false;
        }
        if self.settings.snapshot().active_identity == Some(reply.author) {
            return false;
        }
        self.logger.emit(
            LogLevel::Info,
            STORE_TARGET,
            "new_reply",
            [
                json_str("reply", reply.id.short()),
                json_str("author", reply.author.short()),
                json_kv("created_ms", reply.created_ms),
            ],
        );
        true
    }
}

/// Relay connection collaborator; restarted whenever the address changes.
pub trait RelayWorker: Send + Sync {
    fn restart(&self, address: &str);
}

/// Relay worker that only records restarts in the log.
pub struct LoggingRelay {
    logger: Logger,
    restarts: AtomicUsize,
}

impl LoggingRelay {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::Relaxed)
    }
}

impl RelayWorker for LoggingRelay {
    fn restart(&self, address: &str) {
        let restarts = self.restarts.fetch_add(1, Ordering::Relaxed) + 1;
        self.logger.emit(
            LogLevel::Info,
            STORE_TARGET,
            "relay_restart",
            [json_str("address", address), json_kv("restarts", restarts)],
        );
    }
}
