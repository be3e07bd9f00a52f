//! Navigation lifecycle audit hooks.
//!
//! The manager reports each structural transition as a [`NavAuditEvent`] so
//! callers can log, buffer or assert on the sequence without reaching into
//! manager internals.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAuditStage {
    ViewRegistered,
    ViewSwitched,
    ViewPopped,
    /// Back arrived with an empty stack and was left to the host.
    BackIgnored,
    BecameVisible,
    ClipboardDelivered,
    /// Delivery dropped because the requesting view is no longer current.
    ClipboardDropped,
    ViewFailed,
}

#[derive(Debug, Clone)]
pub struct NavAuditEvent {
    pub timestamp: SystemTime,
    pub stage: NavAuditStage,
    pub details: Vec<(String, Value)>,
}

impl NavAuditEvent {
    fn new(stage: NavAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct NavAuditEventBuilder {
    event: NavAuditEvent,
}

impl NavAuditEventBuilder {
    pub fn new(stage: NavAuditStage) -> Self {
        Self {
            event: NavAuditEvent::new(stage),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.details.push((key.into(), value.into()));
        self
    }

    pub fn finish(self) -> NavAuditEvent {
        self.event
    }
}

pub trait NavAudit: Send + Sync {
    fn record(&self, event: NavAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullNavAudit;

impl NavAudit for NullNavAudit {
    fn record(&self, _event: NavAuditEvent) {}
}

/// Keeps every event in memory; clones share the buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferedNavAudit {
    events: Arc<Mutex<Vec<NavAuditEvent>>>,
}

impl BufferedNavAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavAuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<NavAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    pub fn count(&self, stage: NavAuditStage) -> usize {
        self.events()
            .iter()
            .filter(|event| event.stage == stage)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl NavAudit for BufferedNavAudit {
    fn record(&self, event: NavAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
