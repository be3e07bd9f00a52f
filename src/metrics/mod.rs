use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated by the navigation manager and the frame loop.
#[derive(Debug, Default, Clone)]
pub struct ShellMetrics {
    frames: u64,
    events: u64,
    view_switches: u64,
    back_pops: u64,
    backs_ignored: u64,
    clipboard_deliveries: u64,
    bar_paints: u64,
    drawer_paints: u64,
    last_frame: Duration,
}

impl ShellMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self, took: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.last_frame = took;
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_switch(&mut self) {
        self.view_switches = self.view_switches.saturating_add(1);
    }

    pub fn record_back(&mut self, consumed: bool) {
        if consumed {
            self.back_pops = self.back_pops.saturating_add(1);
        } else {
            self.backs_ignored = self.backs_ignored.saturating_add(1);
        }
    }

    pub fn record_clipboard_delivery(&mut self) {
        self.clipboard_deliveries = self.clipboard_deliveries.saturating_add(1);
    }

    pub fn record_bar_paint(&mut self) {
        self.bar_paints = self.bar_paints.saturating_add(1);
    }

    pub fn record_drawer_paint(&mut self) {
        self.drawer_paints = self.drawer_paints.saturating_add(1);
    }

    pub fn bar_paints(&self) -> u64 {
        self.bar_paints
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            frames: self.frames,
            events: self.events,
            view_switches: self.view_switches,
            back_pops: self.back_pops,
            backs_ignored: self.backs_ignored,
            clipboard_deliveries: self.clipboard_deliveries,
            bar_paints: self.bar_paints,
            drawer_paints: self.drawer_paints,
            last_frame_us: self.last_frame.as_micros() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub frames: u64,
    pub events: u64,
    pub view_switches: u64,
    pub back_pops: u64,
    pub backs_ignored: u64,
    pub clipboard_deliveries: u64,
    pub bar_paints: u64,
    pub drawer_paints: u64,
    pub last_frame_us: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "shell_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("frames".to_string(), json!(self.frames));
        map.insert("events".to_string(), json!(self.events));
        map.insert("view_switches".to_string(), json!(self.view_switches));
        map.insert("back_pops".to_string(), json!(self.back_pops));
        map.insert("backs_ignored".to_string(), json!(self.backs_ignored));
        map.insert(
            "clipboard_deliveries".to_string(),
            json!(self.clipboard_deliveries),
        );
        map.insert("bar_paints".to_string(), json!(self.bar_paints));
        map.insert("drawer_paints".to_string(), json!(self.drawer_paints));
        map.insert("last_frame_us".to_string(), json!(self.last_frame_us));
        map
    }

    /// One-line summary shown by the profiling overlay.
    pub fn overlay_line(&self) -> String {
        format!(
            "frame {:.2}ms · frames {} · events {} · switches {} · back {}",
            self.last_frame_us as f64 / 1000.0,
            self.frames,
            self.events,
            self.view_switches,
            self.back_pops
        )
    }
}
