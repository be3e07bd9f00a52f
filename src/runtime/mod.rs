//! The render loop: polls the terminal, routes platform events, paints
//! frames and carries out host requests from the navigation manager.

pub mod driver;
mod host;
mod router;
mod signal;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event;
use serde_json::json;

use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::geometry::{Rect, Size};
use crate::logging::{LogLevel, Logger, RUNTIME_TARGET, event_with_fields, json_kv};
use crate::metrics::ShellMetrics;
use crate::nav::{HostRequest, NavigationManager};
use crate::render::{AnsiRenderer, Canvas, OpList, RenderContext, Style};
use crate::theme::{self, SharedTheme};

pub use host::{HostWindow, MemoryHost, TerminalHost, osc52_sequence};
pub use router::{EventRouter, FrameEvent, PlatformEvent, Routed, translate};
pub use signal::{RedrawSignal, ShellNotice};

pub struct ShellRuntime {
    manager: NavigationManager,
    router: EventRouter,
    canvas: Canvas,
    renderer: AnsiRenderer,
    config: ShellConfig,
    logger: Logger,
    metrics: Arc<Mutex<ShellMetrics>>,
    signal: RedrawSignal,
    theme: SharedTheme,
    size: Size,
    should_exit: bool,
    exit_error: Option<String>,
    redraw_requested: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl ShellRuntime {
    pub fn new(
        mut manager: NavigationManager,
        theme: SharedTheme,
        config: ShellConfig,
        initial_size: Size,
    ) -> Self {
        let logger = config.logger();
        manager.set_profiling(config.profiling);
        if config.theming {
            manager.set_theming(true);
        }
        let metrics = manager.metrics();
        Self {
            manager,
            router: EventRouter::new(logger.clone()),
            canvas: Canvas::new(initial_size),
            renderer: AnsiRenderer::with_default(),
            config,
            logger,
            metrics,
            signal: RedrawSignal::default(),
            theme,
            size: initial_size,
            should_exit: false,
            exit_error: None,
            redraw_requested: true,
            start_instant: None,
            last_metrics_emit: None,
        }
    }

    /// Share an existing signal, e.g. one already wired into a store
    /// subscription.
    pub fn with_signal(mut self, signal: RedrawSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn signal(&self) -> RedrawSignal {
        self.signal.clone()
    }

    pub fn manager(&self) -> &NavigationManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut NavigationManager {
        &mut self.manager
    }

    /// What the last frame painted.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config_mut(&mut self) -> &mut ShellConfig {
        &mut self.config
    }

    pub fn run(&mut self, stdout: &mut impl Write, host: &mut dyn HostWindow) -> Result<()> {
        self.bootstrap(stdout, host)?;
        let mut last_frame = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .frame_interval
                .checked_sub(last_frame.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout)? {
                let raw = event::read()?;
                let escape_captured = self.manager.chrome().captures_escape();
                if let Some(platform) = translate(raw, &self.config.keymap, escape_captured) {
                    self.dispatch(platform, stdout, host)?;
                }
            }
            self.drain_notices();

            if self.redraw_requested || last_frame.elapsed() >= self.config.frame_interval {
                last_frame = Instant::now();
                if self.redraw_requested {
                    let frame = FrameEvent {
                        size: self.size,
                        now: last_frame,
                    };
                    self.dispatch(PlatformEvent::Frame(frame), stdout, host)?;
                }
            }

            self.maybe_emit_metrics();
        }

        self.finalize()
    }

    /// Feed `events` through the same routing as [`run`](Self::run), painting
    /// whenever an event asks for a redraw. Stops early on exit.
    pub fn run_scripted<I>(
        &mut self,
        stdout: &mut impl Write,
        host: &mut dyn HostWindow,
        events: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = PlatformEvent>,
    {
        self.bootstrap(stdout, host)?;
        for event in events {
            self.dispatch(event, stdout, host)?;
            self.drain_notices();
            self.render_if_needed(stdout, host)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize()
    }

    fn bootstrap(&mut self, stdout: &mut impl Write, host: &mut dyn HostWindow) -> Result<()> {
        self.should_exit = false;
        self.exit_error = None;
        self.redraw_requested = true;
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("width", self.size.width),
                json_kv("height", self.size.height),
                json_kv(
                    "view",
                    json!(self.manager.current().map(|id| id.as_str())),
                ),
            ],
        );
        self.apply_host_requests(stdout, host)?;
        self.render_if_needed(stdout, host)
    }

    fn finalize(&mut self) -> Result<()> {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );
        match self.exit_error.take() {
            Some(error) => Err(ShellError::Destroyed(error)),
            None => Ok(()),
        }
    }

    fn dispatch(
        &mut self,
        event: PlatformEvent,
        stdout: &mut impl Write,
        host: &mut dyn HostWindow,
    ) -> Result<()> {
        let kind = event.describe();
        if matches!(event, PlatformEvent::ClipboardDelivered(_)) {
            host.clipboard_delivered();
        }
        if !matches!(event, PlatformEvent::Frame(_)) {
            self.with_metrics(ShellMetrics::record_event);
        }

        let routed = self.router.route(&mut self.manager, event);
        self.log_runtime_event(
            LogLevel::Debug,
            "event_dispatched",
            [json_kv("event", kind), json_kv("routed", format!("{routed:?}"))],
        );
        match routed {
            Routed::Ignored => {}
            Routed::Redraw => self.redraw_requested = true,
            Routed::Render(frame) => {
                if frame.size != self.size {
                    self.resize(frame.size);
                }
                self.frame(frame.now, stdout, host)?;
            }
            Routed::Resized(size) => self.resize(size),
            Routed::HostBack => {
                if self.config.exit_on_unhandled_back {
                    self.log_runtime_event(LogLevel::Info, "back_exit", std::iter::empty());
                    self.should_exit = true;
                }
            }
            Routed::Exit { error } => {
                self.exit_error = error;
                self.should_exit = true;
            }
        }
        self.apply_host_requests(stdout, host)
    }

    fn render_if_needed(
        &mut self,
        stdout: &mut impl Write,
        host: &mut dyn HostWindow,
    ) -> Result<()> {
        if !self.redraw_requested || self.should_exit {
            return Ok(());
        }
        self.frame(Instant::now(), stdout, host)?;
        self.apply_host_requests(stdout, host)
    }

    /// Paint one frame: the window background, any host status on the last
    /// row, then the manager's chrome and active view above it.
    fn frame(
        &mut self,
        now: Instant,
        stdout: &mut impl Write,
        host: &mut dyn HostWindow,
    ) -> Result<()> {
        let started = Instant::now();
        self.redraw_requested = false;
        let events = self.router.take_pending();
        let theme = theme::snapshot(&self.theme);

        let mut ops = OpList::new();
        {
            let area = Rect::from_size(self.size);
            let mut ctx = RenderContext::new(area, now, &events, &mut ops);
            ctx.fill_all(theme.body_style());
            let content = match host.status() {
                Some(status) => {
                    let (content, row) = area.split_top(area.height.saturating_sub(1));
                    let style = Style::fg(theme.on_primary).on(theme.background_dark);
                    ctx.fill(row, style);
                    ctx.text(row.x + 1, row.y, status, style);
                    content
                }
                None => area,
            };
            // The status row sits outside the manager, so the drawer stays
            // the topmost layer of everything it covers.
            let mut shell = ctx.child(content);
            self.manager.layout(&mut shell);
        }

        self.canvas.clear();
        self.canvas.apply(&ops);
        let rows = self.renderer.render(stdout, &self.canvas)?;
        stdout.flush()?;

        let took = started.elapsed();
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_frame(took);
        }
        self.log_runtime_event(
            LogLevel::Debug,
            "frame_rendered",
            [
                json_kv("rows", rows),
                json_kv("events", events.len()),
                json_kv("took_us", took.as_micros() as u64),
            ],
        );
        Ok(())
    }

    fn apply_host_requests(
        &mut self,
        stdout: &mut impl Write,
        host: &mut dyn HostWindow,
    ) -> Result<()> {
        for request in self.manager.take_host_requests() {
            match request {
                HostRequest::Invalidate => {
                    host.invalidate();
                    self.redraw_requested = true;
                }
                HostRequest::ReadClipboard => {
                    host.read_clipboard(stdout)?;
                    self.redraw_requested = true;
                }
                HostRequest::WriteClipboard(text) => {
                    host.write_clipboard(stdout, &text)?;
                    self.log_runtime_event(
                        LogLevel::Debug,
                        "clipboard_written",
                        [json_kv("bytes", text.len())],
                    );
                }
            }
        }
        Ok(())
    }

    fn drain_notices(&mut self) {
        for notice in self.signal.drain() {
            if let ShellNotice::NewMessage(id) = notice {
                self.log_runtime_event(
                    LogLevel::Debug,
                    "new_message",
                    [json_kv("node", id.short())],
                );
            }
        }
        if self.signal.take_dirty() {
            self.redraw_requested = true;
        }
    }

    /// Adopt a new window size; the next frame repaints every row.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.canvas.resize(size);
        self.renderer.invalidate();
        self.redraw_requested = true;
    }

    fn with_metrics(&self, record: impl FnOnce(&mut ShellMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            record(&mut *metrics);
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval == Duration::from_millis(0) {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => {
                return;
            }
            _ => {
                self.last_metrics_emit = Some(now);
            }
        }

        let uptime = self
            .start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default();
        if let Ok(guard) = self.metrics.lock() {
            let snapshot_event = guard.snapshot(uptime).to_log_event(RUNTIME_TARGET);
            let _ = self.logger.log_event(snapshot_event);
        }
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let event = event_with_fields(level, RUNTIME_TARGET, message, fields);
        let _ = self.logger.log_event(event);
    }
}
