use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::chrome::{BAR_HEIGHT, ChromeCoordinator, ChromeSnapshot};
use crate::config::ClipboardRouting;
use crate::error::{Result, ShellError};
use crate::geometry::{Dimensions, Rect};
use crate::input::{InputEvent, KeyMap};
use crate::layout::{Constraint, Flex};
use crate::logging::{LogLevel, Logger, NAV_TARGET, json_kv, json_str};
use crate::metrics::ShellMetrics;
use crate::render::{RenderContext, Style};
use crate::theme::{self, SharedTheme, Theme};

use super::{
    AppBarAction, EventFlow, ManagerHandle, ManagerRequest, NavAudit, NavAuditEventBuilder,
    NavAuditStage, NavStack, NullNavAudit, OverflowAction, View, ViewId, ViewRegistry,
};

/// Request rounds applied after a single call into a view. A view that keeps
/// issuing requests from the hooks those requests trigger is cut off here.
pub const MAX_REQUEST_ROUNDS: usize = 8;

/// Effects the manager needs from the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    ReadClipboard,
    WriteClipboard(String),
    Invalidate,
}

/// Owns the views, the back stack and the chrome, and routes every
/// structural event. All methods run on the render loop.
pub struct NavigationManager {
    registry: ViewRegistry,
    stack: NavStack,
    current: Option<ViewId>,
    chrome: ChromeCoordinator,
    handle: ManagerHandle,
    outbox: Vec<HostRequest>,
    pending_paste: Option<ViewId>,
    routing: ClipboardRouting,
    keymap: KeyMap,
    logger: Logger,
    metrics: Arc<Mutex<ShellMetrics>>,
    audit: Arc<dyn NavAudit>,
    theme: SharedTheme,
    started: Instant,
    profiling: bool,
    theming: bool,
    theme_panel: Option<Box<dyn View>>,
    panel_focused: bool,
}

impl NavigationManager {
    pub fn new(logger: Logger, metrics: Arc<Mutex<ShellMetrics>>, theme: SharedTheme) -> Self {
        Self {
            registry: ViewRegistry::new(),
            stack: NavStack::new(),
            current: None,
            chrome: ChromeCoordinator::new(logger.clone()),
            handle: ManagerHandle::new(),
            outbox: Vec::new(),
            pending_paste: None,
            routing: ClipboardRouting::default(),
            keymap: KeyMap::default(),
            logger,
            metrics,
            audit: Arc::new(NullNavAudit),
            theme,
            started: Instant::now(),
            profiling: false,
            theming: false,
            theme_panel: None,
            panel_focused: false,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn NavAudit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_clipboard_routing(mut self, routing: ClipboardRouting) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_keymap(mut self, keymap: KeyMap) -> Self {
        self.keymap = keymap;
        self
    }

    /// Handle not attributed to any view; requests from it act for whichever
    /// view is current when they are applied.
    pub fn handle(&self) -> ManagerHandle {
        self.handle.clone()
    }

    pub fn current(&self) -> Option<ViewId> {
        self.current
    }

    pub fn stack(&self) -> &NavStack {
        &self.stack
    }

    pub fn is_registered(&self, id: ViewId) -> bool {
        self.registry.contains(id)
    }

    pub fn view(&self, id: ViewId) -> Option<&dyn View> {
        self.registry.get(id)
    }

    pub fn chrome(&self) -> &ChromeCoordinator {
        &self.chrome
    }

    pub fn chrome_snapshot(&self) -> ChromeSnapshot {
        self.chrome.snapshot()
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn metrics(&self) -> Arc<Mutex<ShellMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Host effects produced since the last call, oldest first.
    pub fn take_host_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Add a view during bootstrap. A declared nav item becomes a drawer
    /// entry and the view receives its manager handle.
    pub fn register_view(&mut self, id: ViewId, mut view: Box<dyn View>) -> Result<()> {
        if self.registry.contains(id) {
            return Err(ShellError::DuplicateView(id));
        }
        let nav_item = view.nav_item();
        if let Some(item) = nav_item.clone() {
            self.chrome.add_nav_item(id, item);
        }
        view.set_manager(self.handle.for_view(id));
        self.registry.insert(id, view)?;
        self.audit.record(
            NavAuditEventBuilder::new(NavAuditStage::ViewRegistered)
                .detail("view", id.as_str())
                .detail("drawer", nav_item.is_some())
                .finish(),
        );
        Ok(())
    }

    /// Make `target` current, pushing the previous view onto the back stack.
    /// Requests the target issues from `become_visible` are applied before
    /// this returns.
    pub fn request_view_switch(&mut self, target: ViewId) -> Result<()> {
        self.switch_view(target)?;
        self.process_requests();
        Ok(())
    }

    fn switch_view(&mut self, target: ViewId) -> Result<()> {
        if !self.registry.contains(target) {
            self.logger.emit(
                LogLevel::Warn,
                NAV_TARGET,
                "switch_unknown_view",
                [json_str("target", target.as_str())],
            );
            return Err(ShellError::UnknownView(target));
        }

        let previous = self.current;
        if let Some(previous) = previous {
            self.stack.push(previous);
        }
        self.current = Some(target);
        self.refresh_chrome(target);
        self.with_metrics(ShellMetrics::record_switch);
        self.logger.emit(
            LogLevel::Info,
            NAV_TARGET,
            "view_switched",
            [
                json_kv("from", previous.map(ViewId::as_str)),
                json_str("to", target.as_str()),
                json_kv("depth", self.stack.len()),
            ],
        );
        self.audit.record(
            NavAuditEventBuilder::new(NavAuditStage::ViewSwitched)
                .detail("from", previous.map(ViewId::as_str))
                .detail("to", target.as_str())
                .detail("depth", self.stack.len())
                .finish(),
        );

        if let Some(view) = self.registry.get_mut(target) {
            view.become_visible();
            self.audit.record(
                NavAuditEventBuilder::new(NavAuditStage::BecameVisible)
                    .detail("view", target.as_str())
                    .finish(),
            );
        }
        self.outbox.push(HostRequest::Invalidate);
        Ok(())
    }

    /// Pop the back stack into current. An empty stack leaves everything as
    /// is and reports the event as not consumed. Popping restores a view
    /// without calling `become_visible`.
    pub fn handle_back_navigation(&mut self) -> EventFlow {
        let Some(previous) = self.stack.pop() else {
            self.with_metrics(|metrics| metrics.record_back(false));
            self.audit.record(
                NavAuditEventBuilder::new(NavAuditStage::BackIgnored)
                    .detail("current", self.current.map(ViewId::as_str))
                    .finish(),
            );
            return EventFlow::Continue;
        };

        let from = self.current.replace(previous);
        self.refresh_chrome(previous);
        self.outbox.push(HostRequest::Invalidate);
        self.with_metrics(|metrics| metrics.record_back(true));
        self.logger.emit(
            LogLevel::Info,
            NAV_TARGET,
            "view_popped",
            [
                json_kv("from", from.map(ViewId::as_str)),
                json_str("to", previous.as_str()),
                json_kv("depth", self.stack.len()),
            ],
        );
        self.audit.record(
            NavAuditEventBuilder::new(NavAuditStage::ViewPopped)
                .detail("from", from.map(ViewId::as_str))
                .detail("to", previous.as_str())
                .detail("depth", self.stack.len())
                .finish(),
        );
        EventFlow::Consumed
    }

    fn refresh_chrome(&mut self, id: ViewId) {
        self.chrome.set_destination(id);
        if let Some(view) = self.registry.get(id) {
            let data = view.app_bar_data();
            self.chrome.apply_app_bar_data(&data);
        }
    }

    /// Deliver clipboard contents from the host to the current view.
    pub fn handle_clipboard(&mut self, text: &str) {
        let requester = self.pending_paste.take();
        let Some(current) = self.current else {
            return;
        };
        if self.routing == ClipboardRouting::Requester {
            if let Some(requester) = requester.filter(|requester| *requester != current) {
                self.logger.emit(
                    LogLevel::Info,
                    NAV_TARGET,
                    "clipboard_dropped",
                    [
                        json_str("requester", requester.as_str()),
                        json_str("current", current.as_str()),
                    ],
                );
                self.audit.record(
                    NavAuditEventBuilder::new(NavAuditStage::ClipboardDropped)
                        .detail("requester", requester.as_str())
                        .detail("current", current.as_str())
                        .finish(),
                );
                return;
            }
        }

        if let Some(view) = self.registry.get_mut(current) {
            view.handle_clipboard(text);
        }
        self.with_metrics(ShellMetrics::record_clipboard_delivery);
        self.audit.record(
            NavAuditEventBuilder::new(NavAuditStage::ClipboardDelivered)
                .detail("view", current.as_str())
                .detail("chars", text.chars().count())
                .finish(),
        );
        self.outbox.push(HostRequest::Invalidate);
        self.process_requests();
    }

    /// Ask the host for clipboard contents on behalf of the current view.
    pub fn request_clipboard_paste(&mut self) {
        self.pending_paste = self.current;
        self.outbox.push(HostRequest::ReadClipboard);
    }

    pub fn update_clipboard(&mut self, text: impl Into<String>) {
        self.outbox.push(HostRequest::WriteClipboard(text.into()));
    }

    pub fn request_contextual_bar(
        &mut self,
        title: impl Into<String>,
        actions: Vec<AppBarAction>,
        overflow: Vec<OverflowAction>,
    ) {
        self.chrome
            .request_contextual_bar(title.into(), actions, overflow);
        self.outbox.push(HostRequest::Invalidate);
    }

    pub fn dismiss_contextual_bar(&mut self) {
        self.chrome.dismiss_contextual_bar();
    }

    pub fn dismiss_overflow(&mut self) {
        self.chrome.dismiss_overflow();
    }

    /// Show the frame-timing row above the content.
    pub fn set_profiling(&mut self, enabled: bool) {
        self.profiling = enabled;
        self.outbox.push(HostRequest::Invalidate);
    }

    pub fn profiling(&self) -> bool {
        self.profiling
    }

    /// Split the content area with the theme editor panel.
    pub fn set_theming(&mut self, enabled: bool) {
        if enabled && self.theme_panel.is_none() {
            self.logger
                .emit(LogLevel::Warn, NAV_TARGET, "theme_panel_missing", []);
        }
        self.theming = enabled;
        self.panel_focused = false;
        self.outbox.push(HostRequest::Invalidate);
    }

    pub fn theming(&self) -> bool {
        self.theming
    }

    /// View drawn in the right half while theming is on. It is not part of
    /// the registry and never becomes current.
    pub fn set_theme_panel(&mut self, mut panel: Box<dyn View>) {
        panel.set_manager(self.handle.clone());
        self.theme_panel = Some(panel);
    }

    /// Run one frame: chrome input, the active view's update and layout,
    /// the app bar on top of it and the drawer last.
    pub fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Dimensions {
        let theme = theme::snapshot(&self.theme);
        let mut events = self.chrome.filter_input(ctx.events(), &self.keymap);

        if let Some(destination) = self.chrome.take_destination_change() {
            if Some(destination) != self.current {
                if let Err(err) = self.switch_view(destination) {
                    self.log_error("drawer_switch_failed", &err);
                }
                self.process_requests();
            }
        }

        let mut content = ctx.area();
        if self.profiling {
            let (row, rest) = content.split_top(1);
            self.paint_profile_row(ctx, row, &theme);
            content = rest;
        }

        if self.theming && self.theme_panel.is_some() {
            let halves = Flex::row([Constraint::Percent(50), Constraint::Flex(1)]).split(content);
            let panel_events = self.route_panel_events(&mut events, halves[1]);
            {
                let mut child = ctx.child(halves[0]);
                let mut view_ctx = child.with_events(&events);
                self.layout_current_view(&mut view_ctx, &theme);
            }
            let mut child = ctx.child(halves[1]);
            let mut panel_ctx = child.with_events(&panel_events);
            self.layout_theme_panel(&mut panel_ctx);
        } else {
            let mut child = ctx.child(content);
            let mut view_ctx = child.with_events(&events);
            self.layout_current_view(&mut view_ctx, &theme);
        }

        if self.chrome.paint_drawer(ctx, &theme) {
            self.with_metrics(ShellMetrics::record_drawer_paint);
        }
        ctx.size()
    }

    /// Split events between the view and the theme panel. The panel focus
    /// key toggles which side receives keys; clicks and scrolls go by
    /// position.
    fn route_panel_events(
        &mut self,
        events: &mut Vec<InputEvent>,
        panel_area: Rect,
    ) -> Vec<InputEvent> {
        let mut panel = Vec::new();
        let mut kept = Vec::with_capacity(events.len());
        for event in events.drain(..) {
            if event
                .pressed()
                .is_some_and(|key| self.keymap.panel_focus.matches(key))
            {
                self.panel_focused = !self.panel_focused;
                continue;
            }
            let to_panel = match event {
                InputEvent::Key(_) => self.panel_focused,
                InputEvent::Click { column, row } | InputEvent::Scroll { column, row, .. } => {
                    panel_area.contains(column, row)
                }
                _ => false,
            };
            if to_panel {
                panel.push(event);
            } else {
                kept.push(event);
            }
        }
        *events = kept;
        panel
    }

    fn layout_current_view(&mut self, ctx: &mut RenderContext<'_>, theme: &Theme) {
        let Some(id) = self.current else {
            return;
        };

        if let Some(view) = self.registry.get_mut(id) {
            if let Err(err) = view.update(ctx) {
                let name = view.name();
                self.view_failed(id, name, "update", &err);
            }
        }
        self.process_requests();

        // The frame finishes with the view it started with, even if update
        // switched away; the switch already invalidated the window.
        let area = ctx.area();
        let bar_visible = self.chrome.bar_visible();
        let content = if bar_visible {
            area.split_top(BAR_HEIGHT).1
        } else {
            area
        };
        let bar = if bar_visible {
            let recording = ctx.record();
            self.chrome.paint_bar(ctx, theme);
            self.with_metrics(ShellMetrics::record_bar_paint);
            Some(ctx.stop(recording))
        } else {
            None
        };

        if let Some(view) = self.registry.get_mut(id) {
            let mut view_ctx = ctx.child(content);
            if let Err(err) = view.layout(&mut view_ctx) {
                let name = view.name();
                self.view_failed(id, name, "layout", &err);
            }
        }
        if let Some(bar) = bar {
            ctx.replay(bar);
        }
        self.process_requests();
    }

    fn layout_theme_panel(&mut self, ctx: &mut RenderContext<'_>) {
        let Some(panel) = self.theme_panel.as_mut() else {
            return;
        };
        let result = panel.update(ctx).and_then(|_| panel.layout(ctx));
        if let Err(err) = result {
            self.logger.emit(
                LogLevel::Error,
                "arbor::views.theme_panel",
                "view_failed",
                [json_str("error", err.to_string())],
            );
        }
        self.process_requests();
    }

    fn paint_profile_row(&self, ctx: &mut RenderContext<'_>, row: Rect, theme: &Theme) {
        let line = self
            .metrics
            .lock()
            .map(|metrics| metrics.snapshot(self.started.elapsed()).overlay_line())
            .unwrap_or_default();
        let style = Style::fg(theme.on_primary).on(theme.background_dark);
        let mut child = ctx.child(row);
        child.fill_all(style);
        child.text_at(1, 0, &line, style);
    }

    /// Apply queued view requests in FIFO order, for a bounded number of
    /// rounds.
    fn process_requests(&mut self) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            let batch = self.handle.drain();
            if batch.is_empty() {
                return;
            }
            for (from, request) in batch {
                self.apply_request(from, request);
            }
        }
        let dropped = self.handle.drain().len();
        if dropped > 0 {
            self.logger.emit(
                LogLevel::Warn,
                NAV_TARGET,
                "request_rounds_exhausted",
                [
                    json_kv("dropped", dropped),
                    json_kv("rounds", MAX_REQUEST_ROUNDS),
                ],
            );
        }
    }

    fn apply_request(&mut self, from: Option<ViewId>, request: ManagerRequest) {
        match request {
            ManagerRequest::SwitchTo(target) => {
                if let Err(err) = self.switch_view(target) {
                    self.log_error("switch_request_failed", &err);
                }
            }
            ManagerRequest::PasteRequested => {
                self.pending_paste = from.or(self.current);
                self.outbox.push(HostRequest::ReadClipboard);
            }
            ManagerRequest::WriteClipboard(text) => {
                self.outbox.push(HostRequest::WriteClipboard(text));
            }
            ManagerRequest::ContextualBar {
                title,
                actions,
                overflow,
            } => self.request_contextual_bar(title, actions, overflow),
            ManagerRequest::DismissContextual => self.chrome.dismiss_contextual_bar(),
            ManagerRequest::DismissOverflow => self.chrome.dismiss_overflow(),
            ManagerRequest::Invalidate => self.outbox.push(HostRequest::Invalidate),
        }
    }

    fn view_failed(&self, id: ViewId, name: &str, stage: &str, err: &ShellError) {
        self.logger.emit(
            LogLevel::Error,
            &format!("arbor::views.{name}"),
            "view_failed",
            [json_str("stage", stage), json_str("error", err.to_string())],
        );
        self.audit.record(
            NavAuditEventBuilder::new(NavAuditStage::ViewFailed)
                .detail("view", id.as_str())
                .detail("stage", stage)
                .finish(),
        );
    }

    fn log_error(&self, message: &str, err: &ShellError) {
        self.logger.emit(
            LogLevel::Error,
            NAV_TARGET,
            message,
            [json_str("error", err.to_string())],
        );
    }

    fn with_metrics(&self, record: impl FnOnce(&mut ShellMetrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            record(&mut *metrics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use crate::geometry::{Rect, Size};
    use crate::input::ActionTag;
    use crate::logging::MemorySink;
    use crate::nav::{AppBarData, BufferedNavAudit, Icon, NavItem};
    use crate::render::OpList;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Update(ViewId),
        Layout(ViewId),
        Clipboard(ViewId, String),
        Visible(ViewId),
        Clicked(ViewId),
    }

    type CallLog = Arc<Mutex<Vec<Call>>>;

    struct Recorder {
        id: ViewId,
        bar: AppBarData,
        nav: Option<NavItem>,
        calls: CallLog,
        manager: Option<ManagerHandle>,
        on_visible: Option<ViewId>,
        on_update: Option<ViewId>,
        fail_layout: bool,
    }

    impl Recorder {
        fn new(id: ViewId, calls: &CallLog) -> Self {
            Self {
                id,
                bar: AppBarData::titled(id.as_str()),
                nav: None,
                calls: Arc::clone(calls),
                manager: None,
                on_visible: None,
                on_update: None,
                fail_layout: false,
            }
        }

        fn hidden_bar(mut self) -> Self {
            self.bar = AppBarData::hidden();
            self
        }

        fn in_drawer(mut self, name: &str) -> Self {
            self.nav = Some(NavItem::new(name, Icon::Messages));
            self
        }

        fn log(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl View for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
            self.log(Call::Update(self.id));
            for event in ctx.events() {
                if matches!(event, InputEvent::Click { .. }) {
                    self.log(Call::Clicked(self.id));
                }
            }
            if ctx.events().iter().any(|event| event.is_key(KeyCode::Char('p'))) {
                if let Some(manager) = &self.manager {
                    manager.request_clipboard_paste();
                }
            }
            if let (Some(target), Some(manager)) = (self.on_update.take(), &self.manager) {
                manager.request_view_switch(target);
            }
            Ok(())
        }

        fn layout(&mut self, ctx: &mut RenderContext<'_>) -> Result<Dimensions> {
            self.log(Call::Layout(self.id));
            if self.fail_layout {
                return Err(ShellError::Backend("recorder layout".into()));
            }
            ctx.text_at(0, 0, self.id.as_str(), Style::default());
            Ok(ctx.size())
        }

        fn handle_clipboard(&mut self, text: &str) {
            self.log(Call::Clipboard(self.id, text.to_string()));
        }

        fn become_visible(&mut self) {
            self.log(Call::Visible(self.id));
            if let (Some(target), Some(manager)) = (self.on_visible, &self.manager) {
                manager.request_view_switch(target);
            }
        }

        fn app_bar_data(&self) -> AppBarData {
            self.bar.clone()
        }

        fn nav_item(&self) -> Option<NavItem> {
            self.nav.clone()
        }

        fn set_manager(&mut self, manager: ManagerHandle) {
            self.manager = Some(manager);
        }
    }

    struct Harness {
        manager: NavigationManager,
        calls: CallLog,
        audit: BufferedNavAudit,
        metrics: Arc<Mutex<ShellMetrics>>,
    }

    impl Harness {
        fn new() -> Self {
            Self::configured(Logger::null(), ClipboardRouting::ActiveView)
        }

        fn configured(logger: Logger, routing: ClipboardRouting) -> Self {
            let metrics = Arc::new(Mutex::new(ShellMetrics::new()));
            let audit = BufferedNavAudit::new();
            let manager = NavigationManager::new(
                logger,
                Arc::clone(&metrics),
                theme::shared(Theme::default()),
            )
            .with_audit(Arc::new(audit.clone()))
            .with_clipboard_routing(routing);
            Self {
                manager,
                calls: Arc::new(Mutex::new(Vec::new())),
                audit,
                metrics,
            }
        }

        fn with_views(ids: &[ViewId]) -> Self {
            let mut harness = Self::new();
            for id in ids {
                harness.register(Recorder::new(*id, &harness.calls));
            }
            harness
        }

        fn register(&mut self, recorder: Recorder) {
            let id = recorder.id;
            self.manager.register_view(id, Box::new(recorder)).unwrap();
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn frame(&mut self, events: &[InputEvent]) -> OpList {
            let mut ops = OpList::new();
            let mut ctx = RenderContext::new(
                Rect::from_size(Size::new(60, 12)),
                Instant::now(),
                events,
                &mut ops,
            );
            self.manager.layout(&mut ctx);
            ops
        }

        fn bar_paints(&self) -> u64 {
            self.metrics.lock().unwrap().bar_paints()
        }
    }

    const CONNECT: ViewId = ViewId::ConnectForm;
    const COMMUNITY: ViewId = ViewId::CommunityMenu;
    const REPLY: ViewId = ViewId::ReplyThread;

    fn key(ch: char) -> InputEvent {
        InputEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
    }

    #[test]
    fn n_switches_grow_stack_by_n() {
        let mut h = Harness::with_views(&ViewId::ALL);
        h.manager.request_view_switch(CONNECT).unwrap();
        assert!(h.manager.stack().is_empty());

        let targets = [
            COMMUNITY,
            REPLY,
            REPLY,
            ViewId::ThemeEditor,
            CONNECT,
            ViewId::Consent,
        ];
        for (n, target) in targets.iter().enumerate() {
            h.manager.request_view_switch(*target).unwrap();
            assert_eq!(h.manager.stack().len(), n + 1);
            assert_eq!(h.manager.current(), Some(*target));
        }
        assert_eq!(
            h.manager.stack().entries(),
            &[CONNECT, COMMUNITY, REPLY, REPLY, ViewId::ThemeEditor, CONNECT]
        );
    }

    #[test]
    fn back_on_empty_stack_is_not_consumed() {
        let mut h = Harness::with_views(&[CONNECT]);
        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Continue);
        assert_eq!(h.manager.current(), None);

        h.manager.request_view_switch(CONNECT).unwrap();
        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Continue);
        assert_eq!(h.manager.current(), Some(CONNECT));
        assert!(h.manager.stack().is_empty());
        assert_eq!(h.audit.count(NavAuditStage::BackIgnored), 2);
    }

    #[test]
    fn back_pops_exactly_one_entry() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY, REPLY]);
        for target in [CONNECT, COMMUNITY, REPLY] {
            h.manager.request_view_switch(target).unwrap();
        }
        h.manager.take_host_requests();

        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Consumed);
        assert_eq!(h.manager.current(), Some(COMMUNITY));
        assert_eq!(h.manager.stack().entries(), &[CONNECT]);
        assert_eq!(h.manager.take_host_requests(), vec![HostRequest::Invalidate]);
    }

    #[test]
    fn switch_then_back_round_trips() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY, REPLY]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.request_view_switch(COMMUNITY).unwrap();
        let before = h.manager.stack().clone();
        let snapshot = h.manager.chrome_snapshot();

        h.manager.request_view_switch(REPLY).unwrap();
        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Consumed);

        assert_eq!(h.manager.current(), Some(COMMUNITY));
        assert_eq!(h.manager.stack(), &before);
        assert_eq!(h.manager.chrome_snapshot(), snapshot);
    }

    #[test]
    fn connect_community_reply_scenario() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY, REPLY]);

        h.manager.request_view_switch(CONNECT).unwrap();
        assert_eq!(h.manager.stack().entries(), &[] as &[ViewId]);
        assert_eq!(h.manager.current(), Some(CONNECT));

        h.manager.request_view_switch(COMMUNITY).unwrap();
        assert_eq!(h.manager.stack().entries(), &[CONNECT]);
        assert_eq!(h.manager.current(), Some(COMMUNITY));

        h.manager.request_view_switch(REPLY).unwrap();
        assert_eq!(h.manager.stack().entries(), &[CONNECT, COMMUNITY]);
        assert_eq!(h.manager.current(), Some(REPLY));

        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Consumed);
        assert_eq!(h.manager.stack().entries(), &[CONNECT]);
        assert_eq!(h.manager.current(), Some(COMMUNITY));

        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Consumed);
        assert!(h.manager.stack().is_empty());
        assert_eq!(h.manager.current(), Some(CONNECT));

        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Continue);
        assert!(h.manager.stack().is_empty());
        assert_eq!(h.manager.current(), Some(CONNECT));
    }

    #[test]
    fn unknown_targets_and_duplicates_are_rejected() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager.request_view_switch(CONNECT).unwrap();
        let err = h.manager.request_view_switch(REPLY).unwrap_err();
        assert!(matches!(err, ShellError::UnknownView(ViewId::ReplyThread)));
        assert_eq!(h.manager.current(), Some(CONNECT));
        assert!(h.manager.stack().is_empty());

        let dup = h
            .manager
            .register_view(CONNECT, Box::new(Recorder::new(CONNECT, &h.calls)));
        assert!(matches!(dup, Err(ShellError::DuplicateView(ViewId::ConnectForm))));
    }

    #[test]
    fn become_visible_fires_on_switch_but_not_on_pop() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.request_view_switch(COMMUNITY).unwrap();
        assert_eq!(
            h.calls(),
            vec![Call::Visible(CONNECT), Call::Visible(COMMUNITY)]
        );

        h.clear_calls();
        h.manager.handle_back_navigation();
        assert!(h.calls().is_empty());
        h.frame(&[]);
        assert_eq!(h.calls(), vec![Call::Update(CONNECT), Call::Layout(CONNECT)]);
    }

    #[test]
    fn become_visible_precedes_first_layout() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.frame(&[]);
        assert_eq!(
            h.calls(),
            vec![
                Call::Visible(CONNECT),
                Call::Update(CONNECT),
                Call::Layout(CONNECT)
            ]
        );
    }

    #[test]
    fn hidden_bar_is_never_painted() {
        let mut h = Harness::new();
        h.register(Recorder::new(CONNECT, &h.calls));
        h.register(Recorder::new(ViewId::Consent, &h.calls).hidden_bar());

        h.manager.request_view_switch(CONNECT).unwrap();
        h.frame(&[]);
        let painted = h.bar_paints();
        assert_eq!(painted, 1);

        h.manager.request_view_switch(ViewId::Consent).unwrap();
        for _ in 0..3 {
            let ops = h.frame(&[]);
            assert!(!ops.texts().any(|text| text.contains("connect_form")));
        }
        assert_eq!(h.bar_paints(), painted);
        assert!(!h.manager.chrome_snapshot().bar_visible);
    }

    #[test]
    fn bar_is_replayed_after_view_content() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager.request_view_switch(CONNECT).unwrap();
        let ops = h.frame(&[]);
        let texts: Vec<&str> = ops.texts().collect();
        let view_pos = texts.iter().position(|t| *t == "connect_form").unwrap();
        let bar_pos = texts.iter().rposition(|t| *t == "connect_form").unwrap();
        assert!(view_pos < bar_pos);
    }

    #[test]
    fn clipboard_reaches_only_the_current_view() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY, REPLY]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.request_view_switch(COMMUNITY).unwrap();
        h.clear_calls();

        h.manager.handle_clipboard("relay:7117");
        assert_eq!(
            h.calls(),
            vec![Call::Clipboard(COMMUNITY, "relay:7117".into())]
        );
        assert_eq!(h.audit.count(NavAuditStage::ClipboardDelivered), 1);
    }

    #[test]
    fn paste_request_from_view_reaches_host() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.take_host_requests();
        h.frame(&[key('p')]);
        assert!(
            h.manager
                .take_host_requests()
                .contains(&HostRequest::ReadClipboard)
        );
    }

    #[test]
    fn active_view_routing_delivers_after_navigation() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.frame(&[key('p')]);
        h.manager.request_view_switch(COMMUNITY).unwrap();
        h.clear_calls();

        h.manager.handle_clipboard("late");
        assert_eq!(h.calls(), vec![Call::Clipboard(COMMUNITY, "late".into())]);
    }

    #[test]
    fn requester_routing_drops_stale_delivery() {
        let mut h = Harness::configured(Logger::null(), ClipboardRouting::Requester);
        h.register(Recorder::new(CONNECT, &h.calls));
        h.register(Recorder::new(COMMUNITY, &h.calls));

        h.manager.request_view_switch(CONNECT).unwrap();
        h.frame(&[key('p')]);
        h.manager.request_view_switch(COMMUNITY).unwrap();
        h.clear_calls();

        h.manager.handle_clipboard("late");
        assert!(h.calls().is_empty());
        assert_eq!(h.audit.count(NavAuditStage::ClipboardDropped), 1);

        // Unsolicited deliveries still reach the current view.
        h.manager.handle_clipboard("bracketed");
        assert_eq!(
            h.calls(),
            vec![Call::Clipboard(COMMUNITY, "bracketed".into())]
        );
    }

    #[test]
    fn dismissals_through_manager_are_idempotent() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.request_contextual_bar(
            "1 selected",
            vec![AppBarAction::new("Copy", Icon::Copy, ActionTag("copy"))],
            Vec::new(),
        );
        assert!(h.manager.chrome_snapshot().contextual);

        h.manager.dismiss_contextual_bar();
        let once = h.manager.chrome_snapshot();
        h.manager.dismiss_contextual_bar();
        assert_eq!(h.manager.chrome_snapshot(), once);

        h.manager.dismiss_overflow();
        let once = h.manager.chrome_snapshot();
        h.manager.dismiss_overflow();
        assert_eq!(h.manager.chrome_snapshot(), once);
    }

    #[test]
    fn switching_leaves_contextual_mode() {
        let mut h = Harness::with_views(&[CONNECT, COMMUNITY]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager
            .request_contextual_bar("compose", Vec::new(), Vec::new());
        h.manager.request_view_switch(COMMUNITY).unwrap();
        let snapshot = h.manager.chrome_snapshot();
        assert!(!snapshot.contextual);
        assert_eq!(snapshot.title, "community_menu");
    }

    #[test]
    fn drawer_selection_switches_views() {
        let mut h = Harness::new();
        h.register(Recorder::new(COMMUNITY, &h.calls).in_drawer("Communities"));
        h.register(Recorder::new(REPLY, &h.calls).in_drawer("Messages"));
        h.manager.request_view_switch(COMMUNITY).unwrap();

        let menu = InputEvent::Key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        let down = InputEvent::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        let enter = InputEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        h.frame(&[menu]);
        assert!(h.manager.chrome_snapshot().drawer_open);
        h.frame(&[down, enter]);

        assert_eq!(h.manager.current(), Some(REPLY));
        assert_eq!(h.manager.stack().entries(), &[COMMUNITY]);
        assert_eq!(h.manager.chrome_snapshot().destination, Some(REPLY));
    }

    #[test]
    fn reselecting_current_drawer_entry_does_not_switch() {
        let mut h = Harness::new();
        h.register(Recorder::new(COMMUNITY, &h.calls).in_drawer("Communities"));
        h.register(Recorder::new(REPLY, &h.calls).in_drawer("Messages"));
        h.manager.request_view_switch(COMMUNITY).unwrap();
        h.clear_calls();

        let menu = InputEvent::Key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        let enter = InputEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        h.frame(&[menu]);
        h.frame(&[enter]);

        assert!(!h.manager.chrome_snapshot().drawer_open);
        assert_eq!(h.manager.current(), Some(COMMUNITY));
        assert!(h.manager.stack().is_empty());
        assert!(!h.calls().iter().any(|call| matches!(call, Call::Visible(_))));
    }

    #[test]
    fn contextual_request_from_hidden_bar_view_keeps_escape_as_back() {
        let mut h = Harness::new();
        h.register(Recorder::new(CONNECT, &h.calls));
        h.register(Recorder::new(ViewId::Consent, &h.calls).hidden_bar());
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.request_view_switch(ViewId::Consent).unwrap();

        h.manager
            .handle()
            .for_view(ViewId::Consent)
            .request_contextual_bar("Pick", Vec::new(), Vec::new());
        h.frame(&[]);
        assert!(!h.manager.chrome_snapshot().contextual);
        assert!(!h.manager.chrome().captures_escape());

        let esc = crossterm::event::Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let routed = crate::runtime::translate(
            esc,
            h.manager.keymap(),
            h.manager.chrome().captures_escape(),
        );
        assert_eq!(routed, Some(crate::runtime::PlatformEvent::Back));
        assert_eq!(h.manager.handle_back_navigation(), EventFlow::Consumed);
        assert_eq!(h.manager.current(), Some(CONNECT));
    }

    #[test]
    fn theme_panel_receives_clicks_inside_its_half() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager
            .set_theme_panel(Box::new(Recorder::new(ViewId::ThemeEditor, &h.calls)));
        h.manager.set_theming(true);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.frame(&[]);
        h.clear_calls();

        h.frame(&[
            InputEvent::Click { column: 45, row: 6 },
            InputEvent::Click { column: 5, row: 6 },
        ]);
        let clicks: Vec<Call> = h
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Clicked(_)))
            .collect();
        assert_eq!(
            clicks,
            vec![Call::Clicked(CONNECT), Call::Clicked(ViewId::ThemeEditor)]
        );
    }

    #[test]
    fn request_loops_are_bounded() {
        let sink = MemorySink::new();
        let mut h = Harness::configured(Logger::new(sink.clone()), ClipboardRouting::ActiveView);
        let mut a = Recorder::new(CONNECT, &h.calls);
        a.on_visible = Some(COMMUNITY);
        let mut b = Recorder::new(COMMUNITY, &h.calls);
        b.on_visible = Some(CONNECT);
        h.register(a);
        h.register(b);

        h.manager.request_view_switch(CONNECT).unwrap();
        assert!(sink.contains("request_rounds_exhausted"));
        assert_eq!(h.manager.stack().len(), MAX_REQUEST_ROUNDS);
    }

    #[test]
    fn switch_requested_from_update_finishes_frame_with_old_view() {
        let mut h = Harness::new();
        let mut connect = Recorder::new(CONNECT, &h.calls);
        connect.on_update = Some(COMMUNITY);
        h.register(connect);
        h.register(Recorder::new(COMMUNITY, &h.calls));
        h.manager.request_view_switch(CONNECT).unwrap();
        h.clear_calls();

        h.frame(&[]);
        assert_eq!(
            h.calls(),
            vec![
                Call::Update(CONNECT),
                Call::Visible(COMMUNITY),
                Call::Layout(CONNECT)
            ]
        );
        assert_eq!(h.manager.current(), Some(COMMUNITY));
    }

    #[test]
    fn failing_layout_is_contained() {
        let sink = MemorySink::new();
        let mut h = Harness::configured(Logger::new(sink.clone()), ClipboardRouting::ActiveView);
        let mut recorder = Recorder::new(CONNECT, &h.calls);
        recorder.fail_layout = true;
        h.register(recorder);
        h.manager.request_view_switch(CONNECT).unwrap();

        h.frame(&[]);
        h.frame(&[]);
        let failures = sink
            .events()
            .into_iter()
            .filter(|event| event.message == "view_failed")
            .count();
        assert_eq!(failures, 2);
        assert!(sink.events().iter().any(|event| event.target == "arbor::views.recorder"));
    }

    #[test]
    fn profiling_row_shifts_content_down() {
        let mut h = Harness::with_views(&[CONNECT]);
        h.manager.request_view_switch(CONNECT).unwrap();
        h.manager.set_profiling(true);
        let ops = h.frame(&[]);
        assert!(ops.texts().any(|text| text.starts_with("frame ")));
    }
}
