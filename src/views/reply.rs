use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossterm::event::KeyCode;

use crate::config::SettingsHandle;
use crate::error::Result;
use crate::geometry::{Dimensions, Rect};
use crate::input::{ActionTag, InputEvent};
use crate::logging::{LogLevel, Logger, current_ms, json_str};
use crate::nav::{AppBarAction, AppBarData, Icon, ManagerHandle, NavItem, View, ViewId};
use crate::render::{RenderContext, Style};
use crate::store::{ConversationStore, Node, NodeId, Reply, StoreResult};
use crate::theme::{self, SharedTheme};
use crate::widget::{
    FieldEvent, Highlight, ListEvent, ListState, REPLY_ROW_HEIGHT, ReplyRow, TextField,
    paint_reply,
};

use super::{ActiveCommunity, log_store_error, target};

const NEW_CONVERSATION: ActionTag = ActionTag("new_conversation");
const COPY: ActionTag = ActionTag("copy_reply");
const REPLY: ActionTag = ActionTag("reply_to");
const CLEAR: ActionTag = ActionTag("clear_selection");
const SEND: ActionTag = ActionTag("send_reply");
const CANCEL: ActionTag = ActionTag("cancel_reply");

/// Relationship of every reply to the selected one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadHighlight {
    selected: Option<NodeId>,
    ancestry: HashSet<NodeId>,
    descendants: HashSet<NodeId>,
    conversation: Option<NodeId>,
}

impl ThreadHighlight {
    /// Only the selection itself; used when the tree could not be read.
    pub fn selection_only(selected: NodeId) -> Self {
        Self {
            selected: Some(selected),
            ..Self::default()
        }
    }

    pub fn derive(store: &dyn ConversationStore, selected: &Reply) -> StoreResult<Self> {
        Ok(Self {
            selected: Some(selected.id),
            ancestry: store.ancestry_of(&selected.id)?.into_iter().collect(),
            descendants: store.descendants_of(&selected.id)?.into_iter().collect(),
            conversation: selected.conversation,
        })
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Selection beats ancestry, ancestry beats descendants, and a shared
    /// conversation only counts when the selection is not itself a root.
    pub fn highlight_for(&self, reply: &Reply) -> Highlight {
        if self.selected == Some(reply.id) {
            Highlight::Selected
        } else if self.ancestry.contains(&reply.id) {
            Highlight::Ancestor
        } else if self.descendants.contains(&reply.id) {
            Highlight::Descendant
        } else if self.conversation.is_some() && reply.conversation == self.conversation {
            Highlight::Conversation
        } else {
            Highlight::None
        }
    }
}

struct Compose {
    field: TextField,
    parent: Option<Reply>,
}

/// Replies of the active community, oldest first.
pub struct ReplyThreadView {
    store: Arc<dyn ConversationStore>,
    settings: SettingsHandle,
    active: ActiveCommunity,
    theme: SharedTheme,
    logger: Logger,
    manager: ManagerHandle,
    replies: Vec<Reply>,
    authors: HashMap<NodeId, String>,
    highlight: ThreadHighlight,
    list: ListState,
    list_area: Rect,
    compose: Option<Compose>,
}

impl ReplyThreadView {
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
            replies: Vec::new(),
            authors: HashMap::new(),
            highlight: ThreadHighlight::default(),
            list: ListState::new(REPLY_ROW_HEIGHT),
            list_area: Rect::default(),
            compose: None,
        }
    }

    fn community(&self) -> Option<NodeId> {
        self.active.read().ok().and_then(|active| *active)
    }

    fn refresh(&mut self) {
        let community = self.community();
        let replies = match self.store.replies() {
            Ok(replies) => replies,
            Err(err) => {
                log_store_error(&self.logger, ViewId::ReplyThread, "replies_failed", err);
                return;
            }
        };
        self.replies = replies
            .into_iter()
            .filter(|reply| Some(reply.community) == community)
            .collect();
        self.list.set_len(self.replies.len());

        let selected = self
            .highlight
            .selected()
            .and_then(|id| self.replies.iter().position(|reply| reply.id == id));
        if selected.is_none() {
            self.highlight = ThreadHighlight::default();
        }
        self.list.select(selected);

        for reply in &self.replies {
            if self.authors.contains_key(&reply.author) {
                continue;
            }
            let name = match self.store.identity(&reply.author) {
                Ok(Some(identity)) => identity.name,
                Ok(None) => String::new(),
                Err(err) => {
                    log_store_error(&self.logger, ViewId::ReplyThread, "author_lookup_failed", err);
                    String::new()
                }
            };
            self.authors.insert(reply.author, name);
        }
    }

    fn select(&mut self, index: usize) {
        let Some(reply) = self.replies.get(index) else {
            return;
        };
        self.highlight = match ThreadHighlight::derive(self.store.as_ref(), reply) {
            Ok(highlight) => highlight,
            Err(err) => {
                log_store_error(&self.logger, ViewId::ReplyThread, "highlight_failed", err);
                ThreadHighlight::selection_only(reply.id)
            }
        };
        if self.compose.is_none() {
            self.show_selection_bar();
        }
    }

    fn rederive(&mut self) {
        let Some(index) = self.list.selected() else {
            return;
        };
        let Some(reply) = self.replies.get(index) else {
            return;
        };
        self.highlight = match ThreadHighlight::derive(self.store.as_ref(), reply) {
            Ok(highlight) => highlight,
            Err(err) => {
                log_store_error(&self.logger, ViewId::ReplyThread, "highlight_failed", err);
                ThreadHighlight::selection_only(reply.id)
            }
        };
    }

    fn selected_reply(&self) -> Option<&Reply> {
        let id = self.highlight.selected()?;
        self.replies.iter().find(|reply| reply.id == id)
    }

    fn show_selection_bar(&self) {
        self.manager.request_contextual_bar(
            "Selected reply",
            vec![
                AppBarAction::new("Copy", Icon::Copy, COPY).with_accelerator('c'),
                AppBarAction::new("Reply", Icon::Reply, REPLY).with_accelerator('r'),
                AppBarAction::new("Clear", Icon::Clear, CLEAR),
            ],
            Vec::new(),
        );
    }

    fn clear_selection(&mut self) {
        self.highlight = ThreadHighlight::default();
        self.list.select(None);
    }

    fn start_compose(&mut self, parent: Option<Reply>) {
        let title = match &parent {
            Some(_) => "Reply",
            None => "New conversation",
        };
        self.compose = Some(Compose {
            field: TextField::new("message"),
            parent,
        });
        self.manager.request_contextual_bar(
            title,
            vec![
                AppBarAction::new("Send", Icon::SendReply, SEND).with_accelerator('s'),
                AppBarAction::new("Cancel", Icon::CancelReply, CANCEL),
            ],
            Vec::new(),
        );
    }

    fn cancel_compose(&mut self) {
        self.compose = None;
        if self.highlight.selected().is_some() {
            self.show_selection_bar();
        } else {
            self.manager.dismiss_contextual_bar();
        }
    }

    fn post(&mut self, content: String) {
        let Some(author) = self.settings.snapshot().active_identity else {
            log_store_error(&self.logger, ViewId::ReplyThread, "post_failed", "no active identity");
            return;
        };
        let now = current_ms() as u64;
        let parent = self.compose.as_ref().and_then(|compose| compose.parent.clone());
        let reply = match parent {
            Some(parent) => Reply::child(&parent, author, content, now),
            None => {
                let community = self.community().map(|id| self.store.get(&id));
                match community {
                    Some(Ok(Some(Node::Community(community)))) => {
                        Reply::root(&community, author, content, now)
                    }
                    Some(Err(err)) => {
                        log_store_error(&self.logger, ViewId::ReplyThread, "post_failed", err);
                        return;
                    }
                    _ => {
                        log_store_error(&self.logger, ViewId::ReplyThread, "post_failed", "no community");
                        return;
                    }
                }
            }
        };
        let id = reply.id;
        if let Err(err) = self.store.add(Node::Reply(reply)) {
            log_store_error(&self.logger, ViewId::ReplyThread, "post_failed", err);
            return;
        }
        self.logger.emit(
            LogLevel::Info,
            &target(ViewId::ReplyThread),
            "reply_posted",
            [json_str("reply", id.to_hex())],
        );
        self.compose = None;
        self.clear_selection();
        self.manager.dismiss_contextual_bar();
        self.refresh();
    }

    /// Returns `true` when the compose field took the event.
    fn update_compose(&mut self, event: &InputEvent) -> bool {
        let Some(compose) = self.compose.as_mut() else {
            return false;
        };
        if event.is_key(KeyCode::Esc) {
            self.cancel_compose();
            return true;
        }
        match compose.field.handle(event) {
            FieldEvent::Submitted(content) => self.post(content),
            FieldEvent::Changed | FieldEvent::Unchanged => {}
        }
        !matches!(event, InputEvent::Click { .. } | InputEvent::Scroll { .. })
    }
}

impl View for ReplyThreadView {
    fn name(&self) -> &'static str {
        ViewId::ReplyThread.as_str()
    }

    fn update(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        self.refresh();
        for event in ctx.events() {
            match event {
                InputEvent::Action(NEW_CONVERSATION) => self.start_compose(None),
                InputEvent::Action(COPY) => {
                    if let Some(reply) = self.selected_reply() {
                        self.manager.update_clipboard(reply.content.clone());
                    }
                }
                InputEvent::Action(REPLY) => {
                    if let Some(reply) = self.selected_reply().cloned() {
                        self.start_compose(Some(reply));
                    }
                }
                InputEvent::Action(CLEAR) => {
                    self.clear_selection();
                    self.manager.dismiss_contextual_bar();
                }
                InputEvent::Action(SEND) => {
                    let content = self
                        .compose
                        .as_ref()
                        .map(|compose| compose.field.text().trim().to_string())
                        .unwrap_or_default();
                    if !content.is_empty() {
                        self.post(content);
                    }
                }
                InputEvent::Action(CANCEL) => self.cancel_compose(),
                InputEvent::ContextualDismissed => {
                    self.compose = None;
                    self.clear_selection();
                }
                _ => {
                    if self.update_compose(event) {
                        continue;
                    }
                    match self.list.handle(event, self.list_area) {
                        ListEvent::Moved(index) | ListEvent::Activated(index) => self.select(index),
                        ListEvent::Unchanged => {}
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
        if let Some(compose) = &self.compose {
            compose.field.paint(ctx, 0, &theme, true);
            list_area = area.split_top(2).1;
        }
        self.list_area = list_area;

        if self.community().is_none() {
            ctx.text(
                list_area.x + 1,
                list_area.y,
                "Pick a community first.",
                Style::fg(theme.text_muted),
            );
            return Ok(ctx.size());
        }
        if self.replies.is_empty() {
            ctx.text(
                list_area.x + 1,
                list_area.y,
                "No replies yet. Alt+N starts a conversation.",
                Style::fg(theme.text_muted),
            );
            return Ok(ctx.size());
        }

        for (slot, index) in self.list.visible(list_area.height).enumerate() {
            let reply = &self.replies[index];
            let row = ReplyRow {
                author: self.authors.get(&reply.author).map(String::as_str).unwrap_or(""),
                created_ms: reply.created_ms,
                content: &reply.content,
                highlight: self.highlight.highlight_for(reply),
            };
            let y = list_area.y + slot as u16 * REPLY_ROW_HEIGHT;
            let cell = Rect::new(list_area.x, y, list_area.width, REPLY_ROW_HEIGHT)
                .intersect(list_area);
            paint_reply(ctx, cell, &row, &theme);
        }
        Ok(ctx.size())
    }

    fn handle_clipboard(&mut self, text: &str) {
        if let Some(compose) = self.compose.as_mut() {
            compose.field.insert(text);
        }
    }

    fn become_visible(&mut self) {
        self.refresh();
        self.rederive();
        if self.highlight.selected().is_some() && self.compose.is_none() {
            self.show_selection_bar();
        }
    }

    fn app_bar_data(&self) -> AppBarData {
        AppBarData::titled("Messages").with_action(
            AppBarAction::new("New", Icon::CreateConversation, NEW_CONVERSATION)
                .with_accelerator('n'),
        )
    }

    fn nav_item(&self) -> Option<NavItem> {
        Some(NavItem::new("Messages", Icon::Messages))
    }

    fn set_manager(&mut self, manager: ManagerHandle) {
        self.manager = manager;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    use crate::config::Settings;
    use crate::logging::MemorySink;
    use crate::nav::ManagerRequest;
    use crate::store::{
        Community, Identity, MemoryStore, MessageCallback, StoreError, SubscriptionId,
    };
    use crate::theme::Theme;
    use crate::views::active_community;
    use crate::views::testing::{attach, frame, memory_store, requests};

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    /// root ─┬─ a ── b
    ///       └─ s
    /// other
    struct Tree {
        store: Arc<MemoryStore>,
        me: Identity,
        community: Community,
        root: Reply,
        a: Reply,
        b: Reply,
        s: Reply,
        other: Reply,
    }

    fn tree() -> Tree {
        let store = memory_store();
        let me = Identity::new("ada", 1);
        let community = Community::new("rust", me.id, 2);
        let root = Reply::root(&community, me.id, "root", 10);
        let a = Reply::child(&root, me.id, "a", 11);
        let b = Reply::child(&a, me.id, "b", 12);
        let s = Reply::child(&root, me.id, "s", 13);
        let other = Reply::root(&community, me.id, "other", 14);
        store.add(Node::Identity(me.clone())).unwrap();
        store.add(Node::Community(community.clone())).unwrap();
        for reply in [&root, &a, &b, &s, &other] {
            store.add(Node::Reply(reply.clone())).unwrap();
        }
        Tree {
            store,
            me,
            community,
            root,
            a,
            b,
            s,
            other,
        }
    }

    fn view(tree: &Tree, store: Arc<dyn ConversationStore>) -> (ReplyThreadView, ManagerHandle) {
        logged_view(tree, store, Logger::null())
    }

    fn logged_view(
        tree: &Tree,
        store: Arc<dyn ConversationStore>,
        logger: Logger,
    ) -> (ReplyThreadView, ManagerHandle) {
        let active = active_community();
        *active.write().unwrap() = Some(tree.community.id);
        let settings = SettingsHandle::in_memory(Settings {
            active_identity: Some(tree.me.id),
            ..Settings::default()
        });
        let mut view = ReplyThreadView::new(
            store,
            settings,
            active,
            theme::shared(Theme::default()),
            logger,
        );
        let handle = attach(&mut view, ViewId::ReplyThread);
        view.become_visible();
        (view, handle)
    }

    #[test]
    fn highlight_follows_thread_relations() {
        let t = tree();
        let highlight = ThreadHighlight::derive(t.store.as_ref(), &t.a).unwrap();
        assert_eq!(highlight.highlight_for(&t.a), Highlight::Selected);
        assert_eq!(highlight.highlight_for(&t.root), Highlight::Ancestor);
        assert_eq!(highlight.highlight_for(&t.b), Highlight::Descendant);
        assert_eq!(highlight.highlight_for(&t.s), Highlight::Conversation);
        assert_eq!(highlight.highlight_for(&t.other), Highlight::None);
    }

    #[test]
    fn selecting_a_root_skips_conversation_shading() {
        let t = tree();
        let highlight = ThreadHighlight::derive(t.store.as_ref(), &t.other).unwrap();
        assert_eq!(highlight.highlight_for(&t.other), Highlight::Selected);
        assert_eq!(highlight.highlight_for(&t.root), Highlight::None);
        assert_eq!(highlight.highlight_for(&t.s), Highlight::None);
    }

    #[test]
    fn selection_opens_contextual_bar_and_copy_writes_clipboard() {
        let t = tree();
        let (mut view, handle) = view(&t, t.store.clone());
        frame(&mut view, &[]);

        frame(&mut view, &[key(KeyCode::Down), key(KeyCode::Down)]);
        assert_eq!(view.highlight.selected(), Some(t.a.id));
        let pending = requests(&handle);
        assert!(matches!(pending.last(), Some(ManagerRequest::ContextualBar { .. })));

        frame(&mut view, &[InputEvent::Action(COPY)]);
        assert_eq!(requests(&handle), vec![ManagerRequest::WriteClipboard("a".into())]);
    }

    #[test]
    fn contextual_dismissal_clears_selection() {
        let t = tree();
        let (mut view, _handle) = view(&t, t.store.clone());
        frame(&mut view, &[key(KeyCode::Down)]);
        assert!(view.highlight.selected().is_some());

        frame(&mut view, &[InputEvent::ContextualDismissed]);
        assert_eq!(view.highlight, ThreadHighlight::default());
        assert_eq!(view.list.selected(), None);
    }

    #[test]
    fn reply_compose_posts_child_of_selection() {
        let t = tree();
        let (mut view, handle) = view(&t, t.store.clone());
        frame(&mut view, &[key(KeyCode::Down), key(KeyCode::Down)]);
        frame(&mut view, &[InputEvent::Action(REPLY)]);
        requests(&handle);

        let mut events: Vec<InputEvent> = "hi".chars().map(|ch| key(KeyCode::Char(ch))).collect();
        events.push(key(KeyCode::Enter));
        frame(&mut view, &events);

        let posted = t
            .store
            .replies()
            .unwrap()
            .into_iter()
            .find(|reply| reply.content == "hi")
            .expect("reply posted");
        assert_eq!(posted.parent, t.a.id);
        assert_eq!(posted.conversation, Some(t.root.id));
        assert_eq!(requests(&handle), vec![ManagerRequest::DismissContextual]);
        assert!(view.compose.is_none());
    }

    #[test]
    fn new_conversation_posts_root_reply() {
        let t = tree();
        let (mut view, _handle) = view(&t, t.store.clone());
        frame(&mut view, &[InputEvent::Action(NEW_CONVERSATION)]);
        view.handle_clipboard("pasted");
        frame(&mut view, &[InputEvent::Action(SEND)]);

        let posted = t
            .store
            .replies()
            .unwrap()
            .into_iter()
            .find(|reply| reply.content == "pasted")
            .expect("root posted");
        assert_eq!(posted.parent, t.community.id);
        assert_eq!(posted.conversation, None);
    }

    #[test]
    fn rows_show_author_and_content() {
        let t = tree();
        let (mut view, _handle) = view(&t, t.store.clone());
        let canvas = frame(&mut view, &[]);
        assert!(canvas.find_text("ada").is_some());
        assert!(canvas.find_text("root").is_some());
    }

    #[test]
    fn become_visible_rederives_after_new_descendant() {
        let t = tree();
        let (mut view, _handle) = view(&t, t.store.clone());
        frame(&mut view, &[key(KeyCode::Down), key(KeyCode::Down), key(KeyCode::Down)]);
        assert_eq!(view.highlight.selected(), Some(t.b.id));

        let late = Reply::child(&t.b, t.me.id, "late", 20);
        t.store.add(Node::Reply(late.clone())).unwrap();
        view.become_visible();
        assert_eq!(view.highlight.highlight_for(&late), Highlight::Descendant);
    }

    /// Delegates to a memory store but cannot resolve identities or walk
    /// the tree.
    struct Broken(Arc<MemoryStore>);

    impl ConversationStore for Broken {
        fn get(&self, id: &NodeId) -> StoreResult<Option<Node>> {
            self.0.get(id)
        }
        fn identity(&self, _id: &NodeId) -> StoreResult<Option<Identity>> {
            Err(StoreError::Poisoned)
        }
        fn ancestry_of(&self, _id: &NodeId) -> StoreResult<Vec<NodeId>> {
            Err(StoreError::Poisoned)
        }
        fn descendants_of(&self, id: &NodeId) -> StoreResult<Vec<NodeId>> {
            self.0.descendants_of(id)
        }
        fn replies(&self) -> StoreResult<Vec<Reply>> {
            self.0.replies()
        }
        fn communities(&self) -> StoreResult<Vec<Community>> {
            self.0.communities()
        }
        fn add(&self, node: Node) -> StoreResult<()> {
            self.0.add(node)
        }
        fn subscribe_new_messages(&self, callback: MessageCallback) -> SubscriptionId {
            self.0.subscribe_new_messages(callback)
        }
        fn unsubscribe(&self, id: SubscriptionId) {
            self.0.unsubscribe(id)
        }
    }

    #[test]
    fn store_errors_degrade_to_blank_author_and_plain_selection() {
        let t = tree();
        let (mut view, _handle) = view(&t, Arc::new(Broken(t.store.clone())));
        frame(&mut view, &[]);
        let canvas = frame(&mut view, &[key(KeyCode::Down), key(KeyCode::Down)]);

        assert!(canvas.find_text("ada").is_none());
        assert!(canvas.find_text("root").is_some());
        assert_eq!(view.highlight, ThreadHighlight::selection_only(t.a.id));
        assert_eq!(view.highlight.highlight_for(&t.root), Highlight::None);
    }

    #[test]
    fn rederive_failures_are_logged() {
        let t = tree();
        let sink = MemorySink::new();
        let (mut view, _handle) = logged_view(
            &t,
            Arc::new(Broken(t.store.clone())),
            Logger::new(sink.clone()),
        );
        let failures = || {
            sink.events()
                .into_iter()
                .filter(|event| event.message == "highlight_failed")
                .count()
        };
        frame(&mut view, &[]);
        frame(&mut view, &[key(KeyCode::Down), key(KeyCode::Down)]);
        let after_select = failures();
        assert!(after_select > 0);

        view.become_visible();
        assert_eq!(failures(), after_select + 1);
        assert_eq!(view.highlight, ThreadHighlight::selection_only(t.a.id));
    }
}
