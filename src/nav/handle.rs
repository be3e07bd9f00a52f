use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{AppBarAction, OverflowAction, ViewId};

/// Something a view asked the manager to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerRequest {
    SwitchTo(ViewId),
    /// Ask the host for clipboard contents on behalf of the issuing view.
    PasteRequested,
    WriteClipboard(String),
    ContextualBar {
        title: String,
        actions: Vec<AppBarAction>,
        overflow: Vec<OverflowAction>,
    },
    DismissContextual,
    DismissOverflow,
    Invalidate,
}

type Queue = Arc<Mutex<VecDeque<(Option<ViewId>, ManagerRequest)>>>;

/// Cloneable channel from views back to the navigation manager.
///
/// Every clone shares one FIFO queue. Handles given to registered views are
/// stamped with the view's id so the manager knows who asked.
#[derive(Debug, Clone, Default)]
pub struct ManagerHandle {
    queue: Queue,
    owner: Option<ViewId>,
}

impl ManagerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same queue, requests attributed to `owner`.
    pub fn for_view(&self, owner: ViewId) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            owner: Some(owner),
        }
    }

    pub fn owner(&self) -> Option<ViewId> {
        self.owner
    }

    pub fn request_view_switch(&self, target: ViewId) {
        self.push(ManagerRequest::SwitchTo(target));
    }

    pub fn request_clipboard_paste(&self) {
        self.push(ManagerRequest::PasteRequested);
    }

    pub fn update_clipboard(&self, text: impl Into<String>) {
        self.push(ManagerRequest::WriteClipboard(text.into()));
    }

    pub fn request_contextual_bar(
        &self,
        title: impl Into<String>,
        actions: Vec<AppBarAction>,
        overflow: Vec<OverflowAction>,
    ) {
        self.push(ManagerRequest::ContextualBar {
            title: title.into(),
            actions,
            overflow,
        });
    }

    pub fn dismiss_contextual_bar(&self) {
        self.push(ManagerRequest::DismissContextual);
    }

    pub fn dismiss_overflow(&self) {
        self.push(ManagerRequest::DismissOverflow);
    }

    pub fn invalidate(&self) {
        self.push(ManagerRequest::Invalidate);
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    fn push(&self, request: ManagerRequest) {
        // A poisoned queue means a view panicked mid-request; nothing to apply.
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back((self.owner, request));
        }
    }

    pub(crate) fn drain(&self) -> Vec<(Option<ViewId>, ManagerRequest)> {
        self.queue
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }
}
