use super::ViewId;

/// Back-navigation history. Only grows by `push` and shrinks by `pop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavStack {
    entries: Vec<ViewId>,
}

impl NavStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ViewId) {
        self.entries.push(id);
    }

    pub fn pop(&mut self) -> Option<ViewId> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<ViewId> {
        self.entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest entry first.
    pub fn entries(&self) -> &[ViewId] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_push_order() {
        let mut stack = NavStack::new();
        stack.push(ViewId::ConnectForm);
        stack.push(ViewId::CommunityMenu);
        assert_eq!(stack.peek(), Some(ViewId::CommunityMenu));
        assert_eq!(stack.pop(), Some(ViewId::CommunityMenu));
        assert_eq!(stack.entries(), &[ViewId::ConnectForm]);
        assert_eq!(stack.pop(), Some(ViewId::ConnectForm));
        assert_eq!(stack.pop(), None);
    }
}
