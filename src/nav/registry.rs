use std::collections::BTreeMap;

use crate::error::{Result, ShellError};

use super::{View, ViewId};

/// One view instance per id, alive for the whole process.
#[derive(Default)]
pub struct ViewRegistry {
    views: BTreeMap<ViewId, Box<dyn View>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ViewId, view: Box<dyn View>) -> Result<()> {
        if self.views.contains_key(&id) {
            return Err(ShellError::DuplicateView(id));
        }
        self.views.insert(id, view);
        Ok(())
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.views.contains_key(&id)
    }

    pub fn get(&self, id: ViewId) -> Option<&dyn View> {
        self.views.get(&id).map(|view| view.as_ref())
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut (dyn View + 'static)> {
        self.views.get_mut(&id).map(|view| view.as_mut())
    }

    pub fn ids(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
