//! Wake-ups that reach the render loop from other threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::store::NodeId;

/// Notices queued for the loop; drained once per iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellNotice {
    Redraw,
    NewMessage(NodeId),
}

/// Redraw flag plus a bounded notice queue. Cloned into store callbacks, which
/// may run on any thread and never touch navigation or view state.
#[derive(Debug, Clone)]
pub struct RedrawSignal {
    dirty: Arc<AtomicBool>,
    tx: Sender<ShellNotice>,
    rx: Receiver<ShellNotice>,
}

impl RedrawSignal {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            dirty: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// Mark the window dirty and queue `notice`. A full queue drops the
    /// notice; the dirty flag alone still forces the next frame.
    pub fn notify(&self, notice: ShellNotice) -> bool {
        self.dirty.store(true, Ordering::Release);
        match self.tx.try_send(notice) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn request_redraw(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clear and return the dirty flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn drain(&self) -> Vec<ShellNotice> {
        self.rx.try_iter().collect()
    }
}

impl Default for RedrawSignal {
    fn default() -> Self {
        Self::new(64)
    }
}
