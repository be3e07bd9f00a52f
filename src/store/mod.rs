//! Boundary to the conversation store.
//!
//! Views read the tree through [`ConversationStore`]; the navigation manager
//! never touches it. [`MemoryStore`] is the in-process implementation used by
//! the binary and the tests.

mod memory;
mod node;
mod notify;

use thiserror::Error;

pub use memory::MemoryStore;
pub use node::{Community, Identity, Node, NodeId, Reply};
pub use notify::{LogNotifier, LoggingRelay, Notifier, RelayWorker};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node {0} not found")]
    NotFound(NodeId),
    #[error("node {node} references missing parent {parent}")]
    MissingParent { node: NodeId, parent: NodeId },
    #[error("invalid node id `{0}`")]
    InvalidId(String),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Handle returned by [`ConversationStore::subscribe_new_messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Invoked once per newly stored node, on whichever thread stored it.
pub type MessageCallback = Box<dyn Fn(&Node) + Send + Sync>;

/// Tree queries and writes offered by the store. Implementations handle their
/// own synchronisation; every method may be called from any thread.
pub trait ConversationStore: Send + Sync {
    fn get(&self, id: &NodeId) -> StoreResult<Option<Node>>;

    fn identity(&self, id: &NodeId) -> StoreResult<Option<Identity>>;

    /// Reply ancestors of `id`, nearest parent first.
    fn ancestry_of(&self, id: &NodeId) -> StoreResult<Vec<NodeId>>;

    /// Every reply below `id`, breadth first.
    fn descendants_of(&self, id: &NodeId) -> StoreResult<Vec<NodeId>>;

    /// All replies ordered by creation time.
    fn replies(&self) -> StoreResult<Vec<Reply>>;

    fn communities(&self) -> StoreResult<Vec<Community>>;

    /// Store a node. Adding a node that is already present is a no-op and
    /// does not notify subscribers.
    fn add(&self, node: Node) -> StoreResult<()>;

    fn subscribe_new_messages(&self, callback: MessageCallback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
