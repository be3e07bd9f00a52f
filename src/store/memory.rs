use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::{
    Community, ConversationStore, Identity, MessageCallback, Node, NodeId, Reply, StoreError,
    StoreResult, SubscriptionId,
};

type SharedCallback = Arc<dyn Fn(&Node) + Send + Sync>;

#[derive(Default)]
struct Tree {
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Tree {
    fn reply(&self, id: &NodeId) -> Option<&Reply> {
        self.nodes.get(id).and_then(Node::as_reply)
    }
}

/// Content-addressed in-memory tree.
///
/// Subscribers run synchronously on the thread that called [`add`], after the
/// tree lock has been released, so a callback may read the store again.
///
/// [`add`]: ConversationStore::add
#[derive(Default)]
pub struct MemoryStore {
    tree: RwLock<Tree>,
    subscribers: Mutex<Vec<(SubscriptionId, SharedCallback)>>,
    next_subscription: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tree.read().map(|tree| tree.nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tree>> {
        self.tree.read().map_err(|_| StoreError::Poisoned)
    }

    fn callbacks(&self) -> Vec<SharedCallback> {
        self.subscribers
            .lock()
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }
}

impl ConversationStore for MemoryStore {
    fn get(&self, id: &NodeId) -> StoreResult<Option<Node>> {
        Ok(self.read()?.nodes.get(id).cloned())
    }

    fn identity(&self, id: &NodeId) -> StoreResult<Option<Identity>> {
        Ok(match self.read()?.nodes.get(id) {
            Some(Node::Identity(identity)) => Some(identity.clone()),
            _ => None,
        })
    }

    fn ancestry_of(&self, id: &NodeId) -> StoreResult<Vec<NodeId>> {
        let tree = self.read()?;
        let mut current = tree.reply(id).ok_or(StoreError::NotFound(*id))?;
        let mut ancestry = Vec::new();
        while let Some(parent) = tree.reply(&current.parent) {
            ancestry.push(parent.id);
            current = parent;
        }
        Ok(ancestry)
    }

    fn descendants_of(&self, id: &NodeId) -> StoreResult<Vec<NodeId>> {
        let tree = self.read()?;
        if !tree.nodes.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        let mut found = Vec::new();
        let mut queue: VecDeque<NodeId> = VecDeque::from([*id]);
        while let Some(next) = queue.pop_front() {
            for child in tree.children.get(&next).into_iter().flatten() {
                if tree.reply(child).is_some() {
                    found.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        Ok(found)
    }

    fn replies(&self) -> StoreResult<Vec<Reply>> {
        let tree = self.read()?;
        let mut replies: Vec<Reply> = tree
            .nodes
            .values()
            .filter_map(Node::as_reply)
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_ms.cmp(&b.created_ms).then(a.id.cmp(&b.id)));
        Ok(replies)
    }

    fn communities(&self) -> StoreResult<Vec<Community>> {
        let tree = self.read()?;
        let mut communities: Vec<Community> = tree
            .nodes
            .values()
            .filter_map(|node| match node {
                Node::Community(community) => Some(community.clone()),
                _ => None,
            })
            .collect();
        communities.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(communities)
    }

    fn add(&self, node: Node) -> StoreResult<()> {
        let id = node.id();
        {
            let mut tree = self.tree.write().map_err(|_| StoreError::Poisoned)?;
            if tree.nodes.contains_key(&id) {
                return Ok(());
            }
            if let Node::Reply(reply) = &node {
                if !tree.nodes.contains_key(&reply.parent) {
                    return Err(StoreError::MissingParent {
                        node: id,
                        parent: reply.parent,
                    });
                }
                tree.children.entry(reply.parent).or_default().push(id);
            }
            tree.nodes.insert(id, node.clone());
        }

        for callback in self.callbacks() {
            callback(&node);
        }
        Ok(())
    }

    fn subscribe_new_messages(&self, callback: MessageCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push((id, Arc::from(callback)));
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|(existing, _)| *existing != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Forest {
        store: MemoryStore,
        author: Identity,
        community: Community,
    }

    fn forest() -> Forest {
        let store = MemoryStore::new();
        let author = Identity::new("ada", 1);
        let community = Community::new("rust", author.id, 2);
        store.add(Node::Identity(author.clone())).unwrap();
        store.add(Node::Community(community.clone())).unwrap();
        Forest {
            store,
            author,
            community,
        }
    }

    #[test]
    fn ancestry_walks_to_the_root_reply() {
        let f = forest();
        let root = Reply::root(&f.community, f.author.id, "root", 10);
        let mid = Reply::child(&root, f.author.id, "mid", 11);
        let leaf = Reply::child(&mid, f.author.id, "leaf", 12);
        for reply in [&root, &mid, &leaf] {
            f.store.add(Node::Reply(reply.clone())).unwrap();
        }

        assert_eq!(f.store.ancestry_of(&leaf.id).unwrap(), vec![mid.id, root.id]);
        assert!(f.store.ancestry_of(&root.id).unwrap().is_empty());
        assert_eq!(
            f.store.descendants_of(&root.id).unwrap(),
            vec![mid.id, leaf.id]
        );
    }

    #[test]
    fn unknown_ids_and_orphans_are_errors() {
        let f = forest();
        let stranger = Identity::new("nobody", 9);
        assert!(matches!(
            f.store.ancestry_of(&stranger.id),
            Err(StoreError::NotFound(_))
        ));

        let other = Community::new("elsewhere", f.author.id, 3);
        let orphan = Reply::root(&other, f.author.id, "lost", 4);
        assert!(matches!(
            f.store.add(Node::Reply(orphan)),
            Err(StoreError::MissingParent { .. })
        ));
    }

    #[test]
    fn subscribers_see_each_new_node_once() {
        let f = forest();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sub = f.store.subscribe_new_messages(Box::new(move |_node: &Node| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let reply = Reply::root(&f.community, f.author.id, "hi", 20);
        f.store.add(Node::Reply(reply.clone())).unwrap();
        f.store.add(Node::Reply(reply)).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        f.store.unsubscribe(sub);
        let later = Reply::root(&f.community, f.author.id, "later", 21);
        f.store.add(Node::Reply(later)).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replies_are_ordered_by_creation_time() {
        let f = forest();
        let late = Reply::root(&f.community, f.author.id, "late", 30);
        let early = Reply::root(&f.community, f.author.id, "early", 5);
        f.store.add(Node::Reply(late)).unwrap();
        f.store.add(Node::Reply(early)).unwrap();
        let contents: Vec<String> = f
            .store
            .replies()
            .unwrap()
            .into_iter()
            .map(|reply| reply.content)
            .collect();
        assert_eq!(contents, vec!["early", "late"]);
        assert_eq!(f.store.identity(&f.author.id).unwrap(), Some(f.author.clone()));
        assert_eq!(f.store.identity(&f.community.id).unwrap(), None);
    }
}
