use std::fmt;

use serde::{Deserialize, Serialize};

use super::StoreError;

/// Content address of a node: the blake3 hash of its canonical fields.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId([u8; 32]);

impl NodeId {
    fn derive(kind: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_bytes());
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    pub fn from_hex(text: &str) -> Result<Self, StoreError> {
        blake3::Hash::from_hex(text)
            .map(|hash| Self(*hash.as_bytes()))
            .map_err(|_| StoreError::InvalidId(text.to_string()))
    }

    /// First eight hex digits, for logs and compact labels.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}

impl TryFrom<String> for NodeId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<NodeId> for String {
    fn from(value: NodeId) -> Self {
        value.to_hex()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: NodeId,
    pub name: String,
    pub created_ms: u64,
}

impl Identity {
    pub fn new(name: impl Into<String>, created_ms: u64) -> Self {
        let name = name.into();
        let id = NodeId::derive(
            "identity",
            &[name.as_bytes(), &created_ms.to_le_bytes()],
        );
        Self {
            id,
            name,
            created_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub id: NodeId,
    pub name: String,
    pub author: NodeId,
    pub created_ms: u64,
}

impl Community {
    pub fn new(name: impl Into<String>, author: NodeId, created_ms: u64) -> Self {
        let name = name.into();
        let id = NodeId::derive(
            "community",
            &[name.as_bytes(), &author.0, &created_ms.to_le_bytes()],
        );
        Self {
            id,
            name,
            author,
            created_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: NodeId,
    pub community: NodeId,
    /// The community for top-level replies, otherwise the replied-to reply.
    pub parent: NodeId,
    /// Root reply of the thread; `None` for the root itself.
    pub conversation: Option<NodeId>,
    pub author: NodeId,
    pub created_ms: u64,
    pub content: String,
}

impl Reply {
    /// Start a new conversation directly under a community.
    pub fn root(
        community: &Community,
        author: NodeId,
        content: impl Into<String>,
        created_ms: u64,
    ) -> Self {
        Self::build(community.id, community.id, None, author, content.into(), created_ms)
    }

    /// Answer `parent`, joining its conversation.
    pub fn child(parent: &Reply, author: NodeId, content: impl Into<String>, created_ms: u64) -> Self {
        Self::build(
            parent.community,
            parent.id,
            Some(parent.conversation_root()),
            author,
            content.into(),
            created_ms,
        )
    }

    fn build(
        community: NodeId,
        parent: NodeId,
        conversation: Option<NodeId>,
        author: NodeId,
        content: String,
        created_ms: u64,
    ) -> Self {
        let id = NodeId::derive(
            "reply",
            &[
                &parent.0,
                &author.0,
                content.as_bytes(),
                &created_ms.to_le_bytes(),
            ],
        );
        Self {
            id,
            community,
            parent,
            conversation,
            author,
            created_ms,
            content,
        }
    }

    /// Id of the reply that started this thread.
    pub fn conversation_root(&self) -> NodeId {
        self.conversation.unwrap_or(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Identity(Identity),
    Community(Community),
    Reply(Reply),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Identity(identity) => identity.id,
            Node::Community(community) => community.id,
            Node::Reply(reply) => reply.id,
        }
    }

    pub fn as_reply(&self) -> Option<&Reply> {
        match self {
            Node::Reply(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Identity(_) => "identity",
            Node::Community(_) => "community",
            Node::Reply(_) => "reply",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_and_rejects_garbage() {
        let identity = Identity::new("ada", 1);
        let parsed = NodeId::from_hex(&identity.id.to_hex()).unwrap();
        assert_eq!(parsed, identity.id);
        assert!(matches!(
            NodeId::from_hex("zz"),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn child_replies_share_the_root_conversation() {
        let author = Identity::new("ada", 1);
        let community = Community::new("rust", author.id, 2);
        let root = Reply::root(&community, author.id, "hello", 3);
        let child = Reply::child(&root, author.id, "hi", 4);
        let grandchild = Reply::child(&child, author.id, "hey", 5);

        assert_eq!(root.conversation, None);
        assert_eq!(child.conversation, Some(root.id));
        assert_eq!(grandchild.conversation, Some(root.id));
        assert_eq!(grandchild.community, community.id);
    }
}
