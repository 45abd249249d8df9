use futures_core::Stream;
use futures_util::TryStreamExt;
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use strata_common::ConditionalSync;
use strata_storage::Encoder;

use crate::{
    Buffer, Log, Message, NodeStore, Reference, Slab, StrataLogError, Summary, Tail, Tree,
    walk::{buffer_stream, message_stream},
};

/// The sum of every construct that can appear in a log.
///
/// Nodes are immutable values; every operation that "mutates" a node returns
/// a new one sharing structure with the input. The two derived aggregates -
/// [`Node::length`] and [`Node::byte_count`] - are maintained by every
/// constructor and are always consistent with the subtree a node describes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A single byte payload with its decoding hint
    Buffer(Buffer),
    /// A sealed, ordered group of buffers
    Slab(Slab),
    /// The mutable frontier of a log
    Tail(Tail),
    /// A balanced structural node over slabs
    Tree(Tree),
    /// A handle to a persisted node
    Reference(Reference),
    /// A whole log, embeddable within another log
    Log(Box<Log>),
}

impl Node {
    /// The number of logical messages in this node.
    pub fn length(&self) -> u64 {
        match self {
            Node::Buffer(buffer) => buffer.length(),
            Node::Slab(slab) => slab.length(),
            Node::Tail(tail) => tail.length(),
            Node::Tree(tree) => tree.length(),
            Node::Reference(reference) => reference.length(),
            Node::Log(log) => log.length(),
        }
    }

    /// The total serialized size of this node, framing included.
    pub fn byte_count(&self) -> u64 {
        match self {
            Node::Buffer(buffer) => buffer.byte_count(),
            Node::Slab(slab) => slab.byte_count(),
            Node::Tail(tail) => tail.byte_count(),
            Node::Tree(tree) => tree.byte_count(),
            Node::Reference(reference) => reference.byte_count(),
            Node::Log(log) => log.byte_count(),
        }
    }

    /// Whether this node contains no messages.
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// A short name for this node's kind, for error context.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Buffer(_) => "buffer",
            Node::Slab(_) => "slab",
            Node::Tail(_) => "tail",
            Node::Tree(_) => "tree",
            Node::Reference(_) => "reference",
            Node::Log(_) => "log",
        }
    }

    /// The ordered stream of [`Buffer`] leaves under this node.
    ///
    /// References are resolved through the store as the stream reaches them.
    pub fn buffers<'a, E>(
        &'a self,
        store: &'a NodeStore<E>,
    ) -> impl Stream<Item = Result<Buffer, StrataLogError>> + 'a
    where
        E: Encoder + ConditionalSync,
    {
        buffer_stream(self.clone(), store)
    }

    /// The ordered stream of decoded messages under this node.
    pub fn messages<'a, E>(
        &'a self,
        store: &'a NodeStore<E>,
    ) -> impl Stream<Item = Result<Message, StrataLogError>> + 'a
    where
        E: Encoder + ConditionalSync,
    {
        message_stream(self.clone(), 0, store)
    }

    /// The stream of messages starting at logical position `offset`.
    ///
    /// Whole subtrees before the offset are skipped using their `length`
    /// aggregates; a skipped reference is never fetched from storage.
    pub fn fetch<'a, E>(
        &'a self,
        offset: u64,
        store: &'a NodeStore<E>,
    ) -> impl Stream<Item = Result<Message, StrataLogError>> + 'a
    where
        E: Encoder + ConditionalSync,
    {
        message_stream(self.clone(), offset, store)
    }

    /// Flatten this node's buffer stream into a sealed [`Slab`].
    ///
    /// The result is an error if the node has no buffers.
    pub async fn to_slab<E>(&self, store: &NodeStore<E>) -> Result<Slab, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        let mut buffers = Vec::new();
        let stream = self.buffers(store);
        tokio::pin!(stream);
        while let Some(buffer) = stream.try_next().await? {
            buffers.push(buffer);
        }
        NonEmpty::from_vec(buffers)
            .map(Slab::new)
            .ok_or_else(|| {
                StrataLogError::UnexpectedShape(format!(
                    "Cannot seal an empty {} into a slab",
                    self.kind_name()
                ))
            })
    }

    /// An inspection structure describing this node's shape.
    pub fn summarise(&self) -> Summary {
        Summary::of(self)
    }
}

impl From<Buffer> for Node {
    fn from(value: Buffer) -> Self {
        Node::Buffer(value)
    }
}

impl From<Slab> for Node {
    fn from(value: Slab) -> Self {
        Node::Slab(value)
    }
}

impl From<Tail> for Node {
    fn from(value: Tail) -> Self {
        Node::Tail(value)
    }
}

impl From<Tree> for Node {
    fn from(value: Tree) -> Self {
        Node::Tree(value)
    }
}

impl From<Reference> for Node {
    fn from(value: Reference) -> Self {
        Node::Reference(value)
    }
}

impl From<Log> for Node {
    fn from(value: Log) -> Self {
        Node::Log(Box::new(value))
    }
}
