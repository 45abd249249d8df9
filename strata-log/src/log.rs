use futures_core::Stream;
use serde::{Deserialize, Serialize};
use strata_common::ConditionalSync;
use strata_storage::{Encoder, Uri};

use crate::{
    LOG_OVERHEAD, LogSummary, Message, Node, NodeStore, Payload, StrataLogError, Summary, Tail,
    Tree, walk::message_stream,
};

/// Options for a new [`Log`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogOptions {
    /// Maximum number of elements per tree level. Minimum 2.
    pub branching_factor: usize,
    /// The tail's inline byte budget. Minimum 512.
    pub max_inline_bytes: u64,
    /// The tail byte count at which it is sealed into a slab. Minimum 1024.
    pub optimal_slab_bytes: u64,
}

impl Default for LogOptions {
    fn default() -> Self {
        LogOptions {
            branching_factor: 2048,
            max_inline_bytes: 4096,
            optimal_slab_bytes: 524288,
        }
    }
}

impl LogOptions {
    fn validate(&self) -> Result<(), StrataLogError> {
        if self.branching_factor < 2 {
            return Err(StrataLogError::Configuration(format!(
                "branching_factor must be at least 2, got {}",
                self.branching_factor
            )));
        }
        if self.max_inline_bytes < 512 {
            return Err(StrataLogError::Configuration(format!(
                "max_inline_bytes must be at least 512, got {}",
                self.max_inline_bytes
            )));
        }
        if self.optimal_slab_bytes < 1024 {
            return Err(StrataLogError::Configuration(format!(
                "optimal_slab_bytes must be at least 1024, got {}",
                self.optimal_slab_bytes
            )));
        }
        Ok(())
    }
}

/// An append-only, content-addressed message log.
///
/// A log pairs a tree of sealed slabs with a live tail. Appends land in the
/// tail until its byte count reaches `optimal_slab_bytes`; the tail is then
/// sealed into a slab, pushed onto the tree, and a fresh tail installed.
///
/// A `Log` is an immutable value: [`Log::append`] returns a new log sharing
/// structure with this one, and older values remain valid for concurrent
/// readers. A single logical writer per log value is assumed; writers
/// coordinate externally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Log {
    root: Node,
    tail: Tail,
    branching_factor: usize,
    max_inline_bytes: u64,
    optimal_slab_bytes: u64,
}

impl Log {
    /// Create an empty [`Log`].
    ///
    /// The result is an error if any option is below its minimum.
    pub fn new(options: LogOptions) -> Result<Self, StrataLogError> {
        options.validate()?;
        Ok(Log {
            root: Node::Tree(Tree::empty(options.branching_factor)),
            tail: Tail::empty(options.max_inline_bytes),
            branching_factor: options.branching_factor,
            max_inline_bytes: options.max_inline_bytes,
            optimal_slab_bytes: options.optimal_slab_bytes,
        })
    }

    /// The tree of sealed slabs (or a reference to it, after persistence).
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The live tail.
    pub fn tail(&self) -> &Tail {
        &self.tail
    }

    /// The number of messages in this log.
    pub fn length(&self) -> u64 {
        self.root.length() + self.tail.length()
    }

    /// Whether this log contains no messages.
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// The total serialized size of this log, framing included.
    pub fn byte_count(&self) -> u64 {
        LOG_OVERHEAD + self.root.byte_count() + self.tail.byte_count()
    }

    /// The configured branching factor.
    pub fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    /// The configured tail inline budget.
    pub fn max_inline_bytes(&self) -> u64 {
        self.max_inline_bytes
    }

    /// The configured seal threshold.
    pub fn optimal_slab_bytes(&self) -> u64 {
        self.optimal_slab_bytes
    }

    /// Append a payload, producing a new [`Log`].
    ///
    /// If the tail has reached the seal threshold it is first flattened
    /// into a slab and pushed onto the tree; the payload then lands in a
    /// fresh tail. Appending a node larger than the threshold may seal more
    /// than once; each pass strictly reduces the remaining work.
    pub async fn append<E>(
        &self,
        payload: impl Into<Payload>,
        store: &NodeStore<E>,
    ) -> Result<Log, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        let node = payload.into().into_node(store).await?;

        let mut root = self.root.clone();
        let mut tail = self.tail.clone();
        while tail.byte_count() >= self.optimal_slab_bytes {
            let slab = Node::Tail(tail).to_slab(store).await?;
            let tree = match store.unref(&root).await? {
                Node::Tree(tree) => tree,
                other => {
                    return Err(StrataLogError::UnexpectedShape(format!(
                        "Log root resolved to a {}",
                        other.kind_name()
                    )));
                }
            };
            root = Node::Tree(tree.push_slab(slab, store).await?);
            tail = Tail::empty(self.max_inline_bytes);
        }
        let tail = tail.add(node, store).await?;

        Ok(Log {
            root,
            tail,
            branching_factor: self.branching_factor,
            max_inline_bytes: self.max_inline_bytes,
            optimal_slab_bytes: self.optimal_slab_bytes,
        })
    }

    /// The stream of messages starting at logical position `offset`, in
    /// append order. `fetch(0)` enumerates the whole log.
    pub fn fetch<'a, E>(
        &'a self,
        offset: u64,
        store: &'a NodeStore<E>,
    ) -> impl Stream<Item = Result<Message, StrataLogError>> + 'a
    where
        E: Encoder + ConditionalSync,
    {
        message_stream(Node::Log(Box::new(self.clone())), offset, store)
    }

    /// The full message stream, in append order.
    pub fn messages<'a, E>(
        &'a self,
        store: &'a NodeStore<E>,
    ) -> impl Stream<Item = Result<Message, StrataLogError>> + 'a
    where
        E: Encoder + ConditionalSync,
    {
        self.fetch(0, store)
    }

    /// Persist this log's subtrees, returning a log whose internals are
    /// references. See [`NodeStore::persist`].
    pub async fn persist<E>(&self, store: &NodeStore<E>) -> Result<Log, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        store.persist(self).await
    }

    /// Persist this log and write the log value itself, returning the
    /// persisted log and its address. See [`NodeStore::checkpoint`].
    pub async fn checkpoint<E>(&self, store: &NodeStore<E>) -> Result<(Log, Uri), StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        store.checkpoint(self).await
    }

    /// Read a checkpointed log back from its address.
    pub async fn load<E>(uri: &Uri, store: &NodeStore<E>) -> Result<Log, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        store.load(uri).await
    }

    /// An inspection structure describing this log's shape.
    pub fn summarise(&self) -> LogSummary {
        Summary::of_log(self)
    }

    pub(crate) fn with_parts(&self, root: Node, tail: Tail) -> Log {
        Log {
            root,
            tail,
            branching_factor: self.branching_factor,
            max_inline_bytes: self.max_inline_bytes,
            optimal_slab_bytes: self.optimal_slab_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_validates_options() {
        assert!(Log::new(LogOptions::default()).is_ok());
        assert!(
            Log::new(LogOptions {
                branching_factor: 1,
                ..LogOptions::default()
            })
            .is_err()
        );
        assert!(
            Log::new(LogOptions {
                max_inline_bytes: 511,
                ..LogOptions::default()
            })
            .is_err()
        );
        assert!(
            Log::new(LogOptions {
                optimal_slab_bytes: 1023,
                ..LogOptions::default()
            })
            .is_err()
        );
    }

    #[test]
    fn it_starts_empty() {
        let log = Log::new(LogOptions::default()).expect("valid options");

        assert!(log.is_empty());
        assert_eq!(log.length(), 0);
        assert!(log.summarise().root.is_empty_tree());
    }
}
