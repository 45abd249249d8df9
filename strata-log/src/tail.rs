use std::sync::Arc;

use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use strata_common::ConditionalSync;
use strata_storage::Encoder;

use crate::{Buffer, Node, NodeStore, Slab, StrataLogError, TAIL_OVERHEAD};

/// The mutable frontier of the log.
///
/// A tail accumulates recent appends in a bounded inline area (`buffers`).
/// When an append would overflow the inline budget, the current tail is
/// demoted to an inner node and a fresh inline area begins; oversized
/// payloads bypass the inline area entirely as singleton slabs. The logical
/// message order is `nodes` first, then `buffers`.
///
/// `inline_bytes` tracks the framing overhead plus the byte count of the
/// inline buffers only; `byte_count` additionally includes the inner nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tail {
    nodes: Arc<Vec<Node>>,
    buffers: Arc<Vec<Buffer>>,
    inline_bytes: u64,
    max_inline_bytes: u64,
    length: u64,
    byte_count: u64,
}

impl Tail {
    /// Create an empty [`Tail`] with the given inline budget.
    pub fn empty(max_inline_bytes: u64) -> Self {
        Tail {
            nodes: Arc::new(Vec::new()),
            buffers: Arc::new(Vec::new()),
            inline_bytes: TAIL_OVERHEAD,
            max_inline_bytes,
            length: 0,
            byte_count: TAIL_OVERHEAD,
        }
    }

    /// The inner nodes preceding the inline area, in logical order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The inline buffers, in logical order.
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// The framing overhead plus the byte count of the inline buffers.
    pub fn inline_bytes(&self) -> u64 {
        self.inline_bytes
    }

    /// The inline byte budget.
    pub fn max_inline_bytes(&self) -> u64 {
        self.max_inline_bytes
    }

    /// The number of messages in this tail.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The serialized size of this tail, framing and inner nodes included.
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Whether this tail holds no nodes and no buffers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.buffers.is_empty()
    }

    /// Add a node's contents to this tail, producing a new [`Tail`].
    ///
    /// Empty nodes are dropped. A single buffer goes through
    /// [`Tail::add_buffer`]. A node small enough to share the inline budget
    /// is flattened into it one buffer at a time; anything larger is
    /// installed whole as an inner node.
    pub async fn add<E>(&self, node: Node, store: &NodeStore<E>) -> Result<Tail, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        if node.length() == 0 {
            return Ok(self.clone());
        }
        let node = match node {
            Node::Buffer(buffer) => return Ok(self.add_buffer(buffer)),
            node => node,
        };
        if self.inline_bytes + node.byte_count() <= self.max_inline_bytes {
            let mut tail = self.clone();
            let stream = node.buffers(store);
            tokio::pin!(stream);
            while let Some(buffer) = stream.try_next().await? {
                tail = tail.add_buffer(buffer);
            }
            Ok(tail)
        } else {
            Ok(self.adopt(node))
        }
    }

    /// Add a single buffer to this tail, producing a new [`Tail`].
    pub fn add_buffer(&self, buffer: Buffer) -> Tail {
        let payload_len = buffer.payload().len() as u64;
        if payload_len > self.max_inline_bytes {
            // Oversized payloads never enter the inline area.
            self.adopt(Node::Slab(Slab::singleton(buffer)))
        } else if self.inline_bytes + payload_len > self.max_inline_bytes {
            self.shift(buffer)
        } else {
            let mut buffers = self.buffers.as_ref().clone();
            let length = self.length + buffer.length();
            let byte_count = self.byte_count + buffer.byte_count();
            let inline_bytes = self.inline_bytes + buffer.byte_count();
            buffers.push(buffer);
            Tail {
                nodes: self.nodes.clone(),
                buffers: Arc::new(buffers),
                inline_bytes,
                max_inline_bytes: self.max_inline_bytes,
                length,
                byte_count,
            }
        }
    }

    /// Demote this tail to an inner node of a fresh one whose inline area
    /// holds only `buffer`.
    fn shift(&self, buffer: Buffer) -> Tail {
        let nodes = if self.is_empty() {
            Vec::new()
        } else {
            vec![Node::Tail(self.clone())]
        };
        let carried: u64 = nodes.iter().map(Node::byte_count).sum();
        let length = self.length + buffer.length();
        let inline_bytes = TAIL_OVERHEAD + buffer.byte_count();
        let byte_count = inline_bytes + carried;
        Tail {
            nodes: Arc::new(nodes),
            buffers: Arc::new(vec![buffer]),
            inline_bytes,
            max_inline_bytes: self.max_inline_bytes,
            length,
            byte_count,
        }
    }

    /// Install `node` as a child: the existing tail becomes an inner node
    /// and the inline area starts over.
    pub(crate) fn adopt(&self, node: Node) -> Tail {
        let mut nodes = if self.is_empty() {
            Vec::new()
        } else {
            vec![Node::Tail(self.clone())]
        };
        let length = self.length + node.length();
        nodes.push(node);
        let byte_count = TAIL_OVERHEAD + nodes.iter().map(Node::byte_count).sum::<u64>();
        Tail {
            nodes: Arc::new(nodes),
            buffers: Arc::new(Vec::new()),
            inline_bytes: TAIL_OVERHEAD,
            max_inline_bytes: self.max_inline_bytes,
            length,
            byte_count,
        }
    }

    /// Rebuild this tail with its inner nodes swapped for equivalent
    /// (persisted) forms. The inline area is untouched.
    pub(crate) fn with_nodes(&self, nodes: Vec<Node>) -> Tail {
        debug_assert_eq!(
            nodes.iter().map(Node::length).sum::<u64>(),
            self.nodes.iter().map(Node::length).sum::<u64>(),
        );
        let byte_count = self.inline_bytes + nodes.iter().map(Node::byte_count).sum::<u64>();
        Tail {
            nodes: Arc::new(nodes),
            buffers: self.buffers.clone(),
            inline_bytes: self.inline_bytes,
            max_inline_bytes: self.max_inline_bytes,
            length: self.length,
            byte_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TAIL_OVERHEAD;

    #[test]
    fn it_accumulates_small_buffers_inline() {
        let tail = Tail::empty(512)
            .add_buffer(Buffer::bytes(vec![0; 100]))
            .add_buffer(Buffer::bytes(vec![0; 100]));

        assert_eq!(tail.length(), 2);
        assert_eq!(tail.buffers().len(), 2);
        assert!(tail.nodes().is_empty());
        assert!(tail.inline_bytes() <= tail.max_inline_bytes());
    }

    #[test]
    fn it_shifts_when_the_inline_budget_would_overflow() {
        let tail = Tail::empty(256)
            .add_buffer(Buffer::bytes(vec![0; 200]))
            .add_buffer(Buffer::bytes(vec![0; 200]));

        assert_eq!(tail.length(), 2);
        assert_eq!(tail.buffers().len(), 1);
        assert_eq!(tail.nodes().len(), 1);
        assert!(matches!(tail.nodes()[0], Node::Tail(_)));
    }

    #[test]
    fn it_seals_an_oversized_buffer_into_a_slab() {
        let tail = Tail::empty(256).add_buffer(Buffer::bytes(vec![0; 1000]));

        assert_eq!(tail.length(), 1);
        assert!(tail.buffers().is_empty());
        assert_eq!(tail.inline_bytes(), TAIL_OVERHEAD);
        assert!(matches!(tail.nodes()[0], Node::Slab(_)));
    }

    #[test]
    fn it_does_not_wrap_an_empty_tail_when_shifting() {
        let tail = Tail::empty(256).add_buffer(Buffer::bytes(vec![0; 1000]));

        assert_eq!(tail.nodes().len(), 1);
    }

    #[test]
    fn it_tracks_byte_count_as_inline_plus_inner_nodes() {
        let tail = Tail::empty(256)
            .add_buffer(Buffer::bytes(vec![0; 200]))
            .add_buffer(Buffer::bytes(vec![0; 100]));

        let carried: u64 = tail.nodes().iter().map(Node::byte_count).sum();
        assert_eq!(tail.byte_count(), tail.inline_bytes() + carried);
    }
}
