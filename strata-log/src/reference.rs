use std::fmt::Display;

use serde::{Deserialize, Serialize};
use strata_storage::Uri;

use crate::{Node, REF_OVERHEAD};

/// The kinds of node that a [`Reference`] may stand in for.
///
/// A log root is never referenced; persistence keeps it inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    /// A persisted [`Slab`](crate::Slab)
    Slab,
    /// A persisted [`Tail`](crate::Tail)
    Tail,
    /// A persisted [`Tree`](crate::Tree)
    Tree,
}

impl RefKind {
    /// The key segment used when persisting nodes of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Slab => "slab",
            RefKind::Tail => "tail",
            RefKind::Tree => "tree",
        }
    }
}

impl Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An opaque handle to a persisted node: its location, the kind of node it
/// stands for, and the target's aggregates so that traversal can account for
/// (or skip over) the subtree without materializing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    uri: Uri,
    kind: RefKind,
    length: u64,
    byte_count: u64,
}

impl Reference {
    /// Create a new [`Reference`] carrying the target's aggregates.
    pub fn new(uri: Uri, kind: RefKind, length: u64, byte_count: u64) -> Self {
        Reference {
            uri,
            kind,
            length,
            byte_count,
        }
    }

    /// The location of the persisted node.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The kind of node this reference stands for.
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// The number of messages in the referenced subtree.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The byte count carried by this reference.
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Account for the reference framing in the byte count. Applied when a
    /// reference is installed in place of the node it stands for.
    pub fn with_framing(self) -> Self {
        Reference {
            byte_count: self.byte_count + REF_OVERHEAD,
            ..self
        }
    }

    /// Whether `node` is of the kind this reference stands for.
    pub fn matches(&self, node: &Node) -> bool {
        matches!(
            (self.kind, node),
            (RefKind::Slab, Node::Slab(_))
                | (RefKind::Tail, Node::Tail(_))
                | (RefKind::Tree, Node::Tree(_))
        )
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.kind, self.uri)
    }
}
