use serde::Serialize;

use crate::{BufferKind, Log, Node, RefKind, Tail};

/// An inspection structure describing a node's shape: lengths, byte counts,
/// element metadata and reference addresses, without any payload bytes.
#[derive(Clone, Debug, Serialize)]
pub enum Summary {
    /// A buffer leaf
    Buffer {
        /// Message count
        l: u64,
        /// Byte count
        b: u64,
        /// Decoding hint
        kind: BufferKind,
    },
    /// A sealed slab
    Slab {
        /// Message count
        l: u64,
        /// Byte count
        b: u64,
        /// Number of buffers in the slab
        buffers: usize,
    },
    /// A tail frontier
    Tail {
        /// Message count
        l: u64,
        /// Byte count
        b: u64,
        /// Framing plus inline buffer bytes
        inline_bytes: u64,
        /// Number of inline buffers
        buffers: usize,
        /// Summaries of the inner nodes
        nodes: Vec<Summary>,
    },
    /// A structural tree node
    Tree {
        /// Message count
        l: u64,
        /// Byte count
        b: u64,
        /// Per-element metadata, in offset order
        elements: Vec<ElementSummary>,
    },
    /// A reference to a persisted node
    Ref {
        /// Message count of the target
        l: u64,
        /// Byte count carried by the reference
        b: u64,
        /// The kind of node referenced
        kind: RefKind,
        /// The target address
        uri: String,
    },
    /// An embedded log
    Log(Box<LogSummary>),
}

/// The [`Summary`] of one tree element.
#[derive(Clone, Debug, Serialize)]
pub struct ElementSummary {
    /// Cumulative message offset of this element
    pub offset: u64,
    /// Message count under this element
    pub l: u64,
    /// Byte count of this element's value
    pub b: u64,
    /// Slab-equivalent leaves under this element
    pub nslabs: u64,
    /// The element's value
    pub value: Summary,
}

/// The [`Summary`] of a whole log: its root and tail side by side.
#[derive(Clone, Debug, Serialize)]
pub struct LogSummary {
    /// Message count
    pub l: u64,
    /// Byte count
    pub b: u64,
    /// The root's summary
    pub root: Summary,
    /// The tail's summary
    pub tail: Summary,
}

impl LogSummary {
    /// Every reference address appearing in this summary, depth-first.
    pub fn reference_uris(&self) -> Vec<String> {
        let mut uris = Vec::new();
        self.root.collect_reference_uris(&mut uris);
        self.tail.collect_reference_uris(&mut uris);
        uris
    }
}

impl Summary {
    pub(crate) fn of(node: &Node) -> Summary {
        match node {
            Node::Buffer(buffer) => Summary::Buffer {
                l: buffer.length(),
                b: buffer.byte_count(),
                kind: buffer.kind(),
            },
            Node::Slab(slab) => Summary::Slab {
                l: slab.length(),
                b: slab.byte_count(),
                buffers: slab.buffers().len(),
            },
            Node::Tail(tail) => Summary::of_tail(tail),
            Node::Tree(tree) => Summary::Tree {
                l: tree.length(),
                b: tree.byte_count(),
                elements: tree
                    .elements()
                    .iter()
                    .map(|element| ElementSummary {
                        offset: element.offset(),
                        l: element.length(),
                        b: element.byte_count(),
                        nslabs: element.nslabs(),
                        value: Summary::of(element.value()),
                    })
                    .collect(),
            },
            Node::Reference(reference) => Summary::Ref {
                l: reference.length(),
                b: reference.byte_count(),
                kind: reference.kind(),
                uri: reference.uri().to_string(),
            },
            Node::Log(log) => Summary::Log(Box::new(log.summarise())),
        }
    }

    pub(crate) fn of_tail(tail: &Tail) -> Summary {
        Summary::Tail {
            l: tail.length(),
            b: tail.byte_count(),
            inline_bytes: tail.inline_bytes(),
            buffers: tail.buffers().len(),
            nodes: tail.nodes().iter().map(Summary::of).collect(),
        }
    }

    pub(crate) fn of_log(log: &Log) -> LogSummary {
        LogSummary {
            l: log.length(),
            b: log.byte_count(),
            root: Summary::of(log.root()),
            tail: Summary::of_tail(log.tail()),
        }
    }

    /// Message count of the summarised node.
    pub fn l(&self) -> u64 {
        match self {
            Summary::Buffer { l, .. }
            | Summary::Slab { l, .. }
            | Summary::Tail { l, .. }
            | Summary::Tree { l, .. }
            | Summary::Ref { l, .. } => *l,
            Summary::Log(log) => log.l,
        }
    }

    /// Whether this summarises a tree with no elements.
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, Summary::Tree { elements, .. } if elements.is_empty())
    }

    /// Every reference address appearing in this summary, depth-first.
    pub fn reference_uris(&self) -> Vec<String> {
        let mut uris = Vec::new();
        self.collect_reference_uris(&mut uris);
        uris
    }

    fn collect_reference_uris(&self, uris: &mut Vec<String>) {
        match self {
            Summary::Ref { uri, .. } => uris.push(uri.clone()),
            Summary::Tree { elements, .. } => {
                for element in elements {
                    element.value.collect_reference_uris(uris);
                }
            }
            Summary::Tail { nodes, .. } => {
                for node in nodes {
                    node.collect_reference_uris(uris);
                }
            }
            Summary::Log(log) => {
                log.root.collect_reference_uris(uris);
                log.tail.collect_reference_uris(uris);
            }
            Summary::Buffer { .. } | Summary::Slab { .. } => {}
        }
    }
}
