//! Lazy traversal over the node structure.
//!
//! Both enumeration streams walk an explicit stack rather than recursing:
//! children are pushed in reverse so that popping preserves logical order,
//! and references are resolved through the store only when the walk reaches
//! them. The offset-fetch variant carries a skip counter that consumes whole
//! subtrees and buffers by their `length` aggregates before anything is
//! materialized or decoded.

use async_stream::try_stream;
use futures_core::Stream;
use ipld_core::ipld::Ipld;
use strata_common::ConditionalSync;
use strata_storage::Encoder;

use crate::{Buffer, BufferKind, Message, Node, NodeStore, StrataLogError};

enum Step {
    Expand(Node),
    Emit(Buffer),
}

/// How embedded-node buffers in a tail's inline area are scheduled.
///
/// The buffer stream decodes them eagerly so that only buffer leaves are
/// ever yielded; the message stream defers them to the emit step, where the
/// skip counter may discard them wholesale by their `length`.
#[derive(Clone, Copy, PartialEq)]
enum TailEmbedding {
    Decode,
    Defer,
}

async fn expand<E>(
    node: Node,
    stack: &mut Vec<Step>,
    store: &NodeStore<E>,
    embedding: TailEmbedding,
) -> Result<(), StrataLogError>
where
    E: Encoder + ConditionalSync,
{
    match node {
        Node::Buffer(buffer) => stack.push(Step::Emit(buffer)),
        Node::Slab(slab) => {
            let mut buffers: Vec<Buffer> = slab.buffers().iter().cloned().collect();
            buffers.reverse();
            for buffer in buffers {
                stack.push(Step::Emit(buffer));
            }
        }
        Node::Tail(tail) => {
            for buffer in tail.buffers().iter().rev() {
                if buffer.kind() == BufferKind::EmbeddedNode && embedding == TailEmbedding::Decode {
                    let embedded = store.decode_node(buffer.payload()).await?;
                    stack.push(Step::Expand(embedded));
                } else {
                    stack.push(Step::Emit(buffer.clone()));
                }
            }
            for inner in tail.nodes().iter().rev() {
                stack.push(Step::Expand(inner.clone()));
            }
        }
        Node::Tree(tree) => {
            for element in tree.elements().iter().rev() {
                stack.push(Step::Expand(element.value().clone()));
            }
        }
        Node::Log(log) => {
            stack.push(Step::Expand(Node::Tail(log.tail().clone())));
            stack.push(Step::Expand(log.root().clone()));
        }
        Node::Reference(reference) => {
            stack.push(Step::Expand(store.read(&reference).await?));
        }
    }
    Ok(())
}

/// The ordered stream of [`Buffer`] leaves under `node`.
///
/// Embedded-node buffers in a tail's inline area are decoded and flattened;
/// embedded-node buffers inside sealed slabs are yielded as-is.
pub(crate) fn buffer_stream<E>(
    node: Node,
    store: &NodeStore<E>,
) -> impl Stream<Item = Result<Buffer, StrataLogError>> + '_
where
    E: Encoder + ConditionalSync,
{
    try_stream! {
        let mut stack = vec![Step::Expand(node)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Emit(buffer) => yield buffer,
                Step::Expand(node) => {
                    expand(node, &mut stack, store, TailEmbedding::Decode).await?;
                }
            }
        }
    }
}

/// The stream of decoded messages under `node`, starting at logical
/// position `offset`.
///
/// Embedded nodes are always expanded into their messages here, wherever
/// the embedding buffer sits.
pub(crate) fn message_stream<E>(
    node: Node,
    offset: u64,
    store: &NodeStore<E>,
) -> impl Stream<Item = Result<Message, StrataLogError>> + '_
where
    E: Encoder + ConditionalSync,
{
    try_stream! {
        let mut skip = offset;
        let mut stack = vec![Step::Expand(node)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Emit(buffer) => {
                    if buffer.kind() == BufferKind::EmbeddedNode {
                        if skip >= buffer.length() {
                            skip -= buffer.length();
                        } else {
                            let embedded = store.decode_node(buffer.payload()).await?;
                            stack.push(Step::Expand(embedded));
                        }
                    } else if skip > 0 {
                        skip -= 1;
                    } else {
                        yield decode_message(&buffer, store).await?;
                    }
                }
                Step::Expand(node) => {
                    if skip >= node.length() {
                        skip -= node.length();
                    } else {
                        expand(node, &mut stack, store, TailEmbedding::Defer).await?;
                    }
                }
            }
        }
    }
}

async fn decode_message<E>(
    buffer: &Buffer,
    store: &NodeStore<E>,
) -> Result<Message, StrataLogError>
where
    E: Encoder + ConditionalSync,
{
    match buffer.kind() {
        BufferKind::RawBytes => Ok(Message::Bytes(buffer.payload().clone())),
        BufferKind::Utf8String => String::from_utf8(buffer.payload().to_vec())
            .map(Message::Text)
            .map_err(|error| {
                StrataLogError::Decode(format!("Invalid UTF-8 in string buffer: {error}"))
            }),
        BufferKind::EncodedValue => {
            let value: Ipld = store.decode_value(buffer.payload()).await?;
            Ok(Message::Value(value))
        }
        BufferKind::EmbeddedNode => Err(StrataLogError::UnexpectedShape(
            "Embedded node reached message decoding".into(),
        )),
    }
}
