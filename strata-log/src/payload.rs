use ipld_core::ipld::Ipld;
use serde::Serialize;
use strata_common::ConditionalSync;
use strata_storage::{Encoder, StrataStorageError};

use crate::{Buffer, Log, Node, NodeStore, StrataLogError};

/// An input to [`Log::append`], before normalization into a [`Node`].
///
/// Raw bytes and strings become single-message buffers; an arbitrary
/// application value goes through the value codec; a node (including a whole
/// log) is appended structurally, carrying all of its messages.
#[derive(Clone, Debug)]
pub enum Payload {
    /// An opaque byte sequence
    Bytes(Vec<u8>),
    /// A UTF-8 string
    Text(String),
    /// An application value, to be encoded by the value codec
    Value(Ipld),
    /// An existing node
    Node(Node),
}

impl Payload {
    /// Convert any serializable application value into a [`Payload::Value`].
    pub fn encode<T>(value: &T) -> Result<Self, StrataLogError>
    where
        T: Serialize,
    {
        let value = ipld_core::serde::to_ipld(value)
            .map_err(|error| StrataStorageError::EncodeFailed(format!("{error}")))?;
        Ok(Payload::Value(value))
    }

    /// Normalize this payload into a [`Node`].
    pub(crate) async fn into_node<E>(self, store: &NodeStore<E>) -> Result<Node, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        Ok(match self {
            Payload::Bytes(bytes) => Node::Buffer(Buffer::bytes(bytes)),
            Payload::Text(text) => Node::Buffer(Buffer::text(text)),
            Payload::Value(value) => Node::Buffer(Buffer::value(&value, store.encoder()).await?),
            Payload::Node(node) => node,
        })
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}

impl From<Ipld> for Payload {
    fn from(value: Ipld) -> Self {
        Payload::Value(value)
    }
}

impl From<Node> for Payload {
    fn from(value: Node) -> Self {
        Payload::Node(value)
    }
}

impl From<Buffer> for Payload {
    fn from(value: Buffer) -> Self {
        Payload::Node(Node::Buffer(value))
    }
}

impl From<&Log> for Payload {
    fn from(value: &Log) -> Self {
        Payload::Node(Node::Log(Box::new(value.clone())))
    }
}
