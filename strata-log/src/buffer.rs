use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};
use strata_common::{Bytes, ConditionalSync};
use strata_storage::Encoder;

use crate::{BUFFER_OVERHEAD, Node, StrataLogError};

/// A [`BufferKind`] records how a [`Buffer`]'s payload should be decoded
/// when its messages are enumerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferKind {
    /// An opaque byte sequence
    RawBytes,
    /// A UTF-8 encoded string
    Utf8String,
    /// An application value encoded by the value codec
    EncodedValue,
    /// A whole serialized [`Node`]
    EmbeddedNode,
}

/// The atomic unit of storage: a byte payload annotated with its decoding
/// hint.
///
/// A buffer holding raw bytes, a string or an encoded value represents
/// exactly one message. A buffer holding an embedded node represents as many
/// messages as the node it embeds, which allows entire sub-logs to be pushed
/// as single entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Buffer {
    payload: Bytes,
    kind: BufferKind,
    length: u64,
}

impl Buffer {
    /// Create a raw byte buffer holding a single message.
    pub fn bytes(payload: impl Into<Bytes>) -> Self {
        Buffer {
            payload: payload.into(),
            kind: BufferKind::RawBytes,
            length: 1,
        }
    }

    /// Create a buffer holding a single UTF-8 string message.
    pub fn text(text: impl Into<String>) -> Self {
        Buffer {
            payload: text.into().into_bytes().into(),
            kind: BufferKind::Utf8String,
            length: 1,
        }
    }

    /// Create a buffer holding a single application value, encoded with the
    /// value codec.
    pub async fn value<E>(value: &Ipld, encoder: &E) -> Result<Self, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        let (_, bytes) = encoder.encode(value).await.map_err(StrataLogError::codec)?;
        Ok(Buffer {
            payload: bytes.as_ref().to_vec().into(),
            kind: BufferKind::EncodedValue,
            length: 1,
        })
    }

    /// Create a buffer embedding a whole serialized [`Node`]. The buffer
    /// represents as many messages as the node does.
    pub async fn embed<E>(node: &Node, encoder: &E) -> Result<Self, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        let (_, bytes) = encoder.encode(node).await.map_err(StrataLogError::codec)?;
        Ok(Buffer {
            payload: bytes.as_ref().to_vec().into(),
            kind: BufferKind::EmbeddedNode,
            length: node.length(),
        })
    }

    /// The payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The decoding hint for the payload.
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// The number of messages this buffer represents.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The payload size plus framing.
    pub fn byte_count(&self) -> u64 {
        BUFFER_OVERHEAD + self.payload.len() as u64
    }
}
