//! Byte payload newtype with a CBOR-friendly serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;

/// A newtype wrapper around `Vec<u8>` that serializes as a byte string.
///
/// A plain `Vec<u8>` serializes as a sequence of integers, which produces a
/// CBOR list. `Bytes` serializes through `serialize_bytes` instead, producing
/// a proper CBOR byte string. Every payload that crosses an encoding boundary
/// in the strata crates is carried as `Bytes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Create a new empty `Bytes`.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Get the inner bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Convert into the inner `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// The length of the bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bytes are empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(bytes: Bytes) -> Self {
        bytes.0
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Bytes {
    fn from(array: [u8; N]) -> Self {
        Self(array.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Bytes {
    fn from(array: &[u8; N]) -> Self {
        Self(array.to_vec())
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BytesVisitor;

        impl<'de> serde::de::Visitor<'de> for BytesVisitor {
            type Value = Bytes;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("byte array")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Bytes(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Bytes(v))
            }
        }

        deserializer.deserialize_byte_buf(BytesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_converts_to_and_from_vec() {
        let bytes = Bytes::from(vec![1, 2, 3]);
        assert_eq!(bytes.as_slice(), &[1, 2, 3]);

        let vec: Vec<u8> = bytes.into();
        assert_eq!(vec, vec![1, 2, 3]);
    }

    #[test]
    fn it_dereferences_to_a_slice() {
        let bytes = Bytes::from([1u8, 2, 3]);
        assert_eq!(&*bytes, &[1, 2, 3]);
        assert_eq!(bytes.len(), 3);
    }
}
