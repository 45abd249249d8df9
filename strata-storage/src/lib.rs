#![warn(missing_docs)]

//! This crate contains a generalized API for durable, content-addressed blob
//! storage over different backends. It is the storage substrate of the
//! strata message log, but knows nothing about logs: it moves opaque bytes
//! to and from locations named by URI.
//!
//! The two halves of the API are an [Encoder], which converts values to and
//! from content-addressable bytes, and a [BlobStore], which routes reads and
//! writes to a [StorageBackend] according to the scheme of the target [Uri]:
//!
//! ```rust
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use strata_storage::{BlobStore, CborEncoder, Encoder, Uri};
//!
//! let encoder = CborEncoder;
//! let store = BlobStore::default();
//!
//! let (_hash, bytes) = encoder.encode(&vec![1u8, 2, 3]).await?;
//! let uri: Uri = "mem://blobs/example".parse()?;
//!
//! store.put(&uri, bytes).await?;
//! assert!(store.get(&uri).await?.is_some());
//! # Ok(())
//! # }
//! ```

mod encoder;
pub use encoder::*;

mod error;
pub use error::*;

mod hash;
pub use hash::*;

mod backend;
pub use backend::*;

mod uri;
pub use uri::*;

mod blob;
pub use blob::*;
