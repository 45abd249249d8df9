#![warn(missing_docs)]

//! This crate provides an append-only, durable, content-addressed message
//! log. Messages accumulate in a bounded in-memory tail; full tails are
//! sealed into slabs and pushed onto a right-growing balanced tree, and the
//! whole structure can be persisted to (and lazily fetched back from) a
//! pluggable blob store addressed by URI.
//!
//! In order to use it, construct a [`NodeStore`] over a
//! [`strata_storage::BlobStore`] and then build up a [`Log`] with it:
//!
//! ```rust
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use futures_util::TryStreamExt;
//! use strata_log::{Log, LogOptions, Message, NodeStore, StorageSpec};
//! use strata_storage::{BlobStore, CborEncoder};
//!
//! let store = NodeStore::new(
//!     CborEncoder,
//!     BlobStore::default(),
//!     StorageSpec::single("mem://blobs/logs".parse()?),
//! )?;
//!
//! let log = Log::new(LogOptions::default())?;
//! let log = log.append("hello", &store).await?;
//! let log = log.append("world", &store).await?;
//!
//! let messages: Vec<Message> = log.fetch(0, &store).try_collect().await?;
//! assert_eq!(messages.len(), 2);
//!
//! // Move the sealed structure into durable storage; the tail stays inline.
//! let log = log.persist(&store).await?;
//! assert_eq!(log.length(), 2);
//! # Ok(())
//! # }
//! ```

mod buffer;
pub use buffer::*;

mod codec;
pub use codec::*;

mod error;
pub use error::*;

mod log;
pub use log::*;

mod message;
pub use message::*;

mod node;
pub use node::*;

mod payload;
pub use payload::*;

mod reference;
pub use reference::*;

mod slab;
pub use slab::*;

mod store;
pub use store::*;

mod summary;
pub use summary::*;

mod tail;
pub use tail::*;

mod tree;
pub use tree::*;

mod walk;
