use std::sync::Arc;

use base58::ToBase58;
use futures_util::{FutureExt, future::BoxFuture, future::try_join_all, try_join};
use ipld_core::ipld::Ipld;
use sieve_cache::SieveCache;
use strata_common::ConditionalSync;
use strata_storage::{BlobStore, Encoder, StrataStorageError, Uri};
use tokio::sync::Mutex;

use crate::{Log, Node, RefKind, Reference, StrataLogError, Tail, Tree};

const SLAB_CACHE_CAPACITY: usize = 64;
const TAIL_CACHE_CAPACITY: usize = 64;
const TREE_CACHE_CAPACITY: usize = 128;

/// The four base locations that persistence writes under. They may all
/// point at the same physical location.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageSpec {
    /// Where persisted slabs are written
    pub slab_base: Uri,
    /// Where persisted trees are written
    pub tree_base: Uri,
    /// Where persisted tails are written
    pub tail_base: Uri,
    /// Where checkpointed logs are written
    pub log_base: Uri,
}

impl StorageSpec {
    /// A [`StorageSpec`] with every kind of node written under one base
    /// location.
    pub fn single(base: Uri) -> Self {
        StorageSpec {
            slab_base: base.clone(),
            tree_base: base.clone(),
            tail_base: base.clone(),
            log_base: base,
        }
    }
}

type NodeCache = Arc<Mutex<SieveCache<String, Node>>>;

fn make_cache(capacity: usize) -> Result<NodeCache, StrataLogError> {
    Ok(Arc::new(Mutex::new(SieveCache::new(capacity).map_err(
        |error| {
            StrataLogError::Storage(StrataStorageError::StorageBackend(format!(
                "Could not initialize cache: {error}"
            )))
        },
    )?)))
}

/// A `NodeStore` binds an [`Encoder`], a [`BlobStore`] and a [`StorageSpec`]
/// together with bounded caches of recently resolved nodes.
///
/// Clones share the caches and the blob store, so a store may be handed to
/// concurrent readers freely. The caches may be dropped at any time with no
/// semantic consequence; they only avoid repeat fetches.
#[derive(Clone)]
pub struct NodeStore<E>
where
    E: Encoder,
{
    encoder: E,
    blobs: BlobStore,
    spec: StorageSpec,
    slab_cache: NodeCache,
    tail_cache: NodeCache,
    tree_cache: NodeCache,
}

impl<E> NodeStore<E>
where
    E: Encoder + ConditionalSync,
{
    /// Create a new store over the given encoder, blob store and spec.
    pub fn new(encoder: E, blobs: BlobStore, spec: StorageSpec) -> Result<Self, StrataLogError> {
        Ok(NodeStore {
            encoder,
            blobs,
            spec,
            slab_cache: make_cache(SLAB_CACHE_CAPACITY)?,
            tail_cache: make_cache(TAIL_CACHE_CAPACITY)?,
            tree_cache: make_cache(TREE_CACHE_CAPACITY)?,
        })
    }

    /// The encoder used for node and value codec duties.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// The storage spec this store writes under.
    pub fn spec(&self) -> &StorageSpec {
        &self.spec
    }

    /// The number of cached nodes, per kind: `(slabs, tails, trees)`.
    pub async fn cached_node_counts(&self) -> (usize, usize, usize) {
        (
            self.slab_cache.lock().await.len(),
            self.tail_cache.lock().await.len(),
            self.tree_cache.lock().await.len(),
        )
    }

    fn cache_for(&self, kind: RefKind) -> &NodeCache {
        match kind {
            RefKind::Slab => &self.slab_cache,
            RefKind::Tail => &self.tail_cache,
            RefKind::Tree => &self.tree_cache,
        }
    }

    pub(crate) async fn decode_node(&self, bytes: &[u8]) -> Result<Node, StrataLogError> {
        self.encoder
            .decode::<Node>(bytes)
            .await
            .map_err(StrataLogError::codec)
    }

    pub(crate) async fn decode_value(&self, bytes: &[u8]) -> Result<Ipld, StrataLogError> {
        self.encoder
            .decode::<Ipld>(bytes)
            .await
            .map_err(StrataLogError::codec)
    }

    /// Materialize the node a [`Reference`] stands for, consulting the
    /// appropriate cache first and installing the resolved node on a miss.
    pub async fn read(&self, reference: &Reference) -> Result<Node, StrataLogError> {
        let key = reference.uri().to_string();
        {
            let mut cache = self.cache_for(reference.kind()).lock().await;
            if let Some(node) = cache.get(&key) {
                return Ok(node.clone());
            }
        }
        tracing::trace!("cache miss for {reference}");

        let Some(bytes) = self.blobs.get(reference.uri()).await? else {
            return Err(StrataLogError::MissingBlob(format!("{reference}")));
        };
        let node = self.decode_node(&bytes).await?;
        if !reference.matches(&node) {
            return Err(StrataLogError::Decode(format!(
                "Blob at {} decoded to a {}, expected a {}",
                reference.uri(),
                node.kind_name(),
                reference.kind()
            )));
        }

        self.cache_for(reference.kind())
            .lock()
            .await
            .insert(key, node.clone());
        Ok(node)
    }

    /// Resolve a node if it is a reference; return it unchanged otherwise.
    pub async fn unref(&self, node: &Node) -> Result<Node, StrataLogError> {
        match node {
            Node::Reference(reference) => self.read(reference).await,
            other => Ok(other.clone()),
        }
    }

    /// Write a node under the content-addressed key `<kind>/<hash>` joined
    /// onto `base`, returning a [`Reference`] to it.
    async fn write(
        &self,
        base: &Uri,
        kind: RefKind,
        node: Node,
    ) -> Result<Reference, StrataLogError> {
        let (hash, bytes) = self
            .encoder
            .encode(&node)
            .await
            .map_err(StrataLogError::codec)?;
        let uri = base
            .join_key(kind.as_str())?
            .join_key(&hash.as_ref().to_base58())?;
        self.blobs.put(&uri, bytes.as_ref().to_vec()).await?;
        tracing::debug!("persisted {kind} node to {uri}");

        let reference = Reference::new(uri, kind, node.length(), node.byte_count());
        self.cache_for(kind)
            .lock()
            .await
            .insert(reference.uri().to_string(), node);
        Ok(reference)
    }

    /// Write every unpersisted subtree of `log` to durable storage and
    /// return the log with those subtrees replaced by references.
    ///
    /// The root and the tail are persisted in parallel, as are sibling
    /// children within a tree. The log's own tail is the one mutable surface
    /// that stays inline: its inner nodes are persisted, but the tail itself
    /// is never externalized.
    pub async fn persist(&self, log: &Log) -> Result<Log, StrataLogError> {
        let (root, tail) = try_join!(
            self.persist_node(log.root().clone()),
            self.persist_root_tail(log.tail().clone()),
        )?;
        Ok(log.with_parts(root, tail))
    }

    /// Persist a single subtree, returning it with persisted descendants
    /// replaced by references. Unlike [`NodeStore::persist`], a tail passed
    /// here is externalized whole.
    pub async fn persist_subtree(&self, node: &Node) -> Result<Node, StrataLogError> {
        self.persist_node(node.clone()).await
    }

    fn persist_node<'a>(&'a self, node: Node) -> BoxFuture<'a, Result<Node, StrataLogError>> {
        async move {
            match node {
                Node::Tree(tree) => {
                    if tree.is_empty() {
                        return Ok(Node::Tree(tree));
                    }
                    let values = try_join_all(
                        tree.elements()
                            .iter()
                            .map(|element| self.persist_node(element.value().clone())),
                    )
                    .await?;
                    let elements = tree
                        .elements()
                        .iter()
                        .zip(values)
                        .map(|(element, value)| element.with_value(value, element.nslabs()))
                        .collect();
                    let tree = Tree::with_elements(tree.branching_factor(), elements);
                    let reference = self
                        .write(&self.spec.tree_base, RefKind::Tree, Node::Tree(tree))
                        .await?;
                    Ok(Node::Reference(reference.with_framing()))
                }
                Node::Slab(_) => {
                    let reference = self.write(&self.spec.slab_base, RefKind::Slab, node).await?;
                    Ok(Node::Reference(reference.with_framing()))
                }
                Node::Tail(_) => {
                    let reference = self.write(&self.spec.tail_base, RefKind::Tail, node).await?;
                    Ok(Node::Reference(reference.with_framing()))
                }
                Node::Log(log) => Ok(Node::Log(Box::new(self.persist(&log).await?))),
                Node::Buffer(_) | Node::Reference(_) => Ok(node),
            }
        }
        .boxed()
    }

    async fn persist_root_tail(&self, tail: Tail) -> Result<Tail, StrataLogError> {
        let nodes = try_join_all(
            tail.nodes()
                .iter()
                .map(|inner| self.persist_node(inner.clone())),
        )
        .await?;
        Ok(tail.with_nodes(nodes))
    }

    /// Persist `log` and then write the persisted log value itself under the
    /// log base location, returning the persisted log and its address.
    pub async fn checkpoint(&self, log: &Log) -> Result<(Log, Uri), StrataLogError> {
        let persisted = self.persist(log).await?;
        let (hash, bytes) = self
            .encoder
            .encode(&persisted)
            .await
            .map_err(StrataLogError::codec)?;
        let uri = self
            .spec
            .log_base
            .join_key("log")?
            .join_key(&hash.as_ref().to_base58())?;
        self.blobs.put(&uri, bytes.as_ref().to_vec()).await?;
        tracing::debug!("checkpointed log to {uri}");
        Ok((persisted, uri))
    }

    /// Read a checkpointed log back from its address.
    pub async fn load(&self, uri: &Uri) -> Result<Log, StrataLogError> {
        let Some(bytes) = self.blobs.get(uri).await? else {
            return Err(StrataLogError::MissingBlob(uri.to_string()));
        };
        self.encoder
            .decode::<Log>(&bytes)
            .await
            .map_err(StrataLogError::codec)
    }
}
