use std::sync::Arc;

use futures_util::{FutureExt, future::BoxFuture};
use serde::{Deserialize, Serialize};
use strata_common::ConditionalSync;
use strata_storage::Encoder;

use crate::{
    Node, NodeStore, RefKind, Slab, StrataLogError, TREE_ELEMENT_OVERHEAD, TREE_OVERHEAD,
};

/// One branch of a [`Tree`]: a slab, a subtree, or a reference to either,
/// annotated with the metadata needed for offset lookup and balancing.
///
/// `offset` is the cumulative message offset at which `value` begins within
/// the containing tree; `nslabs` is the number of slab-equivalent leaves
/// beneath `value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeElement {
    offset: u64,
    length: u64,
    byte_count: u64,
    nslabs: u64,
    value: Node,
}

impl TreeElement {
    pub(crate) fn new(offset: u64, value: Node, nslabs: u64) -> Self {
        debug_assert!(matches!(
            value,
            Node::Slab(_) | Node::Tree(_) | Node::Reference(_)
        ));
        TreeElement {
            offset,
            length: value.length(),
            byte_count: value.byte_count(),
            nslabs,
            value,
        }
    }

    /// Rebuild this element around a replacement value, keeping its offset.
    pub(crate) fn with_value(&self, value: Node, nslabs: u64) -> Self {
        TreeElement::new(self.offset, value, nslabs)
    }

    /// The cumulative message offset at which this element begins.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The number of messages under this element.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The byte count of this element's value.
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// The number of slab-equivalent leaves under this element.
    pub fn nslabs(&self) -> u64 {
        self.nslabs
    }

    /// The slab, subtree or reference this element wraps.
    pub fn value(&self) -> &Node {
        &self.value
    }
}

/// A persistent, right-growing, height-balanced tree whose leaves are slabs
/// or references to slabs.
///
/// Within a tree, every element but the last covers the same number of
/// slab-equivalent leaves; the last may cover fewer while it is being
/// filled. [`Tree::push_slab`] preserves this balance: it always fills the
/// rightmost incomplete branch before widening the current level, widens
/// only when every branch is full, and grows a new root when the level
/// itself is full.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    branching_factor: usize,
    elements: Arc<Vec<TreeElement>>,
    length: u64,
    byte_count: u64,
}

impl Tree {
    /// Create an empty [`Tree`].
    pub fn empty(branching_factor: usize) -> Self {
        Tree {
            branching_factor,
            elements: Arc::new(Vec::new()),
            length: 0,
            byte_count: TREE_OVERHEAD,
        }
    }

    pub(crate) fn with_elements(branching_factor: usize, elements: Vec<TreeElement>) -> Self {
        let mut expected_offset = 0;
        for element in &elements {
            debug_assert_eq!(element.offset(), expected_offset);
            expected_offset += element.length();
        }
        let length = expected_offset;
        let byte_count = TREE_OVERHEAD
            + elements
                .iter()
                .map(|element| TREE_ELEMENT_OVERHEAD + element.byte_count())
                .sum::<u64>();
        Tree {
            branching_factor,
            elements: Arc::new(elements),
            length,
            byte_count,
        }
    }

    /// The maximum number of elements per level.
    pub fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    /// The elements of this tree, in offset order.
    pub fn elements(&self) -> &[TreeElement] {
        &self.elements
    }

    /// The number of messages in this tree.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The serialized size of this tree, framing included.
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Whether this tree has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Push a sealed slab onto the right edge of the tree, producing a new
    /// [`Tree`] that shares structure with this one.
    pub async fn push_slab<E>(
        &self,
        slab: Slab,
        store: &NodeStore<E>,
    ) -> Result<Tree, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        if slab.length() == 0 {
            return Err(StrataLogError::UnexpectedShape(
                "Cannot push an empty slab into a tree".into(),
            ));
        }
        self.push_leaf(Node::Slab(slab), store).await
    }

    /// Push a single slab-equivalent leaf (a slab, or a reference to one).
    ///
    /// Recursion depth is bounded by the tree height, which grows with the
    /// logarithm (base `branching_factor`) of the leaf count.
    fn push_leaf<'a, E>(
        &'a self,
        leaf: Node,
        store: &'a NodeStore<E>,
    ) -> BoxFuture<'a, Result<Tree, StrataLogError>>
    where
        E: Encoder + ConditionalSync,
    {
        async move {
            let elements = self.elements.as_ref();

            // An empty tree takes the leaf as its first element.
            if elements.is_empty() {
                return Ok(Tree::with_elements(
                    self.branching_factor,
                    vec![TreeElement::new(0, leaf, 1)],
                ));
            }

            let balanced = elements
                .iter()
                .all(|element| element.nslabs() == elements[0].nslabs());

            if balanced {
                if elements.len() < self.branching_factor {
                    // Widen this level.
                    let mut next = elements.to_vec();
                    next.push(TreeElement::new(self.length, leaf, 1));
                    Ok(Tree::with_elements(self.branching_factor, next))
                } else {
                    // This level is full: the whole tree becomes the first
                    // child of a taller one, and the push starts over there.
                    let nslabs = elements.iter().map(TreeElement::nslabs).sum();
                    let child = TreeElement::new(0, Node::Tree(self.clone()), nslabs);
                    let parent = Tree::with_elements(self.branching_factor, vec![child]);
                    parent.push_leaf(leaf, store).await
                }
            } else {
                // The rightmost element is still filling; descend into it.
                let (head, last) = elements.split_at(elements.len() - 1);
                let last = &last[0];

                let element = match last.value() {
                    Node::Reference(reference) if reference.kind() == RefKind::Tree => {
                        let subtree = match store.read(reference).await? {
                            Node::Tree(subtree) => subtree,
                            other => {
                                return Err(StrataLogError::UnexpectedShape(format!(
                                    "Tree reference {reference} resolved to a {}",
                                    other.kind_name()
                                )));
                            }
                        };
                        let subtree = subtree.push_leaf(leaf, store).await?;
                        last.with_value(Node::Tree(subtree), last.nslabs() + 1)
                    }
                    Node::Tree(subtree) => {
                        let subtree = subtree.push_leaf(leaf, store).await?;
                        last.with_value(Node::Tree(subtree), last.nslabs() + 1)
                    }
                    Node::Slab(_) => {
                        let inner = self.two_leaf_subtree(last.value().clone(), leaf, store).await?;
                        last.with_value(Node::Tree(inner), 2)
                    }
                    Node::Reference(reference) if reference.kind() == RefKind::Slab => {
                        let inner = self.two_leaf_subtree(last.value().clone(), leaf, store).await?;
                        last.with_value(Node::Tree(inner), 2)
                    }
                    other => {
                        return Err(StrataLogError::UnexpectedShape(format!(
                            "Tree element holds a {}",
                            other.kind_name()
                        )));
                    }
                };

                let mut next = head.to_vec();
                next.push(element);
                Ok(Tree::with_elements(self.branching_factor, next))
            }
        }
        .boxed()
    }

    /// Upgrade a leaf into an inner tree holding the existing leaf and the
    /// incoming one.
    async fn two_leaf_subtree<E>(
        &self,
        existing: Node,
        incoming: Node,
        store: &NodeStore<E>,
    ) -> Result<Tree, StrataLogError>
    where
        E: Encoder + ConditionalSync,
    {
        Tree::empty(self.branching_factor)
            .push_leaf(existing, store)
            .await?
            .push_leaf(incoming, store)
            .await
    }
}
