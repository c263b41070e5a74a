//! Positions in a B-tree and the descent shared by the find family.

use super::node::{Node, NodeLayout, PackedNode};
use super::BForest;
use crate::Probe;
use core::cmp::Ordering;

/// A position in a B-tree: a node and an entry index within it.
///
/// The end sentinel is the root node with an index equal to its element count (or a null node
/// for an empty tree); it compares equal to [`BTree::end`](super::BTree::end) and is not
/// dereferenceable. A place is invalidated by any mutation of its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Place {
    pub(crate) node: PackedNode,
    pub(crate) index: u32,
}

impl Place {
    pub(crate) fn null() -> Self {
        Self {
            node: None.into(),
            index: 0,
        }
    }

    pub(crate) fn at(node: Node, index: usize) -> Self {
        Self {
            node: node.into(),
            index: index as u32,
        }
    }

    /// The element at this position, or `None` at the end sentinel.
    pub fn elem<L: NodeLayout>(self, forest: &BForest<L>) -> Option<L::Elem> {
        let node = self.node.expand()?;
        let n = &forest.nodes[node];
        if (self.index as usize) < n.len() {
            Some(n.elem(self.index as usize))
        } else {
            None
        }
    }

    /// The next position in ascending order.
    ///
    /// Advancing the end sentinel leaves it unchanged.
    pub fn next<L: NodeLayout>(self, forest: &BForest<L>) -> Place {
        let pool = &forest.nodes;
        let Some(mut node) = self.node.expand() else {
            return self;
        };
        let mut index = self.index as usize;
        if index >= pool[node].len() {
            return self;
        }
        if let Some(child) = pool[node].child_opt(index + 1) {
            // Leftmost element of the subtree to the right of this entry.
            node = child;
            while let Some(c) = pool[node].child_opt(0) {
                node = c;
            }
            return Place::at(node, 0);
        }
        index += 1;
        while index == pool[node].len() {
            match pool[node].parent.expand() {
                Some(p) => {
                    index = pool[node].parent_index as usize;
                    node = p;
                }
                // Ran off the root: this is the end sentinel.
                None => break,
            }
        }
        Place::at(node, index)
    }

    /// The previous position in ascending order.
    ///
    /// Retreating from the first element (or from the end sentinel of an empty tree) yields the
    /// end sentinel.
    pub fn prev<L: NodeLayout>(self, forest: &BForest<L>) -> Place {
        let pool = &forest.nodes;
        let Some(mut node) = self.node.expand() else {
            return self;
        };
        let mut index = self.index as usize;
        debug_assert!(index <= pool[node].len());
        if let Some(child) = pool[node].child_opt(index) {
            // Rightmost element of the subtree to the left of this entry.
            node = child;
            loop {
                let n = pool[node].len();
                match pool[node].child_opt(n) {
                    Some(c) => node = c,
                    None => return Place::at(node, n - 1),
                }
            }
        }
        while index == 0 {
            match pool[node].parent.expand() {
                Some(p) => {
                    index = pool[node].parent_index as usize;
                    node = p;
                }
                // Retreated past the first element.
                None => return Place::at(node, pool[node].len()),
            }
        }
        Place::at(node, index - 1)
    }
}

/// Where a descent from the root ended.
pub(crate) struct FindPos {
    pub node: Node,
    pub index: usize,
    pub hit: bool,
    /// Sign of the last comparison on a miss: `Greater` when the terminating position is one
    /// past the end of its leaf, `Less` when the target sorts before the element found there.
    pub last: Ordering,
}

/// Descend from `root` looking for the probe's target.
///
/// On a hit, `(node, index)` is the matching entry. On a miss, it is the leaf insertion
/// position for the target.
pub(crate) fn descend<L, P>(root: Node, forest: &BForest<L>, probe: &P) -> FindPos
where
    L: NodeLayout,
    P: Probe<L::Elem>,
{
    let pool = &forest.nodes;
    let mut node = root;
    loop {
        match pool[node].search(probe) {
            Ok(i) => {
                return FindPos {
                    node,
                    index: i,
                    hit: true,
                    last: Ordering::Equal,
                }
            }
            Err(i) => match pool[node].child_opt(i) {
                Some(c) => node = c,
                None => {
                    let last = if i == pool[node].len() {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    };
                    return FindPos {
                        node,
                        index: i,
                        hit: false,
                        last,
                    };
                }
            },
        }
    }
}

/// Turn a one-past-the-end leaf position into the next real entry, or the end sentinel.
pub(crate) fn clamp_forward<L: NodeLayout>(
    mut node: Node,
    mut index: usize,
    forest: &BForest<L>,
) -> Place {
    let pool = &forest.nodes;
    while index == pool[node].len() {
        match pool[node].parent.expand() {
            Some(p) => {
                index = pool[node].parent_index as usize;
                node = p;
            }
            None => break,
        }
    }
    Place::at(node, index)
}
