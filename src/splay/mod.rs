//! Splay-tree ordered sets and maps.
//!
//! A binary search tree that splays the last-touched node to the root after every insert, find
//! or removal, giving amortised O(log n) operations and fast re-access of recently used
//! elements. Because lookups restructure the tree, the whole find family takes the tree and
//! its forest mutably.

mod map;
mod node;

pub use self::map::SplayMap;
pub use self::node::Node;

use self::node::{
    leftmost, next_in_order, prev_in_order, replace_child, rightmost, splay, swap_positions,
    SNode, SPool,
};
use crate::{Comparator, ElemProbe, OrderedContainer, Probe};
use core::cmp::Ordering;
use core::marker::PhantomData;
use cranelift_entity::packed_option::PackedOption;

/// Memory pool for a forest of `SplayTree` instances storing `T`.
pub struct SplayForest<T: Copy> {
    pub(crate) nodes: SPool<T>,
}

impl<T: Copy> SplayForest<T> {
    /// Create a new empty forest.
    pub fn new() -> Self {
        Self { nodes: SPool::new() }
    }

    /// Discard all nodes. Every tree allocated from this forest is invalidated.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<T: Copy> Default for SplayForest<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A position in a splay tree. The end sentinel is the null position.
///
/// A place is invalidated by any mutation of its tree, including the find family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Place {
    node: PackedOption<Node>,
}

impl Place {
    fn null() -> Self {
        Self { node: None.into() }
    }

    fn at(node: Node) -> Self {
        Self { node: node.into() }
    }

    /// The element at this position, or `None` at the end sentinel.
    pub fn elem<T: Copy>(self, forest: &SplayForest<T>) -> Option<T> {
        self.node.expand().map(|n| forest.nodes[n].elem)
    }

    /// The next position in ascending order; the end sentinel stays put.
    pub fn next<T: Copy>(self, forest: &SplayForest<T>) -> Place {
        match self.node.expand() {
            None => self,
            Some(n) => Place {
                node: next_in_order(&forest.nodes, n).into(),
            },
        }
    }

    /// The previous position in ascending order.
    ///
    /// Retreating from the first element yields the end sentinel; so does retreating from the
    /// end sentinel itself, which cannot recover the last element without the tree (use
    /// [`SplayTree::last`] to start a descending walk).
    pub fn prev<T: Copy>(self, forest: &SplayForest<T>) -> Place {
        match self.node.expand() {
            None => self,
            Some(n) => Place {
                node: prev_in_order(&forest.nodes, n).into(),
            },
        }
    }
}

/// Splay tree representing an ordered set of `T`.
///
/// An empty tree is a single null root reference; all nodes belong to the forest the tree was
/// grown in, and every mutating operation takes that forest.
#[derive(Clone)]
pub struct SplayTree<T: Copy> {
    root: PackedOption<Node>,
    unused: PhantomData<T>,
}

impl<T: Copy> SplayTree<T> {
    /// Make an empty tree.
    pub fn new() -> Self {
        Self {
            root: None.into(),
            unused: PhantomData,
        }
    }

    /// Is this an empty tree?
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Descend from the root without splaying. Returns the last node visited and the final
    /// comparison: `Equal` on a hit, otherwise the side the target fell off.
    fn descend<P: Probe<T>>(&self, forest: &SplayForest<T>, probe: &P) -> Option<(Node, Ordering)> {
        let mut cur = self.root.expand()?;
        loop {
            let last = probe.probe(forest.nodes[cur].elem);
            let next = match last {
                Ordering::Less => forest.nodes[cur].left,
                Ordering::Greater => forest.nodes[cur].right,
                Ordering::Equal => return Some((cur, last)),
            };
            match next.expand() {
                Some(c) => cur = c,
                None => return Some((cur, last)),
            }
        }
    }

    /// Descend, splay the last node visited to the root, and report the final comparison.
    fn find_raw<P: Probe<T>>(
        &mut self,
        forest: &mut SplayForest<T>,
        probe: &P,
    ) -> (Place, Ordering) {
        match self.descend(forest, probe) {
            None => (Place::null(), Ordering::Equal),
            Some((cur, last)) => {
                splay(&mut forest.nodes, cur);
                self.root = cur.into();
                (Place::at(cur), last)
            }
        }
    }

    /// Try to insert `elem` into the set.
    ///
    /// Returns true on a new insertion; if an equal element is already present, the matching
    /// node is splayed to the root and the result is false.
    pub fn insert<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> bool {
        let probe = ElemProbe::new(elem, comp);
        let Some((guess, last)) = self.descend(forest, &probe) else {
            let node = forest.nodes.alloc(SNode::new(elem));
            self.root = node.into();
            return true;
        };
        if last == Ordering::Equal {
            splay(&mut forest.nodes, guess);
            self.root = guess.into();
            return false;
        }

        // The new node takes over the terminal node's position, keeping the terminal as its
        // child on the side the final comparison dictates.
        let node = forest.nodes.alloc(SNode::new(elem));
        let gp = forest.nodes[guess].parent;
        forest.nodes[node].parent = gp;
        if let Some(p) = gp.expand() {
            replace_child(&mut forest.nodes, p, guess, node.into());
        }
        match last {
            Ordering::Greater => forest.nodes[node].left = guess.into(),
            Ordering::Less => forest.nodes[node].right = guess.into(),
            Ordering::Equal => unreachable!(),
        }
        forest.nodes[guess].parent = node.into();

        splay(&mut forest.nodes, node);
        self.root = node.into();
        true
    }

    /// Remove the element at `place`. Removing the end position is a no-op.
    pub fn remove(&mut self, place: Place, forest: &mut SplayForest<T>) {
        let Some(node) = place.node.expand() else {
            return;
        };

        // A node with two children trades places with its in-order successor first, leaving it
        // with at most one child.
        if let (Some(_), Some(r)) = (
            forest.nodes[node].left.expand(),
            forest.nodes[node].right.expand(),
        ) {
            let succ = leftmost(&forest.nodes, r);
            swap_positions(&mut forest.nodes, node, succ);
            if self.root.expand() == Some(node) {
                self.root = succ.into();
            }
        }

        // Splice the remaining child into the vacated slot and splay the old parent.
        let child = match forest.nodes[node].left.expand() {
            Some(c) => Some(c),
            None => forest.nodes[node].right.expand(),
        };
        let parent = forest.nodes[node].parent.expand();
        if let Some(c) = child {
            forest.nodes[c].parent = parent.into();
        }
        match parent {
            Some(p) => {
                replace_child(&mut forest.nodes, p, node, child.into());
                splay(&mut forest.nodes, p);
                self.root = p.into();
            }
            None => self.root = child.into(),
        }
        forest.nodes.free(node);
    }

    /// Remove every element, returning all nodes to the forest.
    pub fn clear(&mut self, forest: &mut SplayForest<T>) {
        let Some(root) = self.root.take() else {
            return;
        };
        let mut stack = alloc::vec![root];
        while let Some(n) = stack.pop() {
            if let Some(l) = forest.nodes[n].left.expand() {
                stack.push(l);
            }
            if let Some(r) = forest.nodes[n].right.expand() {
                stack.push(r);
            }
            forest.nodes.free(n);
        }
    }

    /// Position of the smallest element.
    pub fn start(&self, forest: &SplayForest<T>) -> Place {
        match self.root.expand() {
            None => Place::null(),
            Some(r) => Place::at(leftmost(&forest.nodes, r)),
        }
    }

    /// The end sentinel position.
    pub fn end(&self) -> Place {
        Place::null()
    }

    /// Position of the greatest element; the starting point for a descending walk.
    pub fn last(&self, forest: &SplayForest<T>) -> Place {
        match self.root.expand() {
            None => Place::null(),
            Some(r) => Place::at(rightmost(&forest.nodes, r)),
        }
    }

    /// Position of the element the probe matches, or the end sentinel.
    pub fn find_eq_by<P: Probe<T>>(&mut self, forest: &mut SplayForest<T>, probe: &P) -> Place {
        let (place, last) = self.find_raw(forest, probe);
        if last == Ordering::Equal {
            place
        } else {
            Place::null()
        }
    }

    /// Position of the greatest element strictly before the probe's target.
    pub fn find_lt_by<P: Probe<T>>(&mut self, forest: &mut SplayForest<T>, probe: &P) -> Place {
        let (place, last) = self.find_raw(forest, probe);
        if last == Ordering::Greater {
            place
        } else {
            place.prev(forest)
        }
    }

    /// Position of the smallest element strictly after the probe's target.
    pub fn find_gt_by<P: Probe<T>>(&mut self, forest: &mut SplayForest<T>, probe: &P) -> Place {
        let (place, last) = self.find_raw(forest, probe);
        if last == Ordering::Less {
            place
        } else {
            place.next(forest)
        }
    }

    /// Position of the greatest element at or before the probe's target.
    pub fn find_le_by<P: Probe<T>>(&mut self, forest: &mut SplayForest<T>, probe: &P) -> Place {
        let (place, last) = self.find_raw(forest, probe);
        if last != Ordering::Less {
            place
        } else {
            place.prev(forest)
        }
    }

    /// Position of the smallest element at or after the probe's target.
    pub fn find_ge_by<P: Probe<T>>(&mut self, forest: &mut SplayForest<T>, probe: &P) -> Place {
        let (place, last) = self.find_raw(forest, probe);
        if last != Ordering::Greater {
            place
        } else {
            place.next(forest)
        }
    }

    /// Shorthand for [`find_eq`](Self::find_eq).
    pub fn find<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> Place {
        self.find_eq(elem, forest, comp)
    }

    /// Position of the element equal to `elem`, or the end sentinel.
    pub fn find_eq<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> Place {
        self.find_eq_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the greatest element less than `elem`, or the end sentinel.
    pub fn find_lt<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> Place {
        self.find_lt_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the smallest element greater than `elem`, or the end sentinel.
    pub fn find_gt<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> Place {
        self.find_gt_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the greatest element less than or equal to `elem`, or the end sentinel.
    pub fn find_le<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> Place {
        self.find_le_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the smallest element greater than or equal to `elem`, or the end sentinel.
    pub fn find_ge<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> Place {
        self.find_ge_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Does the set contain `elem`? Splays on a hit like any other find.
    pub fn contains<C: Comparator<T>>(
        &mut self,
        elem: T,
        forest: &mut SplayForest<T>,
        comp: &C,
    ) -> bool {
        self.find_eq(elem, forest, comp) != self.end()
    }

    /// Number of elements, counted by walking the tree.
    pub fn count(&self, forest: &SplayForest<T>) -> usize {
        let Some(root) = self.root.expand() else {
            return 0;
        };
        let mut n = 1;
        let mut cur = leftmost(&forest.nodes, root);
        while let Some(next) = next_in_order(&forest.nodes, cur) {
            n += 1;
            cur = next;
        }
        n
    }

    /// Create an iterator traversing this tree in ascending order.
    pub fn iter<'a>(&self, forest: &'a SplayForest<T>) -> Iter<'a, T> {
        Iter {
            forest,
            place: self.start(forest),
        }
    }
}

impl<T: Copy> Default for SplayTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> OrderedContainer for SplayTree<T> {
    type Elem = T;
    type Pool = SplayForest<T>;
    type Place = Place;

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn insert<C: Comparator<T>>(&mut self, elem: T, pool: &mut SplayForest<T>, comp: &C) -> bool {
        self.insert(elem, pool, comp)
    }

    fn remove(&mut self, place: Place, pool: &mut SplayForest<T>) {
        self.remove(place, pool)
    }

    fn clear(&mut self, pool: &mut SplayForest<T>) {
        self.clear(pool)
    }

    fn start(&self, pool: &SplayForest<T>) -> Place {
        self.start(pool)
    }

    fn end(&self, _pool: &SplayForest<T>) -> Place {
        self.end()
    }

    fn find_eq<C: Comparator<T>>(&mut self, elem: T, pool: &mut SplayForest<T>, comp: &C) -> Place {
        SplayTree::find_eq(self, elem, pool, comp)
    }

    fn find_lt<C: Comparator<T>>(&mut self, elem: T, pool: &mut SplayForest<T>, comp: &C) -> Place {
        SplayTree::find_lt(self, elem, pool, comp)
    }

    fn find_gt<C: Comparator<T>>(&mut self, elem: T, pool: &mut SplayForest<T>, comp: &C) -> Place {
        SplayTree::find_gt(self, elem, pool, comp)
    }

    fn find_le<C: Comparator<T>>(&mut self, elem: T, pool: &mut SplayForest<T>, comp: &C) -> Place {
        SplayTree::find_le(self, elem, pool, comp)
    }

    fn find_ge<C: Comparator<T>>(&mut self, elem: T, pool: &mut SplayForest<T>, comp: &C) -> Place {
        SplayTree::find_ge(self, elem, pool, comp)
    }
}

/// An iterator visiting the elements of a `SplayTree` in ascending order.
///
/// Iteration itself does not splay.
pub struct Iter<'a, T: Copy> {
    forest: &'a SplayForest<T>,
    place: Place,
}

impl<'a, T: Copy> Iterator for Iter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let elem = self.place.elem(self.forest)?;
        self.place = self.place.next(self.forest);
        Some(elem)
    }
}

#[cfg(test)]
impl<T: Copy> SplayTree<T> {
    /// Check the structural invariants: BST ordering and consistent parent links.
    fn verify<C: Comparator<T>>(&self, forest: &SplayForest<T>, comp: &C) {
        if let Some(root) = self.root.expand() {
            assert!(forest.nodes[root].parent.is_none(), "root {} has a parent", root);
            verify_node(forest, root, comp, None, None);
        }
    }
}

#[cfg(test)]
fn verify_node<T: Copy, C: Comparator<T>>(
    forest: &SplayForest<T>,
    node: Node,
    comp: &C,
    lo: Option<T>,
    hi: Option<T>,
) {
    let elem = forest.nodes[node].elem;
    if let Some(lo) = lo {
        assert_eq!(comp.cmp(lo, elem), Ordering::Less, "low bound violated at {}", node);
    }
    if let Some(hi) = hi {
        assert_eq!(comp.cmp(elem, hi), Ordering::Less, "high bound violated at {}", node);
    }
    if let Some(l) = forest.nodes[node].left.expand() {
        assert_eq!(forest.nodes[l].parent.expand(), Some(node), "bad parent link in {}", l);
        verify_node(forest, l, comp, lo, Some(elem));
    }
    if let Some(r) = forest.nodes[node].right.expand() {
        assert_eq!(forest.nodes[r].parent.expand(), Some(node), "bad parent link in {}", r);
        verify_node(forest, r, comp, Some(elem), hi);
    }
}
