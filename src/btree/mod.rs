//! B-tree ordered sets and maps.
//!
//! A classical B-tree of arity `M`: every node stores up to `M` elements in ascending order and
//! `M + 1` child links, and all leaves sit at the same depth. Elements live in inner nodes as
//! well as leaves. Each node carries a back link to its parent and its slot index there, which
//! is what lets a [`Place`] walk the tree in both directions without a path stack.
//!
//! Trees allocate nodes out of a [`BForest`] passed at each mutating call. Several trees can
//! share one forest as long as they share the same [`NodeLayout`].

mod map;
mod node;
mod place;

pub use self::map::BMap;
pub use self::node::{Node, NodeLayout, PackedNode};
pub use self::place::Place;

use self::node::BNode;
use self::place::{clamp_forward, descend};
use crate::pool::Pool;
use crate::{Comparator, ElemProbe, OrderedContainer, Probe};
use core::borrow::{Borrow, BorrowMut};
use core::marker::PhantomData;
use log::trace;

/// Memory pool for a forest of `BTree` instances with layout `L`.
pub struct BForest<L: NodeLayout> {
    pub(crate) nodes: Pool<Node, BNode<L>>,
}

impl<L: NodeLayout> BForest<L> {
    /// Create a new empty forest.
    pub fn new() -> Self {
        Self { nodes: Pool::new() }
    }

    /// Discard all nodes. Every tree allocated from this forest is invalidated.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<L: NodeLayout> Default for BForest<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// B-tree representing an ordered set of `L::Elem`.
///
/// An empty tree is a single null root reference; all nodes belong to the forest the tree was
/// grown in, and every mutating operation takes that forest.
#[derive(Clone)]
pub struct BTree<L: NodeLayout> {
    root: PackedNode,
    unused: PhantomData<L>,
}

impl<L: NodeLayout> BTree<L> {
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

    /// Try to insert `elem` into the set.
    ///
    /// Returns true on a new insertion; if an equal element is already present, the tree is
    /// unchanged and the result is false.
    pub fn insert<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        forest: &mut BForest<L>,
        comp: &C,
    ) -> bool {
        let Some(root) = self.root.expand() else {
            let node = forest.nodes.alloc(BNode::leaf(elem));
            self.root = node.into();
            return true;
        };
        let pos = descend(root, forest, &ElemProbe::new(elem, comp));
        if pos.hit {
            return false;
        }

        // Insert at the leaf the descent ended in, splitting and promoting medians upward
        // until an insertion fits.
        let mut node = pos.node;
        let mut index = pos.index;
        let mut elem = elem;
        let mut rchild: PackedNode = None.into();
        loop {
            if forest.nodes[node].len() < L::ARITY {
                forest.nodes[node].insert_entry(index, elem, rchild);
                reparent_from(forest, node, index + 1);
                return true;
            }
            let parent = forest.nodes[node].parent.expand();
            let pindex = forest.nodes[node].parent_index as usize;
            let (promoted, rhs) = split_insert(forest, node, index, elem, rchild);
            match parent {
                Some(p) => {
                    elem = promoted;
                    rchild = rhs.into();
                    index = pindex;
                    node = p;
                }
                None => {
                    // The root itself split; grow the tree by one level.
                    let new_root = forest.nodes.alloc(BNode::root(promoted, node, rhs));
                    forest.nodes[node].parent = new_root.into();
                    forest.nodes[node].parent_index = 0;
                    forest.nodes[rhs].parent = new_root.into();
                    forest.nodes[rhs].parent_index = 1;
                    self.root = new_root.into();
                    trace!("btree: root split, new root {}", new_root);
                    return true;
                }
            }
        }
    }

    /// Remove the element at `place`. Removing the end position is a no-op.
    pub fn remove(&mut self, place: Place, forest: &mut BForest<L>) {
        let Some(mut node) = place.node.expand() else {
            return;
        };
        let mut index = place.index as usize;
        if index >= forest.nodes[node].len() {
            return;
        }

        if !forest.nodes[node].is_leaf() {
            // Replace the element with its in-order successor, the leftmost element of the
            // subtree to its right, and delete that from its leaf instead.
            let mut s = forest.nodes[node].child(index + 1);
            while let Some(c) = forest.nodes[s].child_opt(0) {
                s = c;
            }
            let succ = forest.nodes[s].elem(0);
            forest.nodes[node].set_elem(index, succ);
            node = s;
            index = 0;
        }
        forest.nodes[node].remove_entry(index);
        self.rebalance(node, forest);
    }

    /// Restore the occupancy invariant from `node` upward after a removal.
    fn rebalance(&mut self, mut node: Node, forest: &mut BForest<L>) {
        let min = L::ARITY / 2;
        loop {
            if self.root.expand() == Some(node) {
                if forest.nodes[node].len() == 0 {
                    // The root drained; its single child (if any) takes over.
                    let child = forest.nodes[node].child_opt(0);
                    forest.nodes.free(node);
                    match child {
                        Some(c) => {
                            forest.nodes[c].parent = None.into();
                            forest.nodes[c].parent_index = 0;
                            self.root = c.into();
                            trace!("btree: root collapsed into {}", c);
                        }
                        None => self.root = None.into(),
                    }
                }
                return;
            }
            if forest.nodes[node].len() >= min {
                return;
            }

            let parent = forest.nodes[node]
                .parent
                .expand()
                .expect("non-root node without a parent");
            let pindex = forest.nodes[node].parent_index as usize;

            // Prefer borrowing one entry through the parent from a sibling that can spare it.
            if pindex > 0 {
                let left = forest.nodes[parent].child(pindex - 1);
                if forest.nodes[left].len() > min {
                    rotate_from_left(forest, parent, pindex, left, node);
                    return;
                }
            }
            if pindex < forest.nodes[parent].len() {
                let right = forest.nodes[parent].child(pindex + 1);
                if forest.nodes[right].len() > min {
                    rotate_from_right(forest, parent, pindex, right, node);
                    return;
                }
            }

            // Both siblings are at minimum: merge with one of them, pulling the separator
            // down, and continue with the depleted parent.
            if pindex > 0 {
                merge_children(forest, parent, pindex - 1);
            } else {
                merge_children(forest, parent, pindex);
            }
            node = parent;
        }
    }

    /// Remove every element, returning all nodes to the forest.
    pub fn clear(&mut self, forest: &mut BForest<L>) {
        let Some(root) = self.root.take() else {
            return;
        };
        let mut stack = alloc::vec![root];
        while let Some(n) = stack.pop() {
            if !forest.nodes[n].is_leaf() {
                for i in 0..=forest.nodes[n].len() {
                    stack.push(forest.nodes[n].child(i));
                }
            }
            forest.nodes.free(n);
        }
    }

    /// Position of the smallest element: the leftmost leaf at index 0.
    pub fn start(&self, forest: &BForest<L>) -> Place {
        let Some(mut node) = self.root.expand() else {
            return Place::null();
        };
        while let Some(c) = forest.nodes[node].child_opt(0) {
            node = c;
        }
        Place::at(node, 0)
    }

    /// The end sentinel: the root at one past its last element.
    pub fn end(&self, forest: &BForest<L>) -> Place {
        match self.root.expand() {
            None => Place::null(),
            Some(r) => Place::at(r, forest.nodes[r].len()),
        }
    }

    /// Position of the element the probe matches, or the end sentinel.
    pub fn find_eq_by<P: Probe<L::Elem>>(&self, forest: &BForest<L>, probe: &P) -> Place {
        let Some(root) = self.root.expand() else {
            return Place::null();
        };
        let pos = descend(root, forest, probe);
        if pos.hit {
            Place::at(pos.node, pos.index)
        } else {
            self.end(forest)
        }
    }

    /// Position of the smallest element at or after the probe's target.
    pub fn find_ge_by<P: Probe<L::Elem>>(&self, forest: &BForest<L>, probe: &P) -> Place {
        let Some(root) = self.root.expand() else {
            return Place::null();
        };
        let pos = descend(root, forest, probe);
        if pos.hit || pos.last == core::cmp::Ordering::Less {
            Place::at(pos.node, pos.index)
        } else {
            clamp_forward(pos.node, pos.index, forest)
        }
    }

    /// Position of the smallest element strictly after the probe's target.
    pub fn find_gt_by<P: Probe<L::Elem>>(&self, forest: &BForest<L>, probe: &P) -> Place {
        let Some(root) = self.root.expand() else {
            return Place::null();
        };
        let pos = descend(root, forest, probe);
        if pos.hit {
            Place::at(pos.node, pos.index).next(forest)
        } else if pos.last == core::cmp::Ordering::Less {
            Place::at(pos.node, pos.index)
        } else {
            clamp_forward(pos.node, pos.index, forest)
        }
    }

    /// Position of the greatest element at or before the probe's target.
    pub fn find_le_by<P: Probe<L::Elem>>(&self, forest: &BForest<L>, probe: &P) -> Place {
        let Some(root) = self.root.expand() else {
            return Place::null();
        };
        let pos = descend(root, forest, probe);
        if pos.hit {
            Place::at(pos.node, pos.index)
        } else {
            Place::at(pos.node, pos.index).prev(forest)
        }
    }

    /// Position of the greatest element strictly before the probe's target.
    pub fn find_lt_by<P: Probe<L::Elem>>(&self, forest: &BForest<L>, probe: &P) -> Place {
        let Some(root) = self.root.expand() else {
            return Place::null();
        };
        let pos = descend(root, forest, probe);
        Place::at(pos.node, pos.index).prev(forest)
    }

    /// Shorthand for [`find_eq`](Self::find_eq).
    pub fn find<C: Comparator<L::Elem>>(
        &self,
        elem: L::Elem,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_eq(elem, forest, comp)
    }

    /// Position of the element equal to `elem`, or the end sentinel.
    pub fn find_eq<C: Comparator<L::Elem>>(
        &self,
        elem: L::Elem,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_eq_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the greatest element less than `elem`, or the end sentinel.
    pub fn find_lt<C: Comparator<L::Elem>>(
        &self,
        elem: L::Elem,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_lt_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the smallest element greater than `elem`, or the end sentinel.
    pub fn find_gt<C: Comparator<L::Elem>>(
        &self,
        elem: L::Elem,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_gt_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the greatest element less than or equal to `elem`, or the end sentinel.
    pub fn find_le<C: Comparator<L::Elem>>(
        &self,
        elem: L::Elem,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_le_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Position of the smallest element greater than or equal to `elem`, or the end sentinel.
    pub fn find_ge<C: Comparator<L::Elem>>(
        &self,
        elem: L::Elem,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_ge_by(forest, &ElemProbe::new(elem, comp))
    }

    /// Create an iterator traversing this tree in ascending order.
    pub fn iter<'a>(&self, forest: &'a BForest<L>) -> Iter<'a, L> {
        Iter {
            forest,
            place: self.start(forest),
        }
    }
}

impl<L: NodeLayout> Default for BTree<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: NodeLayout> OrderedContainer for BTree<L> {
    type Elem = L::Elem;
    type Pool = BForest<L>;
    type Place = Place;

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn insert<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        pool: &mut BForest<L>,
        comp: &C,
    ) -> bool {
        self.insert(elem, pool, comp)
    }

    fn remove(&mut self, place: Place, pool: &mut BForest<L>) {
        self.remove(place, pool)
    }

    fn clear(&mut self, pool: &mut BForest<L>) {
        self.clear(pool)
    }

    fn start(&self, pool: &BForest<L>) -> Place {
        self.start(pool)
    }

    fn end(&self, pool: &BForest<L>) -> Place {
        self.end(pool)
    }

    fn find_eq<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        pool: &mut BForest<L>,
        comp: &C,
    ) -> Place {
        BTree::find_eq(self, elem, pool, comp)
    }

    fn find_lt<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        pool: &mut BForest<L>,
        comp: &C,
    ) -> Place {
        BTree::find_lt(self, elem, pool, comp)
    }

    fn find_gt<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        pool: &mut BForest<L>,
        comp: &C,
    ) -> Place {
        BTree::find_gt(self, elem, pool, comp)
    }

    fn find_le<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        pool: &mut BForest<L>,
        comp: &C,
    ) -> Place {
        BTree::find_le(self, elem, pool, comp)
    }

    fn find_ge<C: Comparator<L::Elem>>(
        &mut self,
        elem: L::Elem,
        pool: &mut BForest<L>,
        comp: &C,
    ) -> Place {
        BTree::find_ge(self, elem, pool, comp)
    }
}

/// An iterator visiting the elements of a `BTree` in ascending order.
pub struct Iter<'a, L: NodeLayout> {
    forest: &'a BForest<L>,
    place: Place,
}

impl<'a, L: NodeLayout> Iterator for Iter<'a, L> {
    type Item = L::Elem;

    fn next(&mut self) -> Option<L::Elem> {
        let elem = self.place.elem(self.forest)?;
        self.place = self.place.next(self.forest);
        Some(elem)
    }
}

/// Refresh the parent links of `node`'s children from slot `from` on.
fn reparent_from<L: NodeLayout>(forest: &mut BForest<L>, node: Node, from: usize) {
    if forest.nodes[node].is_leaf() {
        return;
    }
    let n = forest.nodes[node].len();
    for i in from..=n {
        let c = forest.nodes[node].child(i);
        let cn = &mut forest.nodes[c];
        cn.parent = node.into();
        cn.parent_index = i as u32;
    }
}

/// Split the full `node` around its median while inserting `elem` at `i` (with `rchild` as the
/// new child to its right when `node` is inner). The node keeps the left half; a fresh right
/// sibling takes the rest, and the new element lands directly in whichever half it belongs to.
/// Returns the promoted median and the new sibling.
fn split_insert<L: NodeLayout>(
    forest: &mut BForest<L>,
    node: Node,
    i: usize,
    elem: L::Elem,
    rchild: PackedNode,
) -> (L::Elem, Node) {
    let m = L::ARITY;
    let mid = (m + 1) / 2;
    debug_assert_eq!(forest.nodes[node].len(), m);

    // `Elems` and `Children` are Copy; work from a snapshot of the full node.
    let old_elems = forest.nodes[node].elems;
    let old_children = forest.nodes[node].children;
    let oe = old_elems.borrow();
    let oc = old_children.borrow();

    let mut rhs = BNode::<L>::stub(elem, forest.nodes[node].parent);
    let promoted;
    {
        let re = rhs.elems.borrow_mut();
        let rc = rhs.children.borrow_mut();
        if i < mid {
            // The median of the virtual (M+1)-element array is the old element left of `mid`.
            promoted = oe[mid - 1];
            re[..m - mid].copy_from_slice(&oe[mid..]);
            rc[..=m - mid].copy_from_slice(&oc[mid..]);
        } else if i == mid {
            // The inserted element is the median itself; its right child leads the sibling.
            promoted = elem;
            re[..m - mid].copy_from_slice(&oe[mid..]);
            rc[0] = rchild;
            rc[1..=m - mid].copy_from_slice(&oc[mid + 1..]);
        } else {
            promoted = oe[mid];
            let k = i - mid - 1;
            re[..k].copy_from_slice(&oe[mid + 1..i]);
            re[k] = elem;
            re[k + 1..m - mid].copy_from_slice(&oe[i..]);
            rc[..=k].copy_from_slice(&oc[mid + 1..=i]);
            rc[k + 1] = rchild;
            rc[k + 2..=m - mid].copy_from_slice(&oc[i + 1..]);
        }
    }
    rhs.len = (m - mid) as u32;

    forest.nodes[node].len = if i < mid { (mid - 1) as u32 } else { mid as u32 };
    if i < mid {
        forest.nodes[node].insert_entry(i, elem, rchild);
    }

    let rhs_node = forest.nodes.alloc(rhs);
    reparent_from(forest, node, 0);
    reparent_from(forest, rhs_node, 0);
    (promoted, rhs_node)
}

/// Move one entry from `left` into its underfull right neighbour `node`, rotating through the
/// separator at `pindex - 1`.
fn rotate_from_left<L: NodeLayout>(
    forest: &mut BForest<L>,
    parent: Node,
    pindex: usize,
    left: Node,
    node: Node,
) {
    let sep = forest.nodes[parent].elem(pindex - 1);
    let llen = forest.nodes[left].len();
    let moved: PackedNode = if forest.nodes[left].is_leaf() {
        None.into()
    } else {
        forest.nodes[left].child(llen).into()
    };
    forest.nodes[node].insert_front(sep, moved);
    reparent_from(forest, node, 0);
    let new_sep = forest.nodes[left].elem(llen - 1);
    forest.nodes[parent].set_elem(pindex - 1, new_sep);
    forest.nodes[left].len -= 1;
}

/// Move one entry from `right` into its underfull left neighbour `node`, rotating through the
/// separator at `pindex`.
fn rotate_from_right<L: NodeLayout>(
    forest: &mut BForest<L>,
    parent: Node,
    pindex: usize,
    right: Node,
    node: Node,
) {
    let sep = forest.nodes[parent].elem(pindex);
    let moved = forest.nodes[right].child_opt(0);
    {
        let n = &mut forest.nodes[node];
        let len = n.len();
        n.elems.borrow_mut()[len] = sep;
        if let Some(c) = moved {
            n.children.borrow_mut()[len + 1] = c.into();
        }
        n.len += 1;
    }
    let appended = forest.nodes[node].len();
    reparent_from(forest, node, appended);
    let new_sep = forest.nodes[right].elem(0);
    forest.nodes[parent].set_elem(pindex, new_sep);
    forest.nodes[right].remove_front();
    reparent_from(forest, right, 0);
}

/// Merge `parent`'s child `j + 1` into child `j`, pulling the separator at `j` down.
fn merge_children<L: NodeLayout>(forest: &mut BForest<L>, parent: Node, j: usize) {
    let left = forest.nodes[parent].child(j);
    let right = forest.nodes[parent].child(j + 1);
    let sep = forest.nodes[parent].elem(j);

    let rlen = forest.nodes[right].len();
    let r_elems = forest.nodes[right].elems;
    let r_children = forest.nodes[right].children;
    {
        let n = &mut forest.nodes[left];
        let llen = n.len();
        debug_assert!(llen + rlen + 1 <= L::ARITY);
        let ne = n.elems.borrow_mut();
        ne[llen] = sep;
        ne[llen + 1..llen + 1 + rlen].copy_from_slice(&r_elems.borrow()[..rlen]);
        let nc = n.children.borrow_mut();
        nc[llen + 1..llen + 2 + rlen].copy_from_slice(&r_children.borrow()[..=rlen]);
        n.len = (llen + rlen + 1) as u32;
    }
    reparent_from(forest, left, 0);
    forest.nodes.free(right);
    forest.nodes[parent].remove_entry(j);
    reparent_from(forest, parent, j + 1);
}

#[cfg(test)]
impl<L: NodeLayout> BTree<L> {
    /// Check the structural invariants: equal leaf depth, node occupancy, parent back links,
    /// and strict ordering under `comp`.
    fn verify<C: Comparator<L::Elem>>(&self, forest: &BForest<L>, comp: &C) {
        let Some(root) = self.root.expand() else {
            return;
        };
        let n = &forest.nodes[root];
        assert!(n.parent.is_none(), "root {} has a parent", root);
        assert!(n.len() >= 1, "empty root {}", root);
        let mut leaf_depth = None;
        verify_node(forest, root, true, 0, &mut leaf_depth, comp, None, None);
    }
}

#[cfg(test)]
fn verify_node<L: NodeLayout, C: Comparator<L::Elem>>(
    forest: &BForest<L>,
    node: Node,
    is_root: bool,
    depth: usize,
    leaf_depth: &mut Option<usize>,
    comp: &C,
    lo: Option<L::Elem>,
    hi: Option<L::Elem>,
) {
    use core::cmp::Ordering;

    let n = &forest.nodes[node];
    assert!(n.len() <= L::ARITY, "overfull node {}", node);
    if !is_root {
        assert!(n.len() >= L::ARITY / 2, "underfull node {}", node);
    }
    let elems = n.elems();
    for w in elems.windows(2) {
        assert_eq!(comp.cmp(w[0], w[1]), Ordering::Less, "unordered node {}", node);
    }
    if let Some(lo) = lo {
        assert_eq!(
            comp.cmp(lo, elems[0]),
            Ordering::Less,
            "low bound violated in {}",
            node
        );
    }
    if let Some(hi) = hi {
        assert_eq!(
            comp.cmp(elems[n.len() - 1], hi),
            Ordering::Less,
            "high bound violated in {}",
            node
        );
    }
    if n.is_leaf() {
        for i in 0..=n.len() {
            assert!(n.child_opt(i).is_none(), "leaf {} has a child", node);
        }
        match *leaf_depth {
            None => *leaf_depth = Some(depth),
            Some(d) => assert_eq!(d, depth, "leaves at unequal depths"),
        }
    } else {
        for i in 0..=n.len() {
            let c = n.child(i);
            let cn = &forest.nodes[c];
            assert_eq!(cn.parent.expand(), Some(node), "bad parent link in {}", c);
            assert_eq!(cn.parent_index as usize, i, "bad parent index in {}", c);
            let clo = if i == 0 { lo } else { Some(n.elem(i - 1)) };
            let chi = if i == n.len() { hi } else { Some(n.elem(i)) };
            verify_node(forest, c, false, depth + 1, leaf_depth, comp, clo, chi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use rand::seq::SliceRandom;
    use rand::{rngs::StdRng, SeedableRng};

    crate::node_layout!(L4, i32, 4);

    fn contents(t: &BTree<L4>, f: &BForest<L4>) -> Vec<i32> {
        t.iter(f).collect()
    }

    #[test]
    fn empty_tree() {
        let f = BForest::<L4>::new();
        let t = BTree::<L4>::new();
        assert!(t.is_empty());
        assert_eq!(t.start(&f), t.end(&f));
        assert_eq!(t.find_eq(1, &f, &()), t.end(&f));
        assert_eq!(t.iter(&f).next(), None);
    }

    #[test]
    fn remove_end_is_noop() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        t.insert(1, &mut f, &());
        let end = t.end(&f);
        t.remove(end, &mut f);
        assert_eq!(contents(&t, &f), [1]);
        t.verify(&f, &());
    }

    #[test]
    fn ascending_insertions_arity_4() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in 0..100 {
            assert!(t.insert(i, &mut f, &()));
            t.verify(&f, &());
            let want: Vec<i32> = (0..=i).collect();
            assert_eq!(contents(&t, &f), want);
        }
    }

    #[test]
    fn split_promotes_median() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in [10, 7, 13, 61, -1, 2, 31] {
            assert!(t.insert(i, &mut f, &()));
            t.verify(&f, &());
        }
        assert_eq!(contents(&t, &f), [-1, 2, 7, 10, 13, 31, 61]);

        let root = t.root.expand().unwrap();
        assert_eq!(f.nodes[root].len(), 1);
        assert_eq!(f.nodes[f.nodes[root].child(0)].len(), 3);
        assert_eq!(f.nodes[f.nodes[root].child(1)].len(), 3);
    }

    #[test]
    fn find_family_small() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        t.insert(1, &mut f, &());
        t.insert(3, &mut f, &());
        let end = t.end(&f);

        assert_eq!(t.find(2, &f, &()), end);
        assert_eq!(t.find_lt(3, &f, &()).elem(&f), Some(1));
        assert_eq!(t.find_lt(1, &f, &()), end);
        assert_eq!(t.find_gt(3, &f, &()), end);
        assert_eq!(t.find_ge(2, &f, &()).elem(&f), Some(3));
        assert_eq!(t.find_le(0, &f, &()), end);
        assert_eq!(t.find_le(4, &f, &()).elem(&f), Some(3));
    }

    #[test]
    fn find_family_multilevel() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        // Even values only, so every odd probe is a miss.
        for i in 0..200 {
            t.insert(i * 2, &mut f, &());
        }
        t.verify(&f, &());
        let end = t.end(&f);

        for k in 0..200 {
            let odd = k * 2 + 1;
            assert_eq!(t.find_eq(odd, &f, &()), end);
            assert_eq!(t.find_le(odd, &f, &()).elem(&f), Some(k * 2));
            assert_eq!(t.find_lt(odd, &f, &()).elem(&f), Some(k * 2));
            let above = if k == 199 { None } else { Some(k * 2 + 2) };
            assert_eq!(t.find_ge(odd, &f, &()).elem(&f), above);
            assert_eq!(t.find_gt(odd, &f, &()).elem(&f), above);

            let even = k * 2;
            assert_eq!(t.find_eq(even, &f, &()).elem(&f), Some(even));
            assert_eq!(t.find_le(even, &f, &()).elem(&f), Some(even));
            assert_eq!(t.find_ge(even, &f, &()).elem(&f), Some(even));
            let below = if k == 0 { None } else { Some(even - 2) };
            assert_eq!(t.find_lt(even, &f, &()).elem(&f), below);
            assert_eq!(t.find_gt(even, &f, &()).elem(&f), above);
        }
    }

    #[test]
    fn round_trip_neighbours() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in 0..64 {
            t.insert(i * 3, &mut f, &());
        }
        let end = t.end(&f);
        for k in 1..64 {
            // find_ge followed by a retreat lands on the greatest element below the probe.
            let ge = t.find_ge(k * 3 - 1, &f, &());
            assert_eq!(ge.prev(&f).elem(&f), Some((k - 1) * 3));
            // find_le followed by an advance lands on the smallest element above it.
            let le = t.find_le(k * 3 - 1, &f, &());
            assert_eq!(le.next(&f).elem(&f), Some(k * 3));
        }
        // At the extremes the steps run off the tree.
        assert_eq!(t.find_ge(0, &f, &()).prev(&f), end);
        assert_eq!(t.find_le(189, &f, &()).next(&f), end);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in 0..50 {
            assert!(t.insert(i, &mut f, &()));
        }
        for i in 0..50 {
            assert!(!t.insert(i, &mut f, &()));
        }
        assert_eq!(contents(&t, &f).len(), 50);
        t.verify(&f, &());
    }

    #[test]
    fn remove_from_inner_node() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in [10, 7, 13, 61, -1, 2, 31] {
            t.insert(i, &mut f, &());
        }
        // The root element is in an inner node; its successor replaces it.
        let place = t.find_eq(10, &f, &());
        t.remove(place, &mut f);
        t.verify(&f, &());
        assert_eq!(contents(&t, &f), [-1, 2, 7, 13, 31, 61]);

        // Drain the rest in probe order, verifying the rebalance at each step.
        for i in [13, -1, 61, 2, 31, 7] {
            let place = t.find_eq(i, &f, &());
            t.remove(place, &mut f);
            t.verify(&f, &());
        }
        assert!(t.is_empty());
        assert_eq!(f.nodes.live(), 0);
    }

    #[test]
    fn reverse_iteration() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in 0..100 {
            t.insert(i, &mut f, &());
        }
        let mut place = t.end(&f).prev(&f);
        for want in (0..100).rev() {
            assert_eq!(place.elem(&f), Some(want));
            place = place.prev(&f);
        }
        assert_eq!(place, t.end(&f));
    }

    #[test]
    fn random_churn() {
        let mut rng = StdRng::seed_from_u64(0x5ca1ab1e);
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();

        let mut values: Vec<i32> = (0..400).collect();
        values.shuffle(&mut rng);
        for (n, &v) in values.iter().enumerate() {
            assert!(t.insert(v, &mut f, &()));
            if n % 16 == 0 {
                t.verify(&f, &());
            }
        }
        t.verify(&f, &());
        let want: Vec<i32> = (0..400).collect();
        assert_eq!(contents(&t, &f), want);

        values.shuffle(&mut rng);
        let (gone, kept) = values.split_at(200);
        for (n, &v) in gone.iter().enumerate() {
            let place = t.find_eq(v, &f, &());
            assert_eq!(place.elem(&f), Some(v));
            t.remove(place, &mut f);
            if n % 16 == 0 {
                t.verify(&f, &());
            }
        }
        t.verify(&f, &());

        let end = t.end(&f);
        for &v in gone {
            assert_eq!(t.find_eq(v, &f, &()), end);
        }
        for &v in kept {
            assert_eq!(t.find_eq(v, &f, &()).elem(&f), Some(v));
        }
        let mut want: Vec<i32> = kept.to_vec();
        want.sort_unstable();
        assert_eq!(contents(&t, &f), want);
    }

    #[test]
    fn drain_from_start() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in 0..256 {
            t.insert(i, &mut f, &());
        }
        for i in 0..256 {
            let start = t.start(&f);
            assert_eq!(start.elem(&f), Some(i));
            t.remove(start, &mut f);
            if i % 32 == 0 {
                t.verify(&f, &());
            }
        }
        assert!(t.is_empty());
        assert_eq!(f.nodes.live(), 0);
    }

    #[test]
    fn clear_returns_nodes() {
        let mut f = BForest::<L4>::new();
        let mut t = BTree::<L4>::new();
        for i in 0..100 {
            t.insert(i, &mut f, &());
        }
        assert!(f.nodes.live() > 0);
        t.clear(&mut f);
        assert!(t.is_empty());
        assert_eq!(f.nodes.live(), 0);

        // Freed nodes are reused by a fresh tree.
        let mut t2 = BTree::<L4>::new();
        for i in 0..100 {
            t2.insert(i, &mut f, &());
        }
        t2.verify(&f, &());
    }

    crate::node_layout!(PageL, u64);

    #[test]
    fn page_sized_default_layout() {
        assert_eq!(PageL::ARITY, crate::page_fanout(8));
        let mut f = BForest::<PageL>::new();
        let mut t = BTree::<PageL>::new();
        for i in 0..2000u64 {
            assert!(t.insert(i.wrapping_mul(0x9e3779b97f4a7c15), &mut f, &()));
        }
        t.verify(&f, &());
        let got: Vec<u64> = t.iter(&f).collect();
        assert_eq!(got.len(), 2000);
        assert!(got.windows(2).all(|w| w[0] < w[1]));
    }
}
