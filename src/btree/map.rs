//! B-tree ordered maps.

use super::{BForest, BTree, Iter, NodeLayout, Place};
use crate::map::{KeyOrder, KeyProbe, Pair};
use crate::Comparator;

/// B-tree map from `K` to `V`, stored as an ordered set of [`Pair`]s.
///
/// Ordering and equality are on the key alone, so inserting an existing key is a no-op
/// returning false; there is no update-on-conflict.
#[derive(Clone)]
pub struct BMap<L: NodeLayout> {
    tree: BTree<L>,
}

impl<K, V, L> BMap<L>
where
    K: Copy,
    V: Copy,
    L: NodeLayout<Elem = Pair<K, V>>,
{
    /// Make an empty map.
    pub fn new() -> Self {
        Self { tree: BTree::new() }
    }

    /// Is this an empty map?
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert `key -> value`. If `key` is already present the map is unchanged, the stored
    /// value kept, and the result is false.
    pub fn insert<C: Comparator<K>>(
        &mut self,
        key: K,
        value: V,
        forest: &mut BForest<L>,
        comp: &C,
    ) -> bool {
        self.tree
            .insert(Pair { key, value }, forest, &KeyOrder::new(comp))
    }

    /// Remove the pair at `place`. Removing the end position is a no-op.
    pub fn remove(&mut self, place: Place, forest: &mut BForest<L>) {
        self.tree.remove(place, forest)
    }

    /// Remove every pair, returning all nodes to the forest.
    pub fn clear(&mut self, forest: &mut BForest<L>) {
        self.tree.clear(forest)
    }

    /// Position of the pair with the smallest key.
    pub fn start(&self, forest: &BForest<L>) -> Place {
        self.tree.start(forest)
    }

    /// The end sentinel position.
    pub fn end(&self, forest: &BForest<L>) -> Place {
        self.tree.end(forest)
    }

    /// Shorthand for [`find_eq`](Self::find_eq).
    pub fn find<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Place {
        self.find_eq(key, forest, comp)
    }

    /// Position of the pair with key `key`, or the end sentinel.
    pub fn find_eq<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Place {
        self.tree.find_eq_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the greatest key less than `key`.
    pub fn find_lt<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Place {
        self.tree.find_lt_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the smallest key greater than `key`.
    pub fn find_gt<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Place {
        self.tree.find_gt_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the greatest key at or below `key`.
    pub fn find_le<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Place {
        self.tree.find_le_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the smallest key at or above `key`.
    pub fn find_ge<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Place {
        self.tree.find_ge_by(forest, &KeyProbe::new(key, comp))
    }

    /// Look up the value stored under `key`.
    pub fn get<C: Comparator<K>>(&self, key: K, forest: &BForest<L>, comp: &C) -> Option<V> {
        self.find_eq(key, forest, comp)
            .elem(forest)
            .map(|pair| pair.value)
    }

    /// First position of a key range scan: the pair at or after `first`.
    pub fn start_iter<C: Comparator<K>>(
        &self,
        first: K,
        forest: &BForest<L>,
        comp: &C,
    ) -> Place {
        self.find_ge(first, forest, comp)
    }

    /// One-past-the-end position of a key range scan: the pair at or after `last`.
    pub fn end_iter<C: Comparator<K>>(&self, last: K, forest: &BForest<L>, comp: &C) -> Place {
        self.find_ge(last, forest, comp)
    }

    /// Create an iterator over the pairs in ascending key order.
    pub fn iter<'a>(&self, forest: &'a BForest<L>) -> Iter<'a, L> {
        self.tree.iter(forest)
    }
}

impl<K, V, L> Default for BMap<L>
where
    K: Copy,
    V: Copy,
    L: NodeLayout<Elem = Pair<K, V>>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    crate::node_layout!(ML, Pair<i32, u64>, 4);

    #[test]
    fn insert_and_get() {
        let mut f = BForest::<ML>::new();
        let mut m = BMap::<ML>::new();
        assert!(m.is_empty());

        for i in 0..100 {
            assert!(m.insert(i, (i as u64) * 10, &mut f, &()));
        }
        assert!(!m.is_empty());
        for i in 0..100 {
            assert_eq!(m.get(i, &f, &()), Some((i as u64) * 10));
        }
        assert_eq!(m.get(100, &f, &()), None);
    }

    #[test]
    fn existing_key_keeps_value() {
        let mut f = BForest::<ML>::new();
        let mut m = BMap::<ML>::new();
        assert!(m.insert(7, 1, &mut f, &()));
        assert!(!m.insert(7, 2, &mut f, &()));
        assert_eq!(m.get(7, &f, &()), Some(1));
    }

    #[test]
    fn key_finds() {
        let mut f = BForest::<ML>::new();
        let mut m = BMap::<ML>::new();
        for k in [1, 3, 5, 7] {
            m.insert(k, k as u64, &mut f, &());
        }
        let end = m.end(&f);
        assert_eq!(m.find(4, &f, &()), end);
        assert_eq!(m.find_le(4, &f, &()).elem(&f).map(|p| p.key), Some(3));
        assert_eq!(m.find_ge(4, &f, &()).elem(&f).map(|p| p.key), Some(5));
        assert_eq!(m.find_lt(1, &f, &()), end);
        assert_eq!(m.find_gt(7, &f, &()), end);
    }

    #[test]
    fn range_scan() {
        let mut f = BForest::<ML>::new();
        let mut m = BMap::<ML>::new();
        for k in 0..50 {
            m.insert(k, k as u64, &mut f, &());
        }
        let mut it = m.start_iter(10, &f, &());
        let stop = m.end_iter(15, &f, &());
        let mut seen = Vec::new();
        while it != stop {
            seen.push(it.elem(&f).expect("range scan hit the end").key);
            it = it.next(&f);
        }
        assert_eq!(seen, [10, 11, 12, 13, 14]);
    }

    #[test]
    fn remove_by_key() {
        let mut f = BForest::<ML>::new();
        let mut m = BMap::<ML>::new();
        for k in 0..50 {
            m.insert(k, k as u64, &mut f, &());
        }
        for k in (0..50).step_by(2) {
            let place = m.find_eq(k, &f, &());
            m.remove(place, &mut f);
        }
        for k in 0..50 {
            let want = if k % 2 == 0 { None } else { Some(k as u64) };
            assert_eq!(m.get(k, &f, &()), want);
        }
        let keys: Vec<i32> = m.iter(&f).map(|p| p.key).collect();
        let want: Vec<i32> = (0..50).filter(|k| k % 2 == 1).collect();
        assert_eq!(keys, want);
    }
}
