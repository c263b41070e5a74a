//! Splay-tree ordered maps.

use super::{Iter, Place, SplayForest, SplayTree};
use crate::map::{KeyOrder, KeyProbe, Pair};
use crate::Comparator;

/// Splay-tree map from `K` to `V`, stored as an ordered set of [`Pair`]s.
///
/// Ordering and equality are on the key alone, so inserting an existing key is a no-op
/// returning false. Like the underlying tree, every find splays and takes the map mutably.
#[derive(Clone)]
pub struct SplayMap<K: Copy, V: Copy> {
    tree: SplayTree<Pair<K, V>>,
}

impl<K: Copy, V: Copy> SplayMap<K, V> {
    /// Make an empty map.
    pub fn new() -> Self {
        Self {
            tree: SplayTree::new(),
        }
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
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> bool {
        self.tree
            .insert(Pair { key, value }, forest, &KeyOrder::new(comp))
    }

    /// Remove the pair at `place`. Removing the end position is a no-op.
    pub fn remove(&mut self, place: Place, forest: &mut SplayForest<Pair<K, V>>) {
        self.tree.remove(place, forest)
    }

    /// Remove every pair, returning all nodes to the forest.
    pub fn clear(&mut self, forest: &mut SplayForest<Pair<K, V>>) {
        self.tree.clear(forest)
    }

    /// Position of the pair with the smallest key.
    pub fn start(&self, forest: &SplayForest<Pair<K, V>>) -> Place {
        self.tree.start(forest)
    }

    /// The end sentinel position.
    pub fn end(&self) -> Place {
        self.tree.end()
    }

    /// Position of the pair with the greatest key.
    pub fn last(&self, forest: &SplayForest<Pair<K, V>>) -> Place {
        self.tree.last(forest)
    }

    /// Shorthand for [`find_eq`](Self::find_eq).
    pub fn find<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.find_eq(key, forest, comp)
    }

    /// Position of the pair with key `key`, or the end sentinel.
    pub fn find_eq<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.tree.find_eq_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the greatest key less than `key`.
    pub fn find_lt<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.tree.find_lt_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the smallest key greater than `key`.
    pub fn find_gt<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.tree.find_gt_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the greatest key at or below `key`.
    pub fn find_le<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.tree.find_le_by(forest, &KeyProbe::new(key, comp))
    }

    /// Position of the pair with the smallest key at or above `key`.
    pub fn find_ge<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.tree.find_ge_by(forest, &KeyProbe::new(key, comp))
    }

    /// Look up the value stored under `key`. Splays on a hit.
    pub fn get<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Option<V> {
        self.find_eq(key, forest, comp)
            .elem(forest)
            .map(|pair| pair.value)
    }

    /// Does the map contain `key`?
    pub fn contains<C: Comparator<K>>(
        &mut self,
        key: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> bool {
        self.find_eq(key, forest, comp) != self.end()
    }

    /// Number of pairs, counted by walking the tree.
    pub fn count(&self, forest: &SplayForest<Pair<K, V>>) -> usize {
        self.tree.count(forest)
    }

    /// First position of a key range scan: the pair at or after `first`.
    pub fn start_iter<C: Comparator<K>>(
        &mut self,
        first: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.find_ge(first, forest, comp)
    }

    /// One-past-the-end position of a key range scan: the pair at or after `last`.
    pub fn end_iter<C: Comparator<K>>(
        &mut self,
        last: K,
        forest: &mut SplayForest<Pair<K, V>>,
        comp: &C,
    ) -> Place {
        self.find_ge(last, forest, comp)
    }

    /// Create an iterator over the pairs in ascending key order.
    pub fn iter<'a>(&self, forest: &'a SplayForest<Pair<K, V>>) -> Iter<'a, Pair<K, V>> {
        self.tree.iter(forest)
    }
}

impl<K: Copy, V: Copy> Default for SplayMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn insert_and_get() {
        let mut f = SplayForest::new();
        let mut m = SplayMap::<i32, u64>::new();
        assert!(m.is_empty());

        for i in 0..100 {
            assert!(m.insert(i, (i as u64) * 3, &mut f, &()));
        }
        for i in 0..100 {
            assert_eq!(m.get(i, &mut f, &()), Some((i as u64) * 3));
        }
        assert_eq!(m.get(100, &mut f, &()), None);
        assert_eq!(m.count(&f), 100);
    }

    #[test]
    fn existing_key_keeps_value() {
        let mut f = SplayForest::new();
        let mut m = SplayMap::<i32, char>::new();
        assert!(m.insert(1, 'a', &mut f, &()));
        assert!(!m.insert(1, 'b', &mut f, &()));
        assert_eq!(m.get(1, &mut f, &()), Some('a'));
        assert_eq!(m.count(&f), 1);
    }

    #[test]
    fn remove_by_key() {
        let mut f = SplayForest::new();
        let mut m = SplayMap::<i32, i32>::new();
        for k in 0..20 {
            m.insert(k, -k, &mut f, &());
        }
        let place = m.find(10, &mut f, &());
        m.remove(place, &mut f);
        assert!(!m.contains(10, &mut f, &()));
        assert_eq!(m.count(&f), 19);

        let keys: Vec<i32> = m.iter(&f).map(|p| p.key).collect();
        let want: Vec<i32> = (0..20).filter(|&k| k != 10).collect();
        assert_eq!(keys, want);
    }

    #[test]
    fn range_scan() {
        let mut f = SplayForest::new();
        let mut m = SplayMap::<i32, i32>::new();
        for k in 0..30 {
            m.insert(k, k, &mut f, &());
        }
        let stop = m.end_iter(9, &mut f, &());
        let mut it = m.start_iter(5, &mut f, &());
        let mut seen = Vec::new();
        while it != stop {
            seen.push(it.elem(&f).expect("range scan hit the end").key);
            it = it.next(&f);
        }
        assert_eq!(seen, [5, 6, 7, 8]);
    }
}
