//! Key-value pairs for the map containers.
//!
//! A map is the corresponding ordered set storing [`Pair`] elements with an ordering that
//! ignores the value. [`KeyOrder`] lifts a key comparator to pairs, and [`KeyProbe`] probes a
//! tree of pairs with a bare key.

use crate::{Comparator, Probe};
use core::cmp::Ordering;

/// An ordered (key, value) pair.
///
/// Equality and ordering are defined solely by the key, so a tree of pairs forbids duplicate
/// keys regardless of their values.
#[derive(Clone, Copy, Debug)]
pub struct Pair<K, V> {
    /// Lookup key; the only field the ordering sees.
    pub key: K,
    /// Stored value.
    pub value: V,
}

impl<K: PartialEq, V> PartialEq for Pair<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, V> Eq for Pair<K, V> {}

impl<K: PartialOrd, V> PartialOrd for Pair<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.key.partial_cmp(&other.key)
    }
}

impl<K: Ord, V> Ord for Pair<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Pair comparator that orders by key under a key comparator, ignoring values.
pub struct KeyOrder<'a, C> {
    comp: &'a C,
}

impl<'a, C> KeyOrder<'a, C> {
    /// Lift the key comparator `comp` to pairs.
    pub fn new(comp: &'a C) -> Self {
        Self { comp }
    }
}

impl<'a, K, V, C> Comparator<Pair<K, V>> for KeyOrder<'a, C>
where
    K: Copy,
    V: Copy,
    C: Comparator<K>,
{
    fn cmp(&self, a: Pair<K, V>, b: Pair<K, V>) -> Ordering {
        self.comp.cmp(a.key, b.key)
    }
}

/// Probe searching a tree of pairs for a bare key.
pub struct KeyProbe<'a, K, C> {
    key: K,
    comp: &'a C,
}

impl<'a, K, C> KeyProbe<'a, K, C> {
    /// Make a probe searching for `key` under `comp`.
    pub fn new(key: K, comp: &'a C) -> Self {
        Self { key, comp }
    }
}

impl<'a, K, V, C> Probe<Pair<K, V>> for KeyProbe<'a, K, C>
where
    K: Copy,
    V: Copy,
    C: Comparator<K>,
{
    fn probe(&self, elem: Pair<K, V>) -> Ordering {
        self.comp.cmp(self.key, elem.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_relations_ignore_values() {
        let a = Pair { key: 1, value: 'a' };
        let b = Pair { key: 1, value: 'b' };
        let c = Pair { key: 2, value: 'a' };
        assert_eq!(a, b);
        assert!(a < c);
        assert!(c > b);
    }

    #[test]
    fn key_probe() {
        let pairs = [
            Pair { key: 1, value: 'a' },
            Pair { key: 3, value: 'b' },
            Pair { key: 5, value: 'c' },
        ];
        assert_eq!(KeyProbe::new(3, &()).search(&pairs), Ok(1));
        assert_eq!(KeyProbe::new(4, &()).search(&pairs), Err(2));
        assert_eq!(KeyProbe::new(0, &()).search(&pairs), Err(0));
    }
}
