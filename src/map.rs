extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, fmt, marker::PhantomPinned, mem, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, KeyError, Links, TreeNode};

/// An ordered map based on an [AVL tree].
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMap<K: Ord, V> {
    tree: AvlTree<MapNode<K, V>>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K: Ord, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Creates a new, empty `AvlMap`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        K: fmt::Debug,
    {
        self.tree.assert_invariants();
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree
            .get_mut(key)
            // SAFETY: Pinning is not structural for `node.value`.
            .map(|node| unsafe { &mut node.get_unchecked_mut().value })
    }

    /// Returns a reference to the value associated with `key`, or [`KeyError`] if there is none.
    ///
    /// Unlike [`get`](Self::get), a missing key is reported as an error.
    #[inline]
    pub fn at<Q>(&self, key: &Q) -> Result<&V, KeyError>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyError)
    }

    /// Returns a mutable reference to the value associated with `key`, or [`KeyError`] if there is
    /// none.
    #[inline]
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyError>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(KeyError)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains `key`, only its value is overwritten, and the previous value is
    /// returned. The structure of the tree is not modified in that case.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(old) = self.get_mut(&key) {
            return Some(mem::replace(old, value));
        }

        let displaced = self.tree.insert(MapNode::new(key, value));
        debug_assert!(displaced.is_none(), "key was absent before insertion");

        None
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Removes the value associated with `key` from the map.
    ///
    /// Does nothing and returns `None` if the map does not contain `key`.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|node| node.value)
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.tree.iter().map(|node| (&node.key, &node.value))
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.tree.iter().map(|node| &node.key)
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Writes a Graphviz `digraph` of the underlying tree to `w`.
    pub fn dotgraph<W>(&self, name: &str, w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        self.tree.dotgraph(name, w)
    }
}

// SAFETY: The map exclusively owns its nodes, and shared access only ever reads them.
unsafe impl<K: Ord + Send, V: Send> Send for AvlMap<K, V> {}
unsafe impl<K: Ord + Sync, V: Sync> Sync for AvlMap<K, V> {}

impl<K: Ord, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AvlMap::new();
        map.extend(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_value() {
        let mut map = AvlMap::new();

        assert_eq!(map.insert(1, "one"), None);
        assert_eq!(map.insert(1, "uno"), Some("one"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"uno"));
        map.assert_invariants();
    }

    #[test]
    fn at_reports_missing_key() {
        let mut map: AvlMap<u32, Option<u32>> = AvlMap::new();
        map.insert(1, None);

        // A present key with an empty value is distinct from a missing key.
        assert_eq!(map.at(&1), Ok(&None));
        assert_eq!(map.at(&2), Err(KeyError));

        *map.at_mut(&1).unwrap() = Some(7);
        assert_eq!(map.get(&1), Some(&Some(7)));
        assert_eq!(map.at_mut(&3), Err(KeyError));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut map: AvlMap<u32, u32> = (0..8).map(|k| (k, k * 10)).collect();

        assert_eq!(map.remove(&100), None);
        assert_eq!(map.len(), 8);
        map.assert_invariants();

        assert_eq!(map.remove(&3), Some(30));
        assert!(!map.contains_key(&3));
        map.assert_invariants();
    }

    #[test]
    fn first_last_pop() {
        let mut map: AvlMap<u32, char> = [(2, 'b'), (1, 'a'), (3, 'c')].into_iter().collect();

        assert_eq!(map.first_key_value(), Some((&1, &'a')));
        assert_eq!(map.last_key_value(), Some((&3, &'c')));
        assert_eq!(map.pop_first(), Some((1, 'a')));
        assert_eq!(map.pop_last(), Some((3, 'c')));
        assert_eq!(map.pop_last(), Some((2, 'b')));
        assert_eq!(map.pop_first(), None);
        assert!(map.is_empty());
    }

    #[test]
    fn iter_is_sorted_both_ways() {
        let map: AvlMap<i32, i32> = [5, -3, 9, 0, 12, 7].into_iter().map(|k| (k, -k)).collect();

        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, [-3, 0, 5, 7, 9, 12]);

        let rev: Vec<_> = map.iter().rev().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(rev, [(12, -12), (9, -9), (7, -7), (5, -5), (0, 0), (-3, 3)]);

        assert_eq!(map.iter().len(), 6);
        assert_eq!(format!("{map:?}"), "{-3: 3, 0: 0, 5: -5, 7: -7, 9: -9, 12: -12}");
    }

    #[test]
    fn borrowed_lookup() {
        let mut map = AvlMap::new();
        map.insert(String::from("beta"), 2);
        map.insert(String::from("alpha"), 1);

        assert_eq!(map.get("alpha"), Some(&1));
        assert_eq!(map.remove("beta"), Some(2));
        assert_eq!(map.get("beta"), None);
    }

    #[test]
    fn drop_releases_values() {
        use std::rc::Rc;

        let value = Rc::new(());
        let mut map = AvlMap::new();
        for key in 0..32 {
            map.insert(key, Rc::clone(&value));
        }
        assert_eq!(Rc::strong_count(&value), 33);

        map.remove(&4);
        assert_eq!(Rc::strong_count(&value), 32);

        drop(map);
        assert_eq!(Rc::strong_count(&value), 1);
    }
}
