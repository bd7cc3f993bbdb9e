//! An intrusive AVL tree.

// Conventions used in comments:
// - The height `h(x)` of an empty subtree is 0; a leaf has height 1.
// - The balance factor of a node `x` is `b(x) = h(right(x)) - h(left(x))`.
// - A node is `dir`-heavy if its `dir` subtree is the taller one.
//
// The fundamental invariants of an AVL tree are:
// 1. Keys are in symmetric order.
// 2. All balance factors are -1, 0 or 1.
// 3. Parent links are the exact inverse of child links.
//
// A balance factor of ±2 exists only transiently, on the node being rebalanced, and never survives
// a public call.

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;
use tracing::trace;

mod debug;
mod error;
mod iter;
pub mod leaf_depth;
mod map;

#[cfg(any(test, feature = "model"))]
pub mod model;


pub use error::KeyError;
pub use iter::Iter;
pub use map::AvlMap;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Each node stores the height difference of its two subtrees in a small signed balance factor,
/// which is kept in `{-1, 0, 1}` by rotations performed while retracing from the point of
/// insertion or removal toward the root.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The change in balance factor caused by growing the subtree on this side.
    #[inline]
    fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree, which is 0 when empty and 1 for a single element.
    pub fn height(&self) -> usize {
        fn height_at<T>(node: Link<T>) -> usize
        where
            T: TreeNode<Links<T>> + ?Sized,
        {
            match node {
                None => 0,
                Some(node) => unsafe {
                    let links = T::links(node).as_ref();
                    1 + height_at(links.left()).max(height_at(links.right()))
                },
            }
        }

        height_at(self.root)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        T::Key: fmt::Debug,
    {
        let mut count = 0;

        if let Some(root) = self.root {
            unsafe {
                assert_eq!(
                    T::links(root).as_ref().parent(),
                    None,
                    "root must not have a parent"
                );
                self.assert_invariants_at(root, None, None, &mut count);
            }
        }

        assert_eq!(count, self.len, "`len` does not match the number of linked nodes");
    }

    // Checks the subtree rooted at `node`, all of whose keys must lie strictly between `lower` and
    // `upper`. Returns the height of the subtree.
    #[allow(clippy::only_used_in_recursion)]
    unsafe fn assert_invariants_at(
        &self,
        node: NonNull<T>,
        lower: Option<&T::Key>,
        upper: Option<&T::Key>,
        count: &mut usize,
    ) -> usize
    where
        T::Key: fmt::Debug,
    {
        unsafe {
            *count += 1;

            let key = node.as_ref().key();
            if let Some(lower) = lower {
                assert!(lower < key, "{lower:?} must be ordered before {key:?}");
            }
            if let Some(upper) = upper {
                assert!(key < upper, "{key:?} must be ordered before {upper:?}");
            }

            let mut heights = [0; 2];
            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = T::links(node).as_ref().child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = T::links(child)
                        .as_ref()
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent);

                    let (lower, upper) = match dir {
                        Dir::Left => (lower, Some(key)),
                        Dir::Right => (Some(key), upper),
                    };
                    heights[dir as usize] = self.assert_invariants_at(child, lower, upper, count);
                }
            }

            let balance = T::links(node).as_ref().balance();
            let measured = heights[Dir::Right as usize] as isize - heights[Dir::Left as usize] as isize;
            assert_eq!(
                balance as isize, measured,
                "stored balance of {key:?} does not match its subtree heights"
            );
            assert!(
                (-1..=1).contains(&balance),
                "{key:?} is out of balance: {balance}"
            );

            1 + heights[0].max(heights[1])
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// Modifying the key of the returned node in a way that changes its ordering relative to the
    /// other keys in the tree leaves the tree in an unspecified (but memory-safe) state.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains a node corresponding to `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = T::links(cur).as_ref().left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = T::links(cur).as_ref().right(),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let first = self.first_raw()?;
        unsafe { Some(Pin::new_unchecked(first.as_ref())) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let last = self.last_raw()?;
        unsafe { Some(Pin::new_unchecked(last.as_ref())) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        unsafe { Some(self.remove_at(first)) }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        unsafe { Some(self.remove_at(last)) }
    }

    /// Returns an iterator over the elements of the tree in key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    fn first_raw(&self) -> Link<T> {
        let root = self.root?;
        unsafe { Some(self.extreme_in_subtree(root, Dir::Left)) }
    }

    fn last_raw(&self) -> Link<T> {
        let root = self.root?;
        unsafe { Some(self.extreme_in_subtree(root, Dir::Right)) }
    }

    // Returns the node reached by following `dir` links from `root` as far as possible.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(next) = unsafe { T::links(cur).as_ref().child(dir) } {
            cur = next;
        }

        cur
    }

    // Returns the in-order predecessor of `node`: the greatest node ordered before it.
    pub(crate) unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Left) }
    }

    // Returns the in-order successor of `node`: the least node ordered after it.
    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Right) }
    }

    // Returns the in-order neighbor of `node` in direction `dir`.
    //
    // This is the `!dir`-most node of the `dir` subtree if there is one, otherwise the nearest
    // ancestor reached by climbing out of a `!dir` subtree.
    unsafe fn neighbor_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            if let Some(child) = T::links(node).as_ref().child(dir) {
                return Some(self.extreme_in_subtree(child, !dir));
            }

            let mut cur = node;
            while let Some(parent) = T::links(cur).as_ref().parent() {
                if T::links(parent).as_ref().child(!dir) == Some(cur) {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { T::links(node).as_mut().set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Option<NonNull<T>>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);

            debug_assert!(
                new_child.is_none() || T::links(parent).as_ref().child(!dir) != new_child,
                "`new_child` must not be a child of `parent`"
            );

            T::links(parent).as_mut().set_child(dir, new_child);
        }
    }

    // Rotates the subtree rooted at `pivot` in direction `dir`: the `!dir` child of `pivot` takes
    // its place, and `pivot` becomes that child's `dir` child. The inner grandchild crosses over to
    // become `pivot`'s `!dir` child.
    //
    // `rotate(y, Dir::Right)` is a right rotation around `y`, `rotate(y, Dir::Left)` a left one.
    //
    // Balance factors are not updated. Returns the new subtree root.
    unsafe fn rotate(&mut self, pivot: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = T::links(pivot)
                .as_ref()
                .child(!dir)
                .expect("rotation requires a child on the rising side");

            // - `pivot` becomes the `dir` child of `up`.
            // - `across` goes from the `dir` child of `up` to the `!dir` child of `pivot`.
            let across = T::links(up).as_ref().child(dir);
            T::links(pivot).as_mut().set_child(!dir, across);
            self.maybe_set_parent(across, Some(pivot));

            T::links(up).as_mut().set_child(dir, Some(pivot));
            let parent = T::links(pivot).as_mut().set_parent(Some(up));
            T::links(up).as_mut().set_parent(parent);

            self.replace_child_or_set_root(parent, pivot, Some(up));

            up
        }
    }

    // Resolves a zig-zag imbalance at `top`, which is doubly `dir`-heavy while its `dir` child
    // `mid` is `!dir`-heavy. The `!dir` child of `mid` rises two levels to replace `top`.
    //
    // Balance factors of all three nodes are recomputed from the rising node's old balance factor.
    // Returns the new subtree root.
    unsafe fn rotate_twice(&mut self, top: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let mid = T::links(top)
                .as_ref()
                .child(dir)
                .expect("heavy side must have a child");
            let bottom = T::links(mid)
                .as_ref()
                .child(!dir)
                .expect("inner grandchild must exist for a double rotation");
            let b = T::links(bottom).as_ref().balance();

            self.rotate(mid, dir);
            self.rotate(top, !dir);

            // `bottom`'s `dir` subtree ends up under `mid`, its `!dir` subtree under `top`.
            let s = dir.sign();
            T::links(top)
                .as_mut()
                .set_balance(if b == s { -s } else { 0 });
            T::links(mid)
                .as_mut()
                .set_balance(if b == -s { s } else { 0 });
            T::links(bottom).as_mut().set_balance(0);

            bottom
        }
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains an item with an equal key, `item` takes over its position and
    /// the displaced item is returned. The shape of the tree is unchanged in that case.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);
        unsafe { T::links(ptr).as_mut().clear() };

        let Some(root) = self.root else {
            // Tree is empty. Set `item` as the root and return.
            self.root = Some(ptr);
            self.len += 1;
            return None;
        };

        // Descend the tree, looking for a suitable leaf.
        let mut parent = root;
        loop {
            let ordering = unsafe { ptr.as_ref().key().cmp(parent.as_ref().key()) };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Some(unsafe { self.replace_node(parent, ptr) }),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { T::links(parent).as_ref().child(dir) } {
                // Descend.
                Some(child) => parent = child,

                // Set `item` as child.
                None => unsafe {
                    T::links(parent).as_mut().set_child(dir, Some(ptr));
                    T::links(ptr).as_mut().set_parent(Some(parent));
                    break;
                },
            }
        }

        self.len += 1;
        unsafe { self.rebalance_inserted(ptr) };

        None
    }

    // Links `new` into the position held by `old` and unlinks `old`, returning it.
    //
    // `new` inherits the balance factor of `old`. The caller must ensure the keys are equal.
    unsafe fn replace_node(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe {
            let (parent, left, right, balance) = {
                let links = T::links(old).as_ref();
                (links.parent(), links.left(), links.right(), links.balance())
            };

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let links = T::links(new).as_mut();
            links.set_parent(parent);
            links.set_left(left);
            links.set_right(right);
            links.set_balance(balance);

            T::links(old).as_mut().clear();

            T::from_ptr(old)
        }
    }

    // Performs a bottom-up rebalance of the tree after `node` was linked in as a leaf.
    //
    // Each ancestor whose subtree grew one level taller has its balance factor adjusted toward the
    // side that grew. The walk stops at the first ancestor whose subtree height did not change:
    // - it became balanced, or
    // - it became doubly heavy, and the rotation that fixes it restores its previous height.
    unsafe fn rebalance_inserted(&mut self, node: NonNull<T>) {
        let mut child = node;

        while let Some(parent) = unsafe { T::links(child).as_ref().parent() } {
            unsafe {
                let dir = self.which_child(parent, child);

                match self.adjust_balance(parent, dir.sign()) {
                    0 => return,
                    -1 | 1 => child = parent,
                    _ => {
                        // `child` only ever rises from a grown subtree, so it is heavy on one
                        // side. A child heavy toward `dir` is straightened by a single rotation.
                        if T::links(child).as_ref().balance() == dir.sign() {
                            trace!(?dir, "insert: single rotation");
                            T::links(child).as_mut().set_balance(0);
                            T::links(parent).as_mut().set_balance(0);
                            self.rotate(parent, !dir);
                        } else {
                            trace!(?dir, "insert: double rotation");
                            self.rotate_twice(parent, dir);
                        }

                        return;
                    }
                }
            }
        }
    }

    /// Removes the item corresponding to `key` from the tree, returning it.
    ///
    /// Returns `None` and leaves the tree untouched if no item has an equal key.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        unsafe { Some(self.remove_at(node)) }
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            // A node with two children first trades places with its in-order predecessor, which
            // has no right child. Afterwards `node` has at most one child.
            let (left, right) = {
                let links = T::links(node).as_ref();
                (links.left(), links.right())
            };
            if let (Some(left), Some(_)) = (left, right) {
                let predecessor = self.extreme_in_subtree(left, Dir::Right);
                trace!("remove: relocating to predecessor position");
                self.swap_nodes(node, predecessor);
            }

            let (parent, child) = {
                let links = T::links(node).as_ref();
                debug_assert!(links.left().is_none() || links.right().is_none());
                (links.parent(), links.left().or(links.right()))
            };

            // Elevate the sole child (which may be None) into `node`'s place.
            self.maybe_set_parent(child, parent);
            match parent {
                Some(parent) => {
                    let dir = self.which_child(parent, node);
                    T::links(parent).as_mut().set_child(dir, child);
                    self.rebalance_removed(parent, dir);
                }
                None => self.root = child,
            }

            self.len -= 1;

            T::links(node).as_mut().clear();
            T::from_ptr(node)
        }
    }

    // Performs a bottom-up rebalance of the tree after the `shrunk` subtree of `node` lost one
    // level of height.
    //
    // Unlike insertion, a rotation does not necessarily end the walk: it ends only when a subtree's
    // height is known to be unchanged, i.e. the node became singly heavy, or a single rotation was
    // done around a node whose heavy child was balanced.
    unsafe fn rebalance_removed(&mut self, mut node: NonNull<T>, mut shrunk: Dir) {
        loop {
            unsafe {
                // Which side of the next ancestor shrinks must be known before any rotation
                // relinks `node`.
                let up = T::links(node)
                    .as_ref()
                    .parent()
                    .map(|parent| (parent, self.which_child(parent, node)));

                match self.adjust_balance(node, -shrunk.sign()) {
                    // Was balanced; the other side still holds the height.
                    -1 | 1 => return,

                    // Was heavy on the shrunk side; the subtree is one level shorter.
                    0 => (),

                    _ => {
                        let heavy = !shrunk;
                        let child = T::links(node)
                            .as_ref()
                            .child(heavy)
                            .expect("heavy side must have a child");
                        let child_balance = T::links(child).as_ref().balance();

                        if child_balance == 0 {
                            trace!(?heavy, "remove: single rotation, height unchanged");
                            self.rotate(node, shrunk);
                            T::links(node).as_mut().set_balance(heavy.sign());
                            T::links(child).as_mut().set_balance(-heavy.sign());
                            return;
                        } else if child_balance == heavy.sign() {
                            trace!(?heavy, "remove: single rotation");
                            self.rotate(node, shrunk);
                            T::links(node).as_mut().set_balance(0);
                            T::links(child).as_mut().set_balance(0);
                        } else {
                            trace!(?heavy, "remove: double rotation");
                            self.rotate_twice(node, heavy);
                        }
                    }
                }

                let Some((parent, dir)) = up else {
                    return;
                };

                node = parent;
                shrunk = dir;
            }
        }
    }

    // Exchanges the positions of `a` and `b` in the tree, together with their balance factors,
    // which describe the positions rather than the nodes.
    //
    // Keys are not consulted. The caller must restore symmetric order, typically by removing one of
    // the two nodes.
    unsafe fn swap_nodes(&mut self, a: NonNull<T>, b: NonNull<T>) {
        if a == b {
            return;
        }

        unsafe {
            let read = |node: NonNull<T>| {
                let links = T::links(node).as_ref();
                (links.parent(), [links.left(), links.right()], links.balance())
            };

            let (a_parent, a_children, a_balance) = read(a);
            let (b_parent, b_children, b_balance) = read(b);

            let a_dir = a_parent.map(|p| self.which_child(p, a));
            let b_dir = b_parent.map(|p| self.which_child(p, b));

            // Each node takes over the other's links. Where the two nodes are adjacent, the link
            // between them is reversed rather than copied.
            let flip = |link: Link<T>, from: NonNull<T>, to: NonNull<T>| {
                if link == Some(from) {
                    Some(to)
                } else {
                    link
                }
            };

            let new_a_parent = flip(b_parent, a, b);
            let new_a_children = b_children.map(|c| flip(c, a, b));
            let new_b_parent = flip(a_parent, b, a);
            let new_b_children = a_children.map(|c| flip(c, b, a));

            // Relink outside neighbors first, using the sides recorded before any writes so that
            // siblings under one parent are handled correctly.
            match (new_a_parent, b_dir) {
                (Some(p), Some(dir)) if p != b => {
                    T::links(p).as_mut().set_child(dir, Some(a));
                }
                (None, _) => self.root = Some(a),
                _ => (),
            }

            match (new_b_parent, a_dir) {
                (Some(p), Some(dir)) if p != a => {
                    T::links(p).as_mut().set_child(dir, Some(b));
                }
                (None, _) => self.root = Some(b),
                _ => (),
            }

            for child in new_a_children.into_iter().flatten().filter(|&c| c != b) {
                T::links(child).as_mut().set_parent(Some(a));
            }

            for child in new_b_children.into_iter().flatten().filter(|&c| c != a) {
                T::links(child).as_mut().set_parent(Some(b));
            }

            let links = T::links(a).as_mut();
            links.set_parent(new_a_parent);
            links.set_left(new_a_children[Dir::Left as usize]);
            links.set_right(new_a_children[Dir::Right as usize]);
            links.set_balance(b_balance);

            let links = T::links(b).as_mut();
            links.set_parent(new_b_parent);
            links.set_left(new_b_children[Dir::Left as usize]);
            links.set_right(new_b_children[Dir::Right as usize]);
            links.set_balance(a_balance);
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let cur = self.extreme_in_subtree(cur, Dir::Left);
                let parent = T::links(cur).as_ref().parent();
                let right = T::links(cur).as_ref().right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    // Adds `diff` to the balance factor of `node`, returning the new balance factor.
    #[inline]
    unsafe fn adjust_balance(&mut self, node: NonNull<T>, diff: i8) -> i8 {
        unsafe {
            let inner = T::links(node).as_mut().inner.get_mut();
            inner.balance += diff;
            debug_assert!((-2..=2).contains(&inner.balance));
            inner.balance
        }
    }

    #[inline]
    unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { T::links(parent).as_ref().left() } == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    // Resets the links to those of a detached leaf.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}
