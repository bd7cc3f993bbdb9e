//! Leaf depth comparison for arbitrary binary trees.
//!
//! Nothing here depends on [`AvlTree`](crate::AvlTree): any structure exposing a node's two
//! children can be checked, whether or not it is ordered or balanced.

/// A binary tree node which exposes its children.
pub trait BinaryNode {
    fn left(&self) -> Option<&Self>;

    fn right(&self) -> Option<&Self>;
}

/// An owned binary tree node without any ordering or balancing constraints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node<T> {
    pub value: T,
    pub left: Option<Box<Node<T>>>,
    pub right: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    /// Returns a node with no children.
    pub fn leaf(value: T) -> Self {
        Node {
            value,
            left: None,
            right: None,
        }
    }

    pub fn new(value: T, left: Option<Node<T>>, right: Option<Node<T>>) -> Self {
        Node {
            value,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }
}

impl<T> BinaryNode for Node<T> {
    fn left(&self) -> Option<&Self> {
        self.left.as_deref()
    }

    fn right(&self) -> Option<&Self> {
        self.right.as_deref()
    }
}

/// Returns `true` if every leaf reachable from `root` is at the same depth.
///
/// A leaf is a node with no children. An empty tree has no leaves and so trivially qualifies.
pub fn all_equal_leaf_depth<N>(root: Option<&N>) -> bool
where
    N: BinaryNode + ?Sized,
{
    let mut leaf_depth = None;

    root.map_or(true, |root| equal_leaf_depth_at(root, 0, &mut leaf_depth))
}

// Depth-first check of the subtree at `node`, which lies `depth` levels below the root. The first
// leaf visited fixes the depth every later leaf must match.
fn equal_leaf_depth_at<N>(node: &N, depth: usize, leaf_depth: &mut Option<usize>) -> bool
where
    N: BinaryNode + ?Sized,
{
    match (node.left(), node.right()) {
        (None, None) => *leaf_depth.get_or_insert(depth) == depth,
        (left, right) => [left, right]
            .into_iter()
            .flatten()
            .all(|child| equal_leaf_depth_at(child, depth + 1, leaf_depth)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(root: &Node<u32>) -> bool {
        all_equal_leaf_depth(Some(root))
    }

    #[test]
    fn empty() {
        assert!(all_equal_leaf_depth::<Node<u32>>(None));
    }

    #[test]
    fn single_node() {
        assert!(check(&Node::leaf(1)));
    }

    #[test]
    fn uneven_paths() {
        // 1 -> 2 -> 3 on the left, 1 -> 4 on the right.
        let root = Node::new(
            1,
            Some(Node::new(2, Some(Node::leaf(3)), None)),
            Some(Node::leaf(4)),
        );

        assert!(!check(&root));
    }

    #[test]
    fn unary_chain() {
        // A path has exactly one leaf.
        let root = Node::new(1, None, Some(Node::new(2, Some(Node::leaf(3)), None)));

        assert!(check(&root));
    }

    #[test]
    fn perfect_tree() {
        let root = Node::new(
            4,
            Some(Node::new(2, Some(Node::leaf(1)), Some(Node::leaf(3)))),
            Some(Node::new(6, Some(Node::leaf(5)), Some(Node::leaf(7)))),
        );

        assert!(check(&root));
    }

    #[test]
    fn leaves_equal_despite_unary_interior() {
        let root = Node::new(
            1,
            Some(Node::new(2, None, Some(Node::leaf(3)))),
            Some(Node::new(4, Some(Node::leaf(5)), None)),
        );

        assert!(check(&root));
    }

    #[test]
    fn deep_mismatch_on_right() {
        let root = Node::new(
            1,
            Some(Node::new(2, Some(Node::leaf(3)), Some(Node::leaf(4)))),
            Some(Node::new(
                5,
                Some(Node::leaf(6)),
                Some(Node::new(7, None, Some(Node::leaf(8)))),
            )),
        );

        assert!(!check(&root));
    }
}
