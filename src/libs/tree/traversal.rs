use super::{NodeId, Tree};

// All traversals use explicit heap stacks. Tree depth may approach 1e6;
// recursion is off the table.

/// Node IDs in preorder (parent before children, left-to-right).
pub fn preorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            // Push children in reverse order so they are processed in order
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
    }

    result
}

/// Node IDs with every child preceding its parent.
///
/// A parent-first sweep reversed: each node is emitted before its children
/// are expanded, so the reversed sequence places children first.
pub fn postorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            order.push(id);
            for &child in &node.children {
                stack.push(child);
            }
        }
    }

    order.reverse();
    order
}

/// Leaves of the subtree rooted at `start_node`, preserving left-to-right
/// order (children pushed in reverse).
pub fn collect_leaves(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut acc = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            if node.is_leaf() {
                acc.push(id);
            } else {
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId) {
        // ((a,b)x,c)r
        let mut tree = Tree::new();
        let r = tree.add_node();
        let x = tree.add_node();
        let a = tree.add_node();
        let b = tree.add_node();
        let c = tree.add_node();
        tree.attach(r, x);
        tree.attach(x, a);
        tree.attach(x, b);
        tree.attach(r, c);
        tree.set_root(r);
        (tree, r)
    }

    #[test]
    fn test_preorder() {
        let (tree, r) = sample();
        assert_eq!(tree.preorder(r), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_postorder_children_first() {
        let (tree, r) = sample();
        let order = tree.postorder(r);
        let pos = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        // Every child appears before its parent
        for node in tree.nodes() {
            for &c in &node.children {
                assert!(pos(c) < pos(node.id));
            }
        }
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn test_collect_leaves_order() {
        let (tree, r) = sample();
        assert_eq!(tree.leaves_of(r), vec![2, 3, 4]); // a, b, c
    }

    #[test]
    fn test_deep_chain_no_overflow() {
        let mut tree = Tree::new();
        let mut prev = tree.add_node();
        tree.set_root(prev);
        for _ in 0..200_000 {
            let next = tree.add_node();
            tree.attach(prev, next);
            prev = next;
        }
        assert_eq!(tree.preorder(0).len(), 200_001);
        assert_eq!(tree.postorder(0).len(), 200_001);
        assert_eq!(tree.leaves_of(0), vec![prev]);
    }
}
