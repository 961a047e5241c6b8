pub mod algo;
pub mod node;
pub mod traversal;

pub use node::{display_id, Node, NodeId};

/// Arena-backed tree: one flat vector of node records, ids are indices.
/// Parent/child relations are ids, not references, so deep or wide trees
/// carry no ownership cycles and no per-node allocation beyond the record.
#[derive(Debug, Default, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new detached node to the arena. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Link `child` under `parent`, updating both sides of the relation.
    /// Ids must come from `add_node` and `child` must still be detached.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(parent != child);
        debug_assert!(self.nodes[child].parent.is_none());
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        if id < self.nodes.len() {
            self.root = Some(id);
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Linear scan for nodes without a parent, in id order.
    pub fn detached_roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect()
    }

    // --- Delegation to traversal ---

    pub fn preorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::preorder(self, start_node)
    }

    pub fn postorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::postorder(self, start_node)
    }

    /// Leaves of the subtree rooted at `start_node`, left-to-right.
    pub fn leaves_of(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::collect_leaves(self, start_node)
    }

    pub fn get_leaves(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => traversal::collect_leaves(self, root),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_basic() {
        let mut tree = Tree::new();
        let r = tree.add_node();
        let a = tree.add_node();
        let b = tree.add_node();
        tree.attach(r, a);
        tree.attach(r, b);
        tree.set_root(r);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get_root(), Some(r));
        assert_eq!(tree.get_node(r).unwrap().children, vec![a, b]);
        assert_eq!(tree.get_node(a).unwrap().parent, Some(r));
        assert!(tree.get_node(a).unwrap().is_leaf());
        assert_eq!(tree.get_node(b).unwrap().display_id(), "n3");
    }

    #[test]
    fn test_detached_roots() {
        let mut tree = Tree::new();
        let r1 = tree.add_node();
        let r2 = tree.add_node();
        let c = tree.add_node();
        tree.attach(r2, c);
        assert_eq!(tree.detached_roots(), vec![r1, r2]);
    }
}
