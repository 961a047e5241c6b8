use super::{display_id, NodeId, Tree};

/// Cumulative branch length from the root, indexed by NodeId.
/// `dist(child) = dist(parent) + max(0, length(child))`.
pub fn cumulative_distance(tree: &Tree, root: NodeId) -> Vec<f64> {
    let mut dist = vec![0.0; tree.len()];
    let mut stack = vec![root];

    while let Some(u) = stack.pop() {
        for &c in &tree.nodes()[u].children {
            dist[c] = dist[u] + tree.nodes()[c].length.max(0.0);
            stack.push(c);
        }
    }

    dist
}

/// Sort the children of every internal node by the lexicographically
/// smallest leaf label reachable through each child.
///
/// The per-subtree minimum label is precomputed in one post-order pass;
/// sorting then compares scalars. Re-collecting leaves inside the
/// comparator would be quadratic on ladder-shaped trees.
///
/// Unnamed leaves fall back to their display id. Ties keep the original
/// order (stable sort), which makes the drawing deterministic.
pub fn sort_children_by_min_leaf(tree: &mut Tree) {
    let Some(root) = tree.get_root() else {
        return;
    };

    let order = tree.postorder(root);
    let mut key: Vec<String> = vec![String::new(); tree.len()];

    for &u in &order {
        let node = &tree.nodes()[u];
        if node.is_leaf() {
            key[u] = match &node.name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => display_id(u),
            };
        } else {
            let mut best: Option<NodeId> = None;
            for &c in &node.children {
                if best.map_or(true, |b| key[c] < key[b]) {
                    best = Some(c);
                }
            }
            if let Some(b) = best {
                key[u] = key[b].clone();
            }
        }
    }

    for u in 0..tree.len() {
        if let Some(node) = tree.get_node_mut(u) {
            if node.children.len() > 1 {
                node.children.sort_by(|&a, &b| key[a].cmp(&key[b]));
            }
        }
    }
}

/// Equal leaf spacing: leaf `i` (left-to-right) gets `y = i * leaf_step`;
/// internal nodes get the mean y of their immediate children, computed in
/// post-order. Returns a vector indexed by NodeId.
pub fn assign_y_equal_leaf_spacing(tree: &Tree, root: NodeId, leaf_step: f64) -> Vec<f64> {
    let mut y = vec![0.0; tree.len()];

    for (i, &leaf) in tree.leaves_of(root).iter().enumerate() {
        y[leaf] = i as f64 * leaf_step;
    }

    for &u in &tree.postorder(root) {
        let node = &tree.nodes()[u];
        if !node.children.is_empty() {
            y[u] = node.children.iter().map(|&c| y[c]).sum::<f64>()
                / node.children.len() as f64;
        }
    }

    y
}
