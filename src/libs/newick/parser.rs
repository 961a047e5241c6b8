use super::error::ParseError;
use super::token::{Token, Tokenizer};
use crate::libs::tree::{NodeId, Tree};

/// Report progress roughly every this many tokens.
const PROGRESS_STRIDE: usize = 1000;

#[derive(Debug, Default, Clone)]
pub struct ParseOptions {
    /// Soft cutoff: once the node count reaches the limit, parsing halts
    /// and the partial tree is finalized. Not an error.
    pub limit: Option<usize>,
}

/// Parse Newick text into an arena tree in a single pass.
///
/// The parser keeps a stack of open groups and two cursors: the current
/// parent and the most recently created or closed node. `;` separates
/// trees; all top-level roots are unified under one synthetic root when
/// more than one remains.
///
/// `report` receives fractional completion estimates in `[0, 1]`, at most
/// once per 1% change.
///
/// # Example
/// ```
/// use treegl::libs::newick::{parse_newick, ParseOptions};
/// let tree = parse_newick("(A:0.1,B:0.2);", &ParseOptions::default(), &mut |_| {}).unwrap();
/// assert_eq!(tree.len(), 3);
/// assert_eq!(tree.get_leaves().len(), 2);
/// ```
pub fn parse_newick(
    text: &str,
    opts: &ParseOptions,
    report: &mut dyn FnMut(f64),
) -> Result<Tree, ParseError> {
    let mut tree = Tree::new();
    let mut stack: Vec<Option<NodeId>> = Vec::new();
    let mut current_parent: Option<NodeId> = None;
    let mut last: Option<NodeId> = None;
    let mut pending_len: Option<f64> = None;
    let mut limit_hit = false;

    // Rough denominator: tokens are a few bytes each on average
    let denom = (text.len() / 10).max(1) as f64;
    let mut tokens_processed = 0usize;
    let mut last_reported = 0.0f64;

    let mut tokens = Tokenizer::new(text);
    while let Some(tok) = tokens.next() {
        if let Some(limit) = opts.limit {
            if tree.len() >= limit {
                log::warn!("hit limit of {} nodes, stopping", limit);
                limit_hit = true;
                break;
            }
        }

        tokens_processed += 1;
        if tokens_processed % PROGRESS_STRIDE == 0 {
            let estimated = (tokens_processed as f64 / denom).min(1.0);
            if estimated - last_reported >= 0.01 {
                report(estimated);
                last_reported = estimated;
            }
        }

        match tok? {
            Token::Open => {
                let u = tree.add_node();
                if let Some(p) = current_parent {
                    tree.attach(p, u);
                }
                stack.push(current_parent);
                current_parent = Some(u);
                last = None;
            }
            Token::Comma => {
                last = None;
                pending_len = None;
            }
            Token::Close => {
                let Some(closed) = current_parent else {
                    return Err(ParseError::malformed(
                        "unexpected ')'",
                        text,
                        tokens.pos().saturating_sub(1),
                    ));
                };
                if let Some(len) = pending_len.take() {
                    if let Some(node) = tree.get_node_mut(closed) {
                        node.length = len.max(0.0);
                    }
                }
                // The just-closed node may still receive a label or length
                current_parent = stack.pop().flatten();
                last = Some(closed);
            }
            Token::Semi => {
                // Tree separator: reset cursors, keep the node table so a
                // following tree unifies under the synthetic root
                if current_parent.is_some() {
                    return Err(ParseError::malformed(
                        "';' inside an open group",
                        text,
                        tokens.pos().saturating_sub(1),
                    ));
                }
                last = None;
                pending_len = None;
            }
            Token::Length(v) => match last {
                Some(l) => {
                    if let Some(node) = tree.get_node_mut(l) {
                        node.length = v.max(0.0);
                    }
                }
                None => pending_len = Some(v),
            },
            Token::Name(name) => {
                match last {
                    // Labels the node just closed (or renames the leaf)
                    Some(l) => {
                        if let Some(node) = tree.get_node_mut(l) {
                            node.name = Some(name.to_string());
                        }
                    }
                    None => {
                        let u = tree.add_node();
                        if let Some(node) = tree.get_node_mut(u) {
                            node.name = Some(name.to_string());
                        }
                        if let Some(p) = current_parent {
                            tree.attach(p, u);
                        }
                        last = Some(u);
                    }
                }
                pending_len = None;
            }
        }
    }

    if !limit_hit && current_parent.is_some() {
        return Err(ParseError::malformed(
            "unbalanced input: unclosed '('",
            text,
            tokens.pos(),
        ));
    }

    finalize(tree, report)
}

// Root unification: exactly one root survives. A synthetic root (name
// "root", length 0) is fabricated over multiple top-level groups, its
// children in parse order.
fn finalize(mut tree: Tree, report: &mut dyn FnMut(f64)) -> Result<Tree, ParseError> {
    if tree.is_empty() {
        return Err(ParseError::EmptyTree);
    }

    let roots = tree.detached_roots();
    let root_id = if roots.len() == 1 {
        roots[0]
    } else {
        let r = tree.add_node();
        if let Some(node) = tree.get_node_mut(r) {
            node.name = Some("root".to_string());
        }
        for orphan in roots {
            tree.attach(r, orphan);
        }
        r
    };
    tree.set_root(root_id);

    report(1.0);
    log::info!("parsed {} nodes, root {}", tree.len(), root_id);
    Ok(tree)
}
