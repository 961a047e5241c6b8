use fxhash::{FxHashMap, FxHashSet};

use crate::libs::graph::{Link, Point, PointKind, VisualGraph};
use crate::libs::tree::{algo, display_id, NodeId, Tree};

// Geometry & appearance constants
pub const SIZE_LEAF_MARKER: f64 = 20.0;
pub const SIZE_INTERNAL: f64 = 6.0;
pub const SIZE_BEND: f64 = 3.0;
pub const SIZE_LEAF_REAL: f64 = 8.0;
/// Global size scaling applied at emission
pub const NODE_SIZE_SCALE: f64 = 2.0;

pub const COLOR_LEAF: &str = "#f5d76e";
pub const COLOR_INTERNAL: &str = "#8ab4f8";
pub const COLOR_BEND: &str = "#9aa0a6";
pub const COLOR_LINK: &str = "#97A1A9";

// Two y-coordinates closer than this share a bend
const EPS: f64 = 1e-6;

/// Geometry parameters of the orthogonal drawing.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// px per branch-length unit
    pub x_scale: f64,
    /// min horizontal gap between adjacent vertical stems
    pub min_level_gap: f64,
    /// vertical spacing between consecutive leaves
    pub leaf_step: f64,
    /// elbow stub length before the vertical
    pub parent_stub: f64,
    /// extra space right of the farthest leaf for markers
    pub tip_pad: f64,
    /// minimal horizontal stub to the weighted segment
    pub weighted_stub: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            x_scale: 140.0,
            min_level_gap: 56.0,
            leaf_step: 400.0,
            parent_stub: 20.0,
            tip_pad: 40.0,
            weighted_stub: 40.0,
        }
    }
}

// Decimal rounding to 6 places; cache keys hash the rounded bits so two
// points within 0.5e-6 coalesce.
fn q6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

fn bend_key(x: f64, y: f64) -> (u64, u64) {
    (x.to_bits(), y.to_bits())
}

// Append-only point/link tables plus the two dedup caches.
#[derive(Default)]
struct Emitter {
    points: Vec<Point>,
    links: Vec<Link>,
    bend_cache: FxHashMap<(u64, u64), i64>,
    link_cache: FxHashSet<(i64, i64)>,
}

impl Emitter {
    // Bends are coalesced through the cache; every other kind always gets
    // a fresh id, even at coincident coordinates.
    fn add_point(
        &mut self,
        kind: PointKind,
        x: f64,
        y: f64,
        label: String,
        color: Option<&'static str>,
        size: Option<f64>,
    ) -> i64 {
        let (xq, yq) = (q6(x), q6(y));
        if kind == PointKind::Bend {
            if let Some(&pid) = self.bend_cache.get(&bend_key(xq, yq)) {
                return pid;
            }
        }

        let pid = self.points.len() as i64;
        let size = size.unwrap_or(match kind {
            PointKind::Leaf => SIZE_LEAF_REAL,
            PointKind::Internal => SIZE_INTERNAL,
            _ => SIZE_BEND,
        });
        let color = color.unwrap_or(match kind {
            PointKind::Leaf | PointKind::LeafMarker => COLOR_LEAF,
            PointKind::Internal => COLOR_INTERNAL,
            PointKind::Bend => COLOR_BEND,
        });

        self.points.push(Point {
            id: pid,
            x: xq,
            y: yq,
            size: size * NODE_SIZE_SCALE,
            color,
            label,
            kind,
        });
        if kind == PointKind::Bend {
            self.bend_cache.insert(bend_key(xq, yq), pid);
        }
        pid
    }

    // First emission wins; duplicate (source, target) pairs are dropped.
    fn add_link(&mut self, source: i64, target: i64) {
        if self.link_cache.insert((source, target)) {
            self.links.push(Link {
                source,
                target,
                color: COLOR_LINK,
            });
        }
    }
}

/// Convert logical tree nodes into visual points and orthogonal edges.
///
/// Children are reordered for crossing reduction, leaves receive equal
/// vertical spacing, and vertical stems are spread so no two are closer
/// than `min_level_gap`. The tree is consumed; the output tables are all
/// that survives.
///
/// `report` receives fractions in `[0, 1]` at the sub-stage boundaries.
pub fn build_display_graph(
    mut tree: Tree,
    params: &LayoutParams,
    report: &mut dyn FnMut(f64),
) -> VisualGraph {
    report(0.0);
    let Some(root) = tree.get_root() else {
        return VisualGraph::default();
    };

    // 1. Logical coordinates
    let dist = algo::cumulative_distance(&tree, root);
    report(0.08);
    algo::sort_children_by_min_leaf(&mut tree);
    let y = algo::assign_y_equal_leaf_spacing(&tree, root, params.leaf_step);
    report(0.15);

    // 2. X-scaling and stem separation
    let n = tree.len();
    let dist_px: Vec<f64> = dist.iter().map(|d| d * params.x_scale).collect();

    let raw_stems = collect_raw_stems(&dist_px, params.parent_stub);
    let stem_map = spread_stems(&raw_stems, params.min_level_gap);
    let stem_x = |u: NodeId| stem_map[&q6(dist_px[u] + params.parent_stub).to_bits()];

    let mut em = Emitter::default();
    let mut point_of_node: Vec<i64> = vec![0; n];

    // 3. One visual point per logical node, stem-aligned for now
    report(0.20);
    let node_stride = (n / 20).max(1);
    for u in 0..n {
        let node = &tree.nodes()[u];
        let kind = if node.is_leaf() {
            PointKind::Leaf
        } else {
            PointKind::Internal
        };
        let label = match &node.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ if kind == PointKind::Leaf => display_id(u),
            _ => String::new(),
        };
        let ex = q6(stem_x(u));
        point_of_node[u] = em.add_point(kind, ex - params.parent_stub, y[u], label, None, None);

        if (u + 1) % node_stride == 0 {
            report(0.20 + 0.25 * ((u + 1) as f64 / n as f64));
        }
    }
    report(0.45);

    // 4. Orthogonal edges. Children are re-placed at their true weighted x
    // now that the parent's stem x is known.
    let total_links = tree
        .nodes()
        .iter()
        .map(|v| v.children.len())
        .sum::<usize>()
        .max(1);
    let link_stride = (total_links / 20).max(1);
    let mut links_created = 0usize;

    for u in 0..n {
        let ex = q6(stem_x(u));
        let y_parent = y[u];

        for i in 0..tree.nodes()[u].children.len() {
            let c = tree.nodes()[u].children[i];
            let y_child = y[c];
            let true_len_px = tree.nodes()[c].length.max(0.0) * params.x_scale;
            let child_pid = point_of_node[c];

            em.points[child_pid as usize].x = q6(ex + params.weighted_stub + true_len_px);

            let elbow_top = em.add_point(PointKind::Bend, ex, y_parent, String::new(), None, None);
            em.add_link(point_of_node[u], elbow_top);

            if (y_parent - y_child).abs() > EPS {
                let elbow_bot =
                    em.add_point(PointKind::Bend, ex, y_child, String::new(), None, None);
                em.add_link(elbow_top, elbow_bot);
                em.add_link(elbow_bot, child_pid);
            } else {
                em.add_link(elbow_top, child_pid);
            }

            links_created += 1;
            if links_created % link_stride == 0 {
                report(0.45 + 0.40 * (links_created as f64 / total_links as f64));
            }
        }
    }
    report(0.85);

    // 5. Aligned leaf markers on a shared right-edge tipline
    let leaves: Vec<NodeId> = (0..n).filter(|&u| tree.nodes()[u].is_leaf()).collect();
    let max_leaf_x = leaves
        .iter()
        .map(|&lf| em.points[point_of_node[lf] as usize].x)
        .fold(0.0f64, f64::max);
    let x_tipline = max_leaf_x + params.tip_pad;

    for &lf in &leaves {
        let leaf_pid = point_of_node[lf];
        let (leaf_y, leaf_label) = {
            let p = &em.points[leaf_pid as usize];
            (p.y, p.label.clone())
        };
        let pid = em.add_point(
            PointKind::LeafMarker,
            x_tipline,
            leaf_y,
            leaf_label,
            Some(COLOR_LEAF),
            Some(SIZE_LEAF_MARKER),
        );
        em.add_link(pid, leaf_pid);
    }
    report(0.95);

    let graph = VisualGraph {
        nodes: em.points,
        links: em.links,
    };
    report(1.0);
    graph
}

// Distinct raw stem x-values, ascending.
fn collect_raw_stems(dist_px: &[f64], parent_stub: f64) -> Vec<f64> {
    use itertools::Itertools;
    dist_px
        .iter()
        .map(|d| d + parent_stub)
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect()
}

// Sweep left-to-right: each stem sits at its raw x or min_level_gap right
// of its predecessor, whichever is farther. Keyed by the rounded raw value
// to dodge float-identity pitfalls on lookup.
fn spread_stems(raw_stems: &[f64], min_level_gap: f64) -> FxHashMap<u64, f64> {
    let mut map =
        FxHashMap::with_capacity_and_hasher(raw_stems.len(), Default::default());
    let mut last: Option<f64> = None;
    for &raw in raw_stems {
        let spread = match last {
            None => raw,
            Some(prev) => raw.max(prev + min_level_gap),
        };
        map.insert(q6(raw).to_bits(), spread);
        last = Some(spread);
    }
    map
}
