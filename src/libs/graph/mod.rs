pub mod serialize;

use fxhash::FxHashMap;
use serde::Serialize;

/// Endpoint id recorded when a link refers to a point that does not exist.
/// Broken links are retained, not dropped.
pub const BROKEN_ENDPOINT: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Leaf,
    LeafMarker,
    Internal,
    Bend,
}

/// One renderable point. Field order is the serialized column order.
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: &'static str,
    pub label: String,
    pub kind: PointKind,
}

/// One directed edge between point ids.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub source: i64,
    pub target: i64,
    pub color: &'static str,
}

/// The two append-only output tables of a layout run.
#[derive(Debug, Default, Clone)]
pub struct VisualGraph {
    pub nodes: Vec<Point>,
    pub links: Vec<Link>,
}

/// Rewrite the id columns into a dense integer namespace sequential from
/// zero. The layout engine already emits dense ids, but ids arriving from
/// external producers may be sparse or shuffled; link endpoints that fail
/// lookup become [`BROKEN_ENDPOINT`].
pub fn remap_dense(graph: &mut VisualGraph) {
    let mut id_map: FxHashMap<i64, i64> =
        FxHashMap::with_capacity_and_hasher(graph.nodes.len(), Default::default());
    for (i, point) in graph.nodes.iter_mut().enumerate() {
        id_map.insert(point.id, i as i64);
        point.id = i as i64;
    }

    for link in &mut graph.links {
        link.source = id_map.get(&link.source).copied().unwrap_or(BROKEN_ENDPOINT);
        link.target = id_map.get(&link.target).copied().unwrap_or(BROKEN_ENDPOINT);
    }
}
