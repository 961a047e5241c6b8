use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use super::VisualGraph;

/// Records per batch between progress posts and scheduler yields.
pub const BATCH_SIZE: usize = 50_000;

/// Stream the graph as gzip-compressed `{"nodes":[…],"links":[…]}` JSON
/// into `sink`. The full JSON string is never materialized; records go
/// through the compressor one batch at a time.
///
/// `report` receives percentages in `[0, 100]`: nodes fill 0–50, links
/// 50–100.
pub fn write_graph_gz<W: Write>(
    graph: &VisualGraph,
    sink: W,
    report: &mut dyn FnMut(f64),
) -> anyhow::Result<()> {
    let mut gz = GzEncoder::new(sink, Compression::default());

    gz.write_all(b"{\"nodes\":[")?;
    write_records(&mut gz, &graph.nodes, 0.0, report)?;
    gz.write_all(b"],\"links\":[")?;
    write_records(&mut gz, &graph.links, 50.0, report)?;
    gz.write_all(b"]}")?;

    let mut inner = gz.finish()?;
    inner.flush()?;
    Ok(())
}

// Comma between records, never trailing. At batch boundaries the writer
// posts progress and yields so a subscriber thread can drain events.
fn write_records<W: Write, T: Serialize>(
    w: &mut W,
    records: &[T],
    base: f64,
    report: &mut dyn FnMut(f64),
) -> anyhow::Result<()> {
    let total = records.len().max(1);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        serde_json::to_writer(&mut *w, record)?;

        if (i + 1) % BATCH_SIZE == 0 {
            report(base + 50.0 * ((i + 1) as f64 / total as f64));
            std::thread::yield_now();
        }
    }
    report(base + 50.0);
    Ok(())
}
