use std::io::Write;

use serde::Serialize;

use crate::libs::graph::{remap_dense, serialize::write_graph_gz, VisualGraph};
use crate::libs::layout::{build_display_graph, LayoutParams};
use crate::libs::newick::{parse_newick, ParseError, ParseOptions};

/// Safety cap on parsed nodes; a soft cutoff, not an error.
pub const MAX_NODES: usize = 100_000_000_000;

/// Pipeline stage names as they appear in progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Reading,
    Parsing,
    Layout,
    Optimization,
    Compressing,
    Complete,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Reading => "reading",
            Stage::Parsing => "parsing",
            Stage::Layout => "layout",
            Stage::Optimization => "optimization",
            Stage::Compressing => "compressing",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }
}

/// Parse and lay out Newick text, mapping sub-stage fractions onto the
/// job-level progress scale: parsing 10–25, layout 25–100.
pub fn build_graph(
    text: &str,
    params: &LayoutParams,
    report: &mut dyn FnMut(Stage, f64),
) -> Result<VisualGraph, ParseError> {
    report(Stage::Parsing, 10.0);
    let opts = ParseOptions {
        limit: Some(MAX_NODES),
    };
    let tree = parse_newick(text, &opts, &mut |p| {
        report(Stage::Parsing, 10.0 + p * 15.0)
    })?;

    report(Stage::Layout, 25.0);
    let graph = build_display_graph(tree, params, &mut |p| {
        report(Stage::Layout, 25.0 + p * 75.0)
    });
    Ok(graph)
}

/// The whole compute: parse, lay out, remap to dense integer ids, stream
/// the compressed payload into `sink`. The `compressing` stage reports on
/// its own 0–100 scale.
pub fn run_to_sink<W: Write>(
    text: &str,
    params: &LayoutParams,
    sink: W,
    report: &mut dyn FnMut(Stage, f64),
) -> anyhow::Result<()> {
    let mut graph = build_graph(text, params, report)?;

    report(Stage::Optimization, 99.0);
    remap_dense(&mut graph);

    report(Stage::Compressing, 0.0);
    write_graph_gz(&graph, sink, &mut |p| report(Stage::Compressing, p))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stages = vec![];
        let mut out = Vec::new();
        run_to_sink(
            "(A:1,B:2);",
            &LayoutParams::default(),
            &mut out,
            &mut |stage, _| {
                if stages.last() != Some(&stage) {
                    stages.push(stage);
                }
            },
        )
        .unwrap();

        assert_eq!(
            stages,
            vec![
                Stage::Parsing,
                Stage::Layout,
                Stage::Optimization,
                Stage::Compressing
            ]
        );
        assert!(!out.is_empty());
    }

    #[test]
    fn test_malformed_input_bubbles() {
        let res = build_graph("(A,B", &LayoutParams::default(), &mut |_, _| {});
        let err = res.err().unwrap();
        assert!(err.to_string().contains("MalformedInput"));
    }

    #[test]
    fn test_empty_tree_bubbles() {
        let res = build_graph("   ", &LayoutParams::default(), &mut |_, _| {});
        assert!(matches!(res, Err(ParseError::EmptyTree)));
    }

    #[test]
    fn test_stage_json_names() {
        assert_eq!(
            serde_json::to_string(&Stage::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(Stage::Error.as_str(), "error");
        assert!(Stage::Error.is_terminal());
        assert!(!Stage::Compressing.is_terminal());
    }
}
