use clap::*;
use itertools::Itertools;
use std::io::Write;

use treegl::libs::newick::{parse_newick, ParseOptions};
use treegl::libs::tree::algo;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("stat")
        .about("Prints statistics about a Newick tree")
        .after_help(
            r###"
Prints information about the parsed tree.

Output format:
* Key-value pairs (TSV):
  nodes	7
  leaves	4
  polytomies	0
  depth	3
  total branch length	5.5
  max distance	2.5

Examples:
1. Default statistics:
   treegl stat tests/newick/poly.nwk

2. Output to file:
   treegl stat tests/newick/poly.nwk -o stats.tsv
"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input filename. [stdin] for standard input"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = treegl::writer(args.get_one::<String>("outfile").unwrap());

    let infile = args.get_one::<String>("infile").unwrap();
    let text = treegl::libs::io::read_to_string(infile)?;
    let tree = parse_newick(&text, &ParseOptions::default(), &mut |_| {})?;

    let root = match tree.get_root() {
        Some(root) => root,
        None => anyhow::bail!("tree has no root"),
    };

    let mut n_leaf = 0;
    let mut n_polytomy = 0;
    let mut total_len = 0.0;
    for node in tree.nodes() {
        if node.is_leaf() {
            n_leaf += 1;
        }
        if node.children.len() > 2 {
            n_polytomy += 1;
        }
        total_len += node.length;
    }

    // Edge count from the root to the deepest node
    let depth = {
        let mut depth = vec![0usize; tree.len()];
        let mut max_depth = 0;
        for id in tree.preorder(root) {
            if let Some(parent) = tree.nodes()[id].parent {
                depth[id] = depth[parent] + 1;
                max_depth = max_depth.max(depth[id]);
            }
        }
        max_depth
    };

    let dist = algo::cumulative_distance(&tree, root);
    let max_dist = dist
        .iter()
        .copied()
        .sorted_by(f64::total_cmp)
        .next_back()
        .unwrap_or(0.0);

    writer.write_fmt(format_args!("nodes\t{}\n", tree.len()))?;
    writer.write_fmt(format_args!("leaves\t{}\n", n_leaf))?;
    writer.write_fmt(format_args!("polytomies\t{}\n", n_polytomy))?;
    writer.write_fmt(format_args!("depth\t{}\n", depth))?;
    writer.write_fmt(format_args!("total branch length\t{}\n", total_len))?;
    writer.write_fmt(format_args!("max distance\t{}\n", max_dist))?;

    Ok(())
}
