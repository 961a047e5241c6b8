use clap::*;
use treegl::libs::layout::LayoutParams;
use treegl::libs::pipeline;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("layout")
        .about("Lay out a Newick tree as a gzipped JSON graph payload")
        .after_help(
            r###"
Transforms a phylogenetic tree into a flat point/link table for a GPU
point-and-line renderer. Edges are routed orthogonally: a stub from the
parent, a vertical stem shared by its children, then a weighted horizontal
segment per child. Vertical stems are spread so none are closer than
--min-level-gap pixels.

Output is `{"nodes":[...],"links":[...]}`, UTF-8 JSON, gzip compressed.

Notes:
* `.gz` inputs are decompressed transparently.
* Multiple `;`-separated trees are unified under one synthetic root.
* Children are reordered by smallest reachable leaf label, which makes the
  drawing deterministic and reduces edge crossings.

Examples:
1. Lay out a tree with default geometry:
   treegl layout tests/newick/two.nwk -o graph.json.gz

2. Tighter horizontal scale, wider rows:
   treegl layout tests/newick/two.nwk --x-scale 70 --leaf-step 600 -o graph.json.gz
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
            Arg::new("x-scale")
                .long("x-scale")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("140")
                .help("px per branch-length unit"),
        )
        .arg(
            Arg::new("min-level-gap")
                .long("min-level-gap")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("56")
                .help("Min horizontal gap between adjacent vertical stems"),
        )
        .arg(
            Arg::new("leaf-step")
                .long("leaf-step")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("400")
                .help("Vertical spacing between consecutive leaves"),
        )
        .arg(
            Arg::new("parent-stub")
                .long("parent-stub")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("20")
                .help("Elbow stub length before the vertical stem"),
        )
        .arg(
            Arg::new("tip-pad")
                .long("tip-pad")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("40")
                .help("Extra space right of the farthest leaf for markers"),
        )
        .arg(
            Arg::new("weighted-stub")
                .long("weighted-stub")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("40")
                .help("Minimal horizontal stub to the weighted segment"),
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
    let infile = args.get_one::<String>("infile").unwrap();
    let text = treegl::libs::io::read_to_string(infile)?;

    let params = LayoutParams {
        x_scale: *args.get_one::<f64>("x-scale").unwrap(),
        min_level_gap: *args.get_one::<f64>("min-level-gap").unwrap(),
        leaf_step: *args.get_one::<f64>("leaf-step").unwrap(),
        parent_stub: *args.get_one::<f64>("parent-stub").unwrap(),
        tip_pad: *args.get_one::<f64>("tip-pad").unwrap(),
        weighted_stub: *args.get_one::<f64>("weighted-stub").unwrap(),
    };

    let writer = treegl::writer(args.get_one::<String>("outfile").unwrap());
    pipeline::run_to_sink(&text, &params, writer, &mut |stage, progress| {
        log::debug!("{} {:.1}%", stage.as_str(), progress);
    })?;

    Ok(())
}
