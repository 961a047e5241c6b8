extern crate clap;
use clap::*;

mod cmd_treegl;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let app = Command::new("treegl")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`treegl` - Newick trees to GPU-ready orthogonal graph layouts")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_treegl::layout::make_subcommand())
        .subcommand(cmd_treegl::build::make_subcommand())
        .subcommand(cmd_treegl::stat::make_subcommand())
        .after_help(
            r###"
Turns phylogenetic trees (Newick) into flat point/link tables with
orthogonal (Manhattan) edge routing, ready for GPU point-and-line
renderers.

Subcommands:

* layout - one-shot compute, gzipped JSON out
* build  - background job with progress events
* stat   - tree statistics

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("layout", sub_matches)) => cmd_treegl::layout::execute(sub_matches),
        Some(("build", sub_matches)) => cmd_treegl::build::execute(sub_matches),
        Some(("stat", sub_matches)) => cmd_treegl::stat::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
