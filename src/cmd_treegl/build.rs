use clap::*;
use std::io::Write;

use treegl::libs::jobs::{cache::ResultCache, JobResult, Orchestrator};
use treegl::libs::layout::LayoutParams;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("build")
        .about("Run a layout build as a background job with progress events")
        .after_help(
            r###"
Runs the compute pipeline on a dedicated worker thread, the way the
background service does: the job is registered under a fresh id, progress
events stream as they are published, and the compressed payload is fetched
once the terminal event arrives.

Progress events are printed to stderr in server-push wire form:
  data: {"stage":"layout","progress":62.5}

Stages: reading, parsing, layout, optimization, compressing, complete /
error. Progress within a stage may regress slightly under pressure;
the terminal event always arrives.

Examples:
1. Build with progress:
   treegl build tests/newick/two.nwk -o graph.json.gz

2. Reuse cached results across identical inputs:
   treegl build tree.nwk --cache ~/.cache/treegl -o graph.json.gz
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
            Arg::new("cache")
                .long("cache")
                .num_args(1)
                .help("Directory of the result cache"),
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

    let mut orch = Orchestrator::new(LayoutParams::default());
    if let Some(dir) = args.get_one::<String>("cache") {
        orch = orch.with_cache(ResultCache::open(dir)?);
    }

    let job_id = orch.start(treegl::reader(infile))?;

    if let Some(stream) = orch.subscribe(&job_id) {
        for event in stream {
            eprint!("{}", event.to_sse());
        }
    }

    match orch.result(&job_id) {
        JobResult::Ready(bytes) => {
            let mut writer = treegl::writer(args.get_one::<String>("outfile").unwrap());
            writer.write_all(&bytes)?;
            writer.flush()?;
            Ok(())
        }
        JobResult::Failed(message) => anyhow::bail!("job failed: {}", message),
        JobResult::NotReady => anyhow::bail!("job not ready"),
        JobResult::NotFound => anyhow::bail!("job not found"),
    }
}
