use std::env;
use std::process;
use bridger::{Config, LongReadParams};
#[macro_use]
extern crate log;
use env_logger::{Env, Builder, Target};
use clap::Parser;

/// Bridging single-copy segments of an assembly graph
#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    /// GFA file (contig paths as P lines)
    graph: String,

    /// File with single-copy segment numbers (one per line)
    #[clap(short, long)]
    single_copy: String,

    /// Long reads FASTA
    #[clap(short, long)]
    reads: Option<String>,

    /// Long read alignments to graph segments (PAF)
    #[clap(short, long)]
    alignments: Option<String>,

    /// Minimal scaled score of alignment to a single-copy segment
    #[clap(long, default_value_t = 75.)]
    min_scaled_score: f64,

    /// Minimal number of reads spanning a long read bridge
    #[clap(long, default_value_t = 1)]
    min_bridge_reads: usize,

    /// Bridges output file (TSV)
    #[clap(short, long)]
    output: Option<String>,
}

fn main() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.target(Target::Stdout);
    builder.init();
    info!("Starting up");

    info!("Cmd arguments: {:?}", env::args());

    let args = Args::parse();

    let config = Config {
        graph_fn: args.graph,
        single_copy_fn: args.single_copy,
        reads_fn: args.reads,
        alignments_fn: args.alignments,
        output_fn: args.output,
        long_read_params: LongReadParams {
            min_scaled_score: args.min_scaled_score,
            min_bridge_reads: args.min_bridge_reads,
        },
    };

    match bridger::run_bridging(&config) {
        Ok(bridges) => {
            for b in &bridges {
                debug!("{}", b);
            }
            info!("Success")
        }
        Err(e) => {
            error!("Some error happened {:#}", e);
            process::exit(1);
        }
    }
}
