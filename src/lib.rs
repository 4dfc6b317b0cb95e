use std::fs;
use std::fs::File;
use std::io::Write;
use std::collections::BTreeSet;
use anyhow::{bail, Context, Result};
use log::info;

pub mod graph;
pub mod graph_algos;
pub mod scoring;
pub mod bridge;
pub mod contig_bridge;
pub mod loop_bridge;
pub mod long_read;
pub mod reads_io;
pub mod utils;

pub use graph::Graph;
pub use graph::Segment;
pub use graph::Vertex;
pub use graph::Link;
pub use graph::Direction;
pub use bridge::{Bridge, BridgeKind, LongReadSupport};
pub use contig_bridge::create_contig_bridges;
pub use loop_bridge::create_loop_unrolling_bridges;
pub use long_read::{create_long_read_bridges, collect_long_read_evidence, LongReadParams};

pub struct Config {
    pub graph_fn: String,
    pub single_copy_fn: String,
    pub reads_fn: Option<String>,
    pub alignments_fn: Option<String>,
    pub output_fn: Option<String>,
    pub long_read_params: LongReadParams,
}

/// One segment number per line, '#' starts a comment
pub fn parse_single_copy(single_copy_str: &str) -> Result<BTreeSet<usize>> {
    let mut single_copy = BTreeSet::new();
    for (line_no, line) in single_copy_str.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let number = line.parse()
            .with_context(|| format!("Invalid segment number '{}' on line {}", line, line_no + 1))?;
        single_copy.insert(number);
    }
    Ok(single_copy)
}

pub fn write_bridges(output: &mut impl Write, bridges: &[Bridge]) -> std::io::Result<()> {
    writeln!(output, "kind\tstart\tend\tpath\tquality\tdepth\tsequence_length")?;
    for b in bridges {
        writeln!(output, "{}\t{}\t{}\t{}\t{:.4}\t{:.2}\t{}",
            b.kind.short_name(),
            b.start_segment,
            b.end_segment,
            b.graph_path.iter().map(|v| v.to_string()).collect::<Vec<String>>().join(","),
            b.quality,
            b.depth,
            b.bridge_sequence.len())?;
    }
    Ok(())
}

/// Runs all bridge builders, returning bridges in descending quality order
pub fn run_bridging(config: &Config) -> Result<Vec<Bridge>> {
    info!("Reading graph from {:?}", config.graph_fn);
    let g = Graph::read(&fs::read_to_string(&config.graph_fn)
                .with_context(|| format!("Failed to read graph from {}", config.graph_fn))?)
            .with_context(|| format!("Failed to parse graph {}", config.graph_fn))?;

    info!("Graph read successfully");
    info!("Segment count: {}", g.segment_cnt());
    info!("Link count: {}", g.link_cnt());
    info!("Contig path count: {}", g.path_cnt());
    info!("Overlap: {}", g.overlap());

    info!("Reading single-copy segments from {}", config.single_copy_fn);
    let single_copy = parse_single_copy(&fs::read_to_string(&config.single_copy_fn)
                .with_context(|| format!("Failed to read {}", config.single_copy_fn))?)?;
    if let Some(&missing) = single_copy.iter().find(|&&n| !g.contains(n)) {
        bail!("Single-copy segment {} is not in the graph", missing);
    }
    info!("Single-copy segment count: {}", single_copy.len());

    let (contig_bridges, loop_bridges) = rayon::join(
        || create_contig_bridges(&g, &single_copy),
        || create_loop_unrolling_bridges(&g, &single_copy));
    let mut bridges = contig_bridges;
    bridges.extend(loop_bridges);

    match (&config.reads_fn, &config.alignments_fn) {
        (Some(reads_fn), Some(alignments_fn)) => {
            let (reads, read_names) = reads_io::load_reads(reads_fn, alignments_fn)?;
            let long_read_bridges = create_long_read_bridges(&g, &reads, &read_names,
                &single_copy, &bridges, &config.long_read_params);
            bridges.extend(long_read_bridges);
        }
        (None, None) => info!("No long reads provided"),
        _ => bail!("Reads and alignments should be provided together"),
    }

    bridge::sort_by_quality(&mut bridges);
    info!("Total bridge count: {}", bridges.len());

    if let Some(output) = &config.output_fn {
        info!("Writing bridges to {}", output);
        let mut output = File::create(output)
            .with_context(|| format!("Failed to create {}", output))?;
        write_bridges(&mut output, &bridges)?;
    }

    info!("All done");
    Ok(bridges)
}
