use crate::bridge::*;
use crate::graph::*;
use crate::graph_algos::simple_loop::SimpleLoop;
use crate::scoring::*;
use log::{debug, info};
use std::collections::BTreeSet;

//A simple loop is either a repeat within one sequence or a separate circular sequence
//(e.g. plasmid) sharing the repeat. Only the former can be unrolled, which is indicated by
//a contig path containing the middle segment together with the loop start or end.
fn is_corroborated(g: &Graph, simple_loop: &SimpleLoop) -> bool {
    let joins_middle = |path: &[Vertex]| {
        path.contains(&simple_loop.middle)
            && (path.contains(&simple_loop.start) || path.contains(&simple_loop.end))
    };
    g.contig_paths().any(|path| joins_middle(path.as_slice())
                                 || joins_middle(rc_path(path).as_slice()))
}

/// Loop count and closeness to a whole number (1 for a whole number, 0 half way between).
/// Estimates below one give a single traversal with the estimate as closeness.
pub fn estimate_loop_count(mean_loop_count: f64) -> (usize, f64) {
    if mean_loop_count < 1. {
        (1, mean_loop_count.clamp(0., 1.))
    } else {
        let fractional_part = mean_loop_count % 1.;
        let distance_from_whole_num = fractional_part.min(1. - fractional_part);
        (mean_loop_count.round() as usize, 1. - 2. * distance_from_whole_num)
    }
}

/// Builds bridges across simple loops supported by contig paths
pub fn create_loop_unrolling_bridges(g: &Graph, single_copy: &BTreeSet<usize>) -> Vec<Bridge> {
    info!("Bridging graph with simple loops");
    let mut bridges = Vec::new();
    let simple_loops = g.find_all_simple_loops();

    for simple_loop in &simple_loops {
        if !is_corroborated(g, simple_loop) {
            debug!("Loop through {} not supported by any contig path, skipping", simple_loop.middle);
            continue;
        }
        for anchor in [simple_loop.start, simple_loop.end] {
            if !single_copy.contains(&anchor.number) {
                debug!("Loop anchor {} is not among single-copy segments", anchor);
            }
        }
        let bridge = loop_unrolling_bridge(g, simple_loop);
        debug!("{}", bridge);
        bridges.push(bridge);
    }

    info!("Created {} loop unrolling bridges ({} simple loops)", bridges.len(), simple_loops.len());
    bridges
}

fn loop_unrolling_bridge(g: &Graph, simple_loop: &SimpleLoop) -> Bridge {
    //simple loop has no directionality
    let start_seg = g.segment(simple_loop.start.number);
    let end_seg = g.segment(simple_loop.end.number);
    let middle_seg = g.segment(simple_loop.middle.number);
    let repeat_seg = g.segment(simple_loop.repeat.number);

    //squared effect on quality
    let depth_agreement = numeric_agreement(start_seg.depth, end_seg.depth);
    let mut quality = LOOP_UNROLLING_BASE_QUALITY * depth_agreement * depth_agreement;

    let depth = mean_depth(g, start_seg, end_seg);
    assert!(depth > 0., "Zero depth of loop anchors {} and {}", simple_loop.start, simple_loop.end);
    //repeat is traversed once more than the middle
    let loop_count_by_middle = middle_seg.depth / depth;
    let loop_count_by_repeat = (repeat_seg.depth - depth) / depth;
    let mean_loop_count = weighted_average(loop_count_by_middle, loop_count_by_repeat,
                                           middle_seg.length_no_overlap(g.overlap()) as f64,
                                           repeat_seg.length_no_overlap(g.overlap()) as f64);

    let (loop_count, closeness_to_whole_num) = estimate_loop_count(mean_loop_count);
    quality *= closeness_to_whole_num;

    //higher counts are harder to call
    quality *= (1. / loop_count as f64).sqrt();

    let mut graph_path = vec![simple_loop.repeat];
    for _ in 0..loop_count {
        graph_path.push(simple_loop.middle);
        graph_path.push(simple_loop.repeat);
    }

    Bridge {
        start_segment: simple_loop.start,
        end_segment: simple_loop.end,
        bridge_sequence: g.get_path_sequence(&graph_path),
        graph_path,
        depth,
        quality,
        kind: BridgeKind::LoopUnrolling,
    }
}
