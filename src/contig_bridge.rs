use crate::bridge::*;
use crate::graph::*;
use crate::scoring::*;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// True if the path segments are connected only to each other and to start/end segments
pub fn is_self_contained(path: &[Vertex], start: Vertex, end: Vertex, g: &Graph) -> bool {
    let all_numbers_in_path: HashSet<usize> = path.iter()
        .map(|v| v.number)
        .chain([start.number, end.number])
        .collect();
    path.iter().all(|&v| g.get_connected_segments(v)
                          .iter()
                          .all(|n| all_numbers_in_path.contains(n)))
}

/// All parts of the path starting on the segment and ending on (any) single-copy segment
pub fn find_contig_bridges(segment_num: usize, path: &[Vertex],
    single_copy: &BTreeSet<usize>) -> Vec<Vec<Vertex>> {
    let mut bridge_paths = Vec::new();
    for (i, _) in path.iter().enumerate().filter(|(_, v)| v.number == segment_num) {
        if let Some(pos) = path[(i + 1)..].iter().position(|w| single_copy.contains(&w.number)) {
            bridge_paths.push(path[i..=(i + 1 + pos)].to_vec());
        }
    }
    bridge_paths
}

//at most one of path and its reverse complement ends up in the set
fn add_canonical(bridge_path_set: &mut HashSet<Vec<Vertex>>, bridge_path: Vec<Vertex>) {
    let flipped = rc_path(&bridge_path);
    if bridge_path_set.contains(&bridge_path) || bridge_path_set.contains(&flipped) {
        return;
    }
    let both_reverse = !bridge_path[0].is_forward()
                        && !bridge_path[bridge_path.len() - 1].is_forward();
    if both_reverse {
        bridge_path_set.insert(flipped);
    } else {
        bridge_path_set.insert(bridge_path);
    }
}

fn candidate_paths(g: &Graph, single_copy: &BTreeSet<usize>) -> Vec<Vec<Vertex>> {
    let mut bridge_path_set = HashSet::new();
    for &segment_num in single_copy {
        for path in g.contig_paths() {
            let flipped_path = rc_path(path);
            for bridge_path in find_contig_bridges(segment_num, path, single_copy).into_iter()
                    .chain(find_contig_bridges(segment_num, &flipped_path, single_copy)) {
                add_canonical(&mut bridge_path_set, bridge_path);
            }
        }
    }
    let mut bridge_paths: Vec<Vec<Vertex>> = bridge_path_set.into_iter().collect();
    bridge_paths.sort();
    bridge_paths
}

/// Indices of paths sharing a start or an end (directly or via reverse complement) with
/// some other path. Such paths contradict the single-copy status of the shared segment.
pub fn conflicting_paths(bridge_paths: &[Vec<Vertex>]) -> BTreeSet<usize> {
    let mut by_start: HashMap<Vertex, Vec<usize>> = HashMap::new();
    let mut by_end: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, path) in bridge_paths.iter().enumerate() {
        let start = path[0];
        let end = path[path.len() - 1];
        by_start.entry(start).or_default().push(i);
        by_end.entry(end).or_default().push(i);
        by_start.entry(end.rc()).or_default().push(i);
        by_end.entry(start.rc()).or_default().push(i);
    }

    let mut conflicting = BTreeSet::new();
    for mut grouped in by_start.into_values().chain(by_end.into_values()) {
        grouped.sort_unstable();
        grouped.dedup();
        if grouped.len() > 1 {
            conflicting.extend(grouped);
        }
    }
    conflicting
}

fn paths_str(paths: &[&Vec<Vertex>]) -> String {
    if paths.is_empty() {
        String::from("none")
    } else {
        paths.iter().map(|p| format!("[{}]", path_str(p))).collect::<Vec<String>>().join(", ")
    }
}

/// Builds bridges from contig paths stored in the graph
pub fn create_contig_bridges(g: &Graph, single_copy: &BTreeSet<usize>) -> Vec<Bridge> {
    info!("Bridging graph with contig paths");
    let bridge_paths = candidate_paths(g, single_copy);
    let conflicting = conflicting_paths(&bridge_paths);

    debug!("Bridge paths in conflict with single-copy segments: {}",
        paths_str(&conflicting.iter().map(|&i| &bridge_paths[i]).collect::<Vec<_>>()));

    let final_bridge_paths: Vec<&Vec<Vertex>> = bridge_paths.iter().enumerate()
        .filter(|(i, _)| !conflicting.contains(i))
        .map(|(_, p)| p)
        .collect();
    debug!("Final contig bridge paths: {}", paths_str(&final_bridge_paths));

    let bridges: Vec<Bridge> = final_bridge_paths.into_iter()
        .map(|p| contig_bridge(g, p))
        .collect();
    info!("Created {} contig bridges ({} candidate paths, {} in conflict)",
        bridges.len(), bridge_paths.len(), conflicting.len());
    bridges
}

//first and last vertices of the contig path are the bridged segments
fn contig_bridge(g: &Graph, contig_path: &[Vertex]) -> Bridge {
    assert!(contig_path.len() > 1);
    let start_segment = contig_path[0];
    let end_segment = contig_path[contig_path.len() - 1];
    let graph_path = contig_path[1..(contig_path.len() - 1)].to_vec();
    let start_seg = g.segment(start_segment.number);
    let end_seg = g.segment(end_segment.number);

    //squared effect on quality
    let depth_agreement = numeric_agreement(start_seg.depth, end_seg.depth);
    let mut quality = CONTIG_BRIDGE_BASE_QUALITY * depth_agreement * depth_agreement;
    let depth = mean_depth(g, start_seg, end_seg);

    //segment traversed k times by the bridge should have about k times the bridge depth
    if is_self_contained(&graph_path, start_segment, end_segment, g) {
        let mut occurrences: BTreeMap<usize, usize> = BTreeMap::new();
        for v in &graph_path {
            *occurrences.entry(v.number).or_insert(0) += 1;
        }
        for (number, cnt) in occurrences {
            let actual_depth = g.segment(number).depth;
            let expected_depth = cnt as f64 * depth;
            quality *= numeric_agreement(actual_depth, expected_depth);
        }
    }

    let bridge = Bridge {
        start_segment,
        end_segment,
        bridge_sequence: g.get_path_sequence(&graph_path),
        graph_path,
        depth,
        quality,
        kind: BridgeKind::Contig,
    };
    debug!("{}", bridge);
    bridge
}
