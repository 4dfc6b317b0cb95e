use crate::bridge::*;
use crate::graph::*;
use crate::scoring::*;
use crate::utils::reverse_complement;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

//existing bridge path is reused when its sequence length agrees with read consensus
const EXISTING_PATH_MIN_AGREEMENT: f64 = 0.9;

/// Alignment of a read to a graph segment.
/// Read coordinates are 0-based half-open on the forward strand of the read.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub ref_number: usize,
    pub strand: Direction,
    pub raw_score: i64,
    pub scaled_score: f64,
    pub read_length: usize,
    pub read_start: usize,
    pub read_end: usize,
    pub ref_length: usize,
    //unaligned reference bases before and after the alignment
    pub ref_start_pos: usize,
    pub ref_end_gap: usize,
}

impl Alignment {
    /// Reference number signed by the alignment strand
    pub fn signed_ref(&self) -> Vertex {
        Vertex {number: self.ref_number, direction: self.strand}
    }

    pub fn aligned_ref_length(&self) -> usize {
        self.ref_length.saturating_sub(self.ref_start_pos + self.ref_end_gap)
    }

    pub fn read_start_positive_strand(&self) -> usize {
        self.read_start
    }

    pub fn read_end_positive_strand(&self) -> usize {
        self.read_end
    }

    //unaligned reference bases on the side of the read start / read end
    fn ref_left_on_read_start_side(&self) -> usize {
        match self.strand {
            Direction::FORWARD => self.ref_start_pos,
            Direction::REVERSE => self.ref_end_gap,
        }
    }

    fn ref_left_on_read_end_side(&self) -> usize {
        match self.strand {
            Direction::FORWARD => self.ref_end_gap,
            Direction::REVERSE => self.ref_start_pos,
        }
    }

    /// Read bases before the alignment which extend past the segment boundary
    pub fn start_overlapping_read_seq<'s>(&self, read_seq: &'s str) -> &'s str {
        let overhang = self.read_start.saturating_sub(self.ref_left_on_read_start_side());
        read_seq.get(..overhang).unwrap_or("")
    }

    /// Read bases after the alignment which extend past the segment boundary
    pub fn end_overlapping_read_seq<'s>(&self, read_seq: &'s str) -> &'s str {
        let overhang_start = self.read_end + self.ref_left_on_read_end_side();
        read_seq.get(overhang_start..).unwrap_or("")
    }
}

#[derive(Clone, Debug)]
pub struct Read {
    pub name: String,
    pub sequence: String,
    pub alignments: Vec<Alignment>,
}

pub type ReadStore = HashMap<String, Read>;

#[derive(Clone, Debug)]
pub struct LongReadParams {
    pub min_scaled_score: f64,
    pub min_bridge_reads: usize,
}

impl Default for LongReadParams {
    fn default() -> Self {
        LongReadParams {
            min_scaled_score: 75.,
            min_bridge_reads: 1,
        }
    }
}

/// Part of the read between two single-copy alignments
#[derive(Clone, Debug, PartialEq)]
pub enum ReadSpan {
    Sequence(String),
    //alignments overlap (negative) or abut (zero)
    Overlap(i64),
}

impl ReadSpan {
    pub fn length(&self) -> i64 {
        match self {
            Self::Sequence(seq) => seq.len() as i64,
            Self::Overlap(len) => *len,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpanningRead<'a> {
    pub read_name: &'a str,
    pub span: ReadSpan,
    pub first: &'a Alignment,
    pub second: &'a Alignment,
}

#[derive(Default)]
pub struct LongReadEvidence<'a> {
    //keyed by canonical pair of signed single-copy segments
    pub spanning: BTreeMap<(Vertex, Vertex), Vec<SpanningRead<'a>>>,
    //read sequence extending past the end of the segment (in segment orientation)
    pub overlapping: HashMap<Vertex, Vec<String>>,
}

#[derive(Default)]
struct ReadEvidence<'a> {
    spanning: Vec<((Vertex, Vertex), SpanningRead<'a>)>,
    overlapping: Vec<(Vertex, String)>,
}

/// Chooses one of the equivalent (a, b) / (-b, -a) representations so that read sequences
/// collected for a pair of segments always come in the same direction.
/// Returns the pair and whether it was flipped.
pub fn flip_segment_order(seg_1: Vertex, seg_2: Vertex) -> ((Vertex, Vertex), bool) {
    let flip = match (seg_1.direction, seg_2.direction) {
        (Direction::FORWARD, Direction::FORWARD) => false,
        (Direction::REVERSE, Direction::REVERSE) => true,
        (Direction::REVERSE, Direction::FORWARD) => seg_1.number > seg_2.number,
        (Direction::FORWARD, Direction::REVERSE) => seg_2.number > seg_1.number,
    };
    if flip {
        ((seg_2.rc(), seg_1.rc()), true)
    } else {
        ((seg_1, seg_2), false)
    }
}

/// Read alignments to single-copy segments passing the score threshold.
///
/// Two alignments to the same single-copy segment usually mean that one is bogus and only the
/// best one is kept. The exception is a circular sequence where the read covers both ends of
/// the segment: the second best is kept if the alignments fit in the segment and cover its
/// opposite ends.
pub fn get_single_copy_alignments<'a>(g: &Graph, read: &'a Read, single_copy: &BTreeSet<usize>,
    allowed_overlap: usize, min_scaled_score: f64) -> Vec<&'a Alignment> {
    let mut sc_alignments: BTreeMap<usize, Vec<&Alignment>> = BTreeMap::new();
    for alignment in &read.alignments {
        if single_copy.contains(&alignment.ref_number) && alignment.scaled_score >= min_scaled_score {
            sc_alignments.entry(alignment.ref_number).or_default().push(alignment);
        }
    }

    let mut final_alignments = Vec::new();
    for (ref_number, mut alignments) in sc_alignments {
        alignments.sort_by(|a, b| b.scaled_score.partial_cmp(&a.scaled_score)
                                    .unwrap_or(Ordering::Equal));
        let best = alignments[0];
        final_alignments.push(best);

        if let Some(&second) = alignments.get(1) {
            let combined_len = best.aligned_ref_length() + second.aligned_ref_length();
            if combined_len <= g.segment(ref_number).length + allowed_overlap
                && ((best.ref_start_pos > 0 && second.ref_end_gap > 0)
                    || (best.ref_end_gap > 0 && second.ref_start_pos > 0)) {
                final_alignments.push(second);
            }
        }
    }
    final_alignments
}

fn read_evidence<'a>(g: &Graph, read: &'a Read, single_copy: &BTreeSet<usize>,
    allowed_overlap: usize, min_scaled_score: f64) -> ReadEvidence<'a> {
    let mut evidence = ReadEvidence::default();
    let mut sorted_alignments = get_single_copy_alignments(g, read, single_copy,
                                                           allowed_overlap, min_scaled_score);
    if sorted_alignments.is_empty() {
        return evidence;
    }
    trace!("Read {}: {} single-copy alignments", read.name, sorted_alignments.len());

    //strongest alignments establish pairs first, weaker ones can only add pairs
    //with their neighbours
    sorted_alignments.sort_by(|a, b| b.raw_score.cmp(&a.raw_score));
    let mut already_added = HashSet::new();
    let mut available: Vec<&Alignment> = Vec::new();
    for alignment in sorted_alignments {
        available.push(alignment);
        available.sort_by_key(|a| a.read_start_positive_strand());
        for pair in available.windows(2) {
            let (alignment_1, alignment_2) = (pair[0], pair[1]);
            let (seg_nums, flipped) = flip_segment_order(alignment_1.signed_ref(),
                                                         alignment_2.signed_ref());
            if !already_added.insert(seg_nums) {
                continue;
            }
            let bridge_start = alignment_1.read_end_positive_strand();
            let bridge_end = alignment_2.read_start_positive_strand();
            let span = if bridge_end > bridge_start {
                let seq = &read.sequence[bridge_start..bridge_end];
                ReadSpan::Sequence(if flipped { reverse_complement(seq) } else { String::from(seq) })
            } else {
                ReadSpan::Overlap(bridge_end as i64 - bridge_start as i64)
            };
            trace!("Read {} spans {} -> {} ({} bp)", read.name, seg_nums.0, seg_nums.1, span.length());
            evidence.spanning.push((seg_nums, SpanningRead {
                read_name: &read.name,
                span,
                first: alignment_1,
                second: alignment_2,
            }));
        }
    }

    //first and last alignments may be the same one
    let first_alignment = available[0];
    let start_overlap = first_alignment.start_overlapping_read_seq(&read.sequence);
    if !start_overlap.is_empty() {
        evidence.overlapping.push((first_alignment.signed_ref().rc(), reverse_complement(start_overlap)));
    }
    let last_alignment = available[available.len() - 1];
    let end_overlap = last_alignment.end_overlapping_read_seq(&read.sequence);
    if !end_overlap.is_empty() {
        evidence.overlapping.push((last_alignment.signed_ref(), String::from(end_overlap)));
    }
    evidence
}

/// Collects read sequences spanning pairs of single-copy segments and read sequences
/// extending past a single single-copy segment.
/// Each read contributes at most once to any pair.
pub fn collect_long_read_evidence<'a>(g: &Graph, reads: &'a ReadStore, read_names: &[String],
    single_copy: &BTreeSet<usize>, min_scaled_score: f64) -> LongReadEvidence<'a> {
    let allowed_overlap = (1.1 * g.overlap() as f64).round() as usize;

    let per_read: Vec<ReadEvidence<'a>> = read_names.par_iter()
        .filter_map(|name| match reads.get(name) {
            Some(read) => Some(read_evidence(g, read, single_copy, allowed_overlap, min_scaled_score)),
            None => {
                warn!("Read {} is missing from the read store", name);
                None
            }
        })
        .collect();

    let mut evidence = LongReadEvidence::default();
    for read_evidence in per_read {
        for (seg_nums, spanning_read) in read_evidence.spanning {
            evidence.spanning.entry(seg_nums).or_default().push(spanning_read);
        }
        for (seg_num, seq) in read_evidence.overlapping {
            evidence.overlapping.entry(seg_num).or_default().push(seq);
        }
    }
    evidence
}

fn lower_median(values: &[i64]) -> i64 {
    assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted[(sorted.len() - 1) / 2]
}

//read span closest to the median length when most reads have a sequence,
//mean (non-positive) length otherwise
fn consensus(spanning: &[SpanningRead]) -> (String, f64) {
    let lengths: Vec<i64> = spanning.iter().map(|s| s.span.length()).collect();
    let median = lower_median(&lengths);
    if median > 0 {
        let closest = spanning.iter()
            .filter_map(|s| match &s.span {
                ReadSpan::Sequence(seq) => Some(seq),
                ReadSpan::Overlap(_) => None,
            })
            .min_by_key(|seq| (seq.len() as i64 - median).abs());
        if let Some(seq) = closest {
            return (seq.clone(), seq.len() as f64);
        }
    }
    let non_positive: Vec<i64> = lengths.into_iter().filter(|&l| l <= 0).collect();
    (String::new(), non_positive.iter().sum::<i64>() as f64 / non_positive.len() as f64)
}

fn matching_existing_path(existing_bridges: &[Bridge], start: Vertex, end: Vertex,
    consensus_length: f64) -> Option<(Vec<Vertex>, String)> {
    existing_bridges.iter()
        .filter_map(|b| b.path_between(start, end))
        .find(|(_, seq)| if consensus_length <= 0. {
            seq.is_empty()
        } else {
            numeric_agreement(seq.len() as f64, consensus_length) >= EXISTING_PATH_MIN_AGREEMENT
        })
}

fn long_read_bridge(g: &Graph, start: Vertex, end: Vertex, spanning: &[SpanningRead],
    overlapping: &HashMap<Vertex, Vec<String>>, existing_bridges: &[Bridge]) -> Bridge {
    let start_seg = g.segment(start.number);
    let end_seg = g.segment(end.number);

    let (consensus_sequence, consensus_length) = consensus(spanning);
    let read_lengths: Vec<i64> = spanning.iter().map(|s| s.span.length()).collect();

    //squared effect on quality
    let depth_agreement = numeric_agreement(start_seg.depth, end_seg.depth);
    let mut quality = LONG_READ_BASE_QUALITY * depth_agreement * depth_agreement;
    //more reads -- more confidence, approaching (never reaching) the base quality
    quality *= 1. - 0.5f64.powi(spanning.len() as i32);
    //reads should agree on the bridge length
    let length_agreement = read_lengths.iter()
        .map(|&l| numeric_agreement(l as f64, consensus_length))
        .sum::<f64>() / read_lengths.len() as f64;
    quality *= length_agreement;

    let (graph_path, bridge_sequence) =
        match matching_existing_path(existing_bridges, start, end, consensus_length) {
            Some((path, seq)) => {
                debug!("Long read bridge {} -> {} follows existing path [{}]", start, end, path_str(&path));
                (path, seq)
            }
            None => (Vec::new(), consensus_sequence),
        };

    Bridge {
        start_segment: start,
        end_segment: end,
        graph_path,
        bridge_sequence,
        depth: mean_depth(g, start_seg, end_seg),
        quality,
        kind: BridgeKind::LongRead(LongReadSupport {
            read_names: spanning.iter().map(|s| String::from(s.read_name)).collect(),
            read_lengths,
            consensus_length,
            start_partial_reads: overlapping.get(&start).map_or(0, Vec::len),
            end_partial_reads: overlapping.get(&end.rc()).map_or(0, Vec::len),
        }),
    }
}

/// Builds bridges between single-copy segments using long read alignments.
/// Existing bridges linking the same segments provide graph paths for the new ones.
pub fn create_long_read_bridges(g: &Graph, reads: &ReadStore, read_names: &[String],
    single_copy: &BTreeSet<usize>, existing_bridges: &[Bridge],
    params: &LongReadParams) -> Vec<Bridge> {
    info!("Bridging graph with long reads");
    let evidence = collect_long_read_evidence(g, reads, read_names, single_copy,
                                              params.min_scaled_score);
    info!("{} single-copy segment pairs spanned by reads, {} segments with overlapping reads",
        evidence.spanning.len(), evidence.overlapping.len());

    let mut bridges = Vec::new();
    for (&(start, end), spanning) in &evidence.spanning {
        if spanning.len() < params.min_bridge_reads {
            debug!("Only {} reads span {} -> {}, skipping", spanning.len(), start, end);
            continue;
        }
        let bridge = long_read_bridge(g, start, end, spanning, &evidence.overlapping, existing_bridges);
        debug!("{}", bridge);
        bridges.push(bridge);
    }
    info!("Created {} long read bridges", bridges.len());
    bridges
}
