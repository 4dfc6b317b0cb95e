use std::fmt;
use std::cmp::Ordering;
use crate::graph::*;
use crate::utils::reverse_complement;

pub const CONTIG_BRIDGE_BASE_QUALITY: f64 = 20.;
pub const LOOP_UNROLLING_BASE_QUALITY: f64 = 10.;
pub const LONG_READ_BASE_QUALITY: f64 = 1.;

/// Read-level information kept by long read bridges
#[derive(Clone, Debug, PartialEq)]
pub struct LongReadSupport {
    pub read_names: Vec<String>,
    //negative when alignments to start and end segments overlap on the read
    pub read_lengths: Vec<i64>,
    pub consensus_length: f64,
    //reads extending past start/end segment without reaching the other one
    pub start_partial_reads: usize,
    pub end_partial_reads: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BridgeKind {
    Contig,
    LoopUnrolling,
    LongRead(LongReadSupport),
}

impl BridgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Contig => "contig bridge",
            Self::LoopUnrolling => "loop unrolling bridge",
            Self::LongRead(_) => "long read bridge",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Contig => "contig",
            Self::LoopUnrolling => "loop",
            Self::LongRead(_) => "long_read",
        }
    }
}

/// Link between two single-copy segments.
///
/// Quality starts at the base value of the bridge kind and is only ever scaled down,
/// so bridges of one kind are directly comparable and the highest quality bridges
/// can be applied first.
#[derive(Clone, Debug, PartialEq)]
pub struct Bridge {
    pub start_segment: Vertex,
    pub end_segment: Vertex,
    //path through the unbridged graph, excluding start and end
    pub graph_path: Vec<Vertex>,
    pub bridge_sequence: String,
    //length weighted mean of start and end depths
    pub depth: f64,
    pub quality: f64,
    pub kind: BridgeKind,
}

impl Bridge {
    pub fn long_read_support(&self) -> Option<&LongReadSupport> {
        match &self.kind {
            BridgeKind::LongRead(support) => Some(support),
            _ => None,
        }
    }

    /// Graph path and sequence oriented from start to end,
    /// if the bridge links these segments (in either orientation).
    pub fn path_between(&self, start: Vertex, end: Vertex) -> Option<(Vec<Vertex>, String)> {
        if self.start_segment == start && self.end_segment == end {
            Some((self.graph_path.clone(), self.bridge_sequence.clone()))
        } else if self.start_segment == end.rc() && self.end_segment == start.rc() {
            Some((rc_path(&self.graph_path), reverse_complement(&self.bridge_sequence)))
        } else {
            None
        }
    }
}

impl fmt::Display for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} -> {} -> {} (quality = {:.2})", self.kind.label(),
            self.start_segment, path_str(&self.graph_path), self.end_segment, self.quality)
    }
}

pub fn sort_by_quality(bridges: &mut [Bridge]) {
    bridges.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
}
