use std::str;
use std::fmt;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use anyhow::{anyhow, bail, Context, Result};
use crate::graph_algos::simple_loop::{self, SimpleLoop};
use crate::utils::reverse_complement;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    FORWARD,
    REVERSE,
}

impl Direction {
    pub fn flip(d: Direction) -> Direction {
        match d {
            Self::FORWARD => Self::REVERSE,
            Self::REVERSE => Self::FORWARD,
        }
    }

    fn parse_char(c: char) -> Result<Direction> {
        match c {
            '+' => Ok(Self::FORWARD),
            '-' => Ok(Self::REVERSE),
            _ => bail!("Unknown direction {}", c),
        }
    }

    fn parse(s: &str) -> Result<Direction> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::parse_char(c),
            _ => bail!("Unknown direction {}", s),
        }
    }

    pub fn str(d: Direction) -> &'static str {
        match d {
            Self::FORWARD => "+",
            Self::REVERSE => "-",
        }
    }
}

/// Oriented segment. Displayed and ordered as the conventional signed
/// segment number (negative for the reverse strand).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Vertex {
    //segment number
    pub number: usize,
    pub direction: Direction,
}

impl Vertex {
    pub fn forward(number: usize) -> Vertex {
        Vertex {number, direction: Direction::FORWARD}
    }

    pub fn reverse(number: usize) -> Vertex {
        Vertex {number, direction: Direction::REVERSE}
    }

    pub fn rc(&self) -> Vertex {
        Vertex {
            number: self.number,
            direction: Direction::flip(self.direction),
        }
    }

    pub fn is_forward(&self) -> bool {
        self.direction == Direction::FORWARD
    }

    pub fn signed(&self) -> i64 {
        match self.direction {
            Direction::FORWARD => self.number as i64,
            Direction::REVERSE => -(self.number as i64),
        }
    }

    /// Accepts both "12+"/"12-" (GFA style) and "12"/"-12" (signed style).
    pub fn parse(s: &str) -> Result<Vertex> {
        let s = s.trim();
        if s.ends_with('+') || s.ends_with('-') {
            let (num, dir) = s.split_at(s.len() - 1);
            let number = num.parse().with_context(|| format!("Invalid segment number in {}", s))?;
            return Ok(Vertex {number, direction: Direction::parse(dir)?});
        }
        match s.strip_prefix('-') {
            Some(num) => Ok(Vertex::reverse(num.parse()
                                .with_context(|| format!("Invalid segment number in {}", s))?)),
            None => Ok(Vertex::forward(s.parse()
                                .with_context(|| format!("Invalid segment number in {}", s))?)),
        }
    }
}

impl Ord for Vertex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.signed().cmp(&other.signed())
            .then(self.direction.cmp(&other.direction))
    }
}

impl PartialOrd for Vertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.signed())
    }
}

pub fn rc_path(path: &[Vertex]) -> Vec<Vertex> {
    path.iter().rev().map(|v| v.rc()).collect()
}

pub fn path_str(path: &[Vertex]) -> String {
    path.iter().map(|v| v.to_string()).collect::<Vec<String>>().join(", ")
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Hash)]
pub struct Link {
    pub start: Vertex,
    pub end: Vertex,
    pub overlap: u32,
}

impl Link {
    pub fn rc(&self) -> Link {
        Link {
            start: self.end.rc(),
            end: self.start.rc(),
            overlap: self.overlap,
        }
    }

    fn is_canonical(&self) -> bool {
        self <= &self.rc()
    }

    fn canonical(&self) -> Link {
        if self.is_canonical() { *self } else { self.rc() }
    }

    fn join_same(l1: &Link, l2: &Link) -> bool {
        l1.start == l2.start && l1.end == l2.end
    }

    fn parallel(l1: &Link, l2: &Link) -> bool {
        Self::join_same(l1, l2) || Self::join_same(l1, &l2.rc())
    }
}

#[derive(Clone, Debug)]
pub struct Segment {
    pub number: usize,
    pub length: usize,
    //coverage depth
    pub depth: f64,
    //empty when GFA stores '*'
    pub sequence: String,
}

impl Segment {
    pub fn length_no_overlap(&self, overlap: usize) -> usize {
        self.length.saturating_sub(overlap)
    }
}

pub struct Graph {
    segments: HashMap<usize, Segment>,
    //incoming & outgoing links for the forward orientation of every segment
    incoming_links: HashMap<usize, Vec<Link>>,
    outgoing_links: HashMap<usize, Vec<Link>>,
    //contig paths by name
    paths: BTreeMap<String, Vec<Vertex>>,
    overlap: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {

    pub fn new() -> Graph {
        Graph {
            segments: HashMap::new(),
            incoming_links: HashMap::new(),
            outgoing_links: HashMap::new(),
            paths: BTreeMap::new(),
            overlap: 0,
        }
    }

    pub fn segment_cnt(&self) -> usize {
        self.segments.len()
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn set_overlap(&mut self, overlap: usize) {
        self.overlap = overlap;
    }

    pub fn contains(&self, number: usize) -> bool {
        self.segments.contains_key(&number)
    }

    pub fn add_segment(&mut self, segment: Segment) {
        let number = segment.number;
        assert!(!self.contains(number), "Segment {} added twice", number);
        self.segments.insert(number, segment);
        self.incoming_links.insert(number, Vec::new());
        self.outgoing_links.insert(number, Vec::new());
    }

    fn links_mut(links: &mut HashMap<usize, Vec<Link>>, number: usize) -> &mut Vec<Link> {
        match links.get_mut(&number) {
            Some(l) => l,
            None => panic!("Segment {} is not in the graph", number),
        }
    }

    /// Adds the link (implicitly together with its reverse complement).
    /// Links already present in either orientation are ignored.
    pub fn add_link(&mut self, link: Link) {
        if self.outgoing_edges(link.start).iter().any(|l| Link::parallel(l, &link)) {
            return;
        }

        match link.start.direction {
            Direction::FORWARD => Self::links_mut(&mut self.outgoing_links, link.start.number).push(link),
            Direction::REVERSE => Self::links_mut(&mut self.incoming_links, link.start.number).push(link.rc()),
        };

        if link == link.rc() { return };

        match link.end.direction {
            Direction::FORWARD => Self::links_mut(&mut self.incoming_links, link.end.number).push(link),
            Direction::REVERSE => Self::links_mut(&mut self.outgoing_links, link.end.number).push(link.rc()),
        };
    }

    pub fn add_path(&mut self, name: &str, path: Vec<Vertex>) {
        assert!(path.iter().all(|v| self.contains(v.number)),
            "Path {} refers to segments missing from the graph", name);
        self.paths.insert(String::from(name), path);
    }

    fn check_links(&self) {
        assert!(self.segments.len() == self.incoming_links.len());
        assert!(self.segments.len() == self.outgoing_links.len());
        for &number in self.segments.keys() {
            let v = Vertex::forward(number);
            assert!(self.incoming_links[&number].iter().filter(|l| l.end != v).count() == 0
                        , "Problem with incoming links for segment {}", number);
            assert!(self.outgoing_links[&number].iter().filter(|l| l.start != v).count() == 0
                        , "Problem with outgoing links for segment {}", number);
        }
    }

    fn parse_tag<T: str::FromStr>(fields: &[&str], prefix: &str) -> Result<Option<T>> {
        match fields.iter().find(|s| s.starts_with(prefix)) {
            None => Ok(None),
            Some(s) => s[prefix.len()..].parse::<T>()
                        .map(Some)
                        .map_err(|_| anyhow!("Couldn't parse tag {}", s)),
        }
    }

    fn parse_overlap(cigar: &str) -> Result<u32> {
        let cigar = cigar.trim();
        if cigar == "*" {
            return Ok(0);
        }
        if !cigar.ends_with('M') {
            bail!("Invalid overlap {}", cigar);
        }
        let ovl = &cigar[..(cigar.len()-1)];
        ovl.parse().map_err(|_| anyhow!("Invalid overlap {}", cigar))
    }

    fn parse_segment_number(&self, name: &str) -> Result<usize> {
        let number = name.parse().with_context(|| format!("Segment name {} is not a number", name))?;
        if !self.contains(number) {
            bail!("Segment {} is not in the graph", name);
        }
        Ok(number)
    }

    fn parse_segment(split: &[&str]) -> Result<Segment> {
        if split.len() < 3 {
            bail!("Segment line has too few fields");
        }
        let number = split[1].parse().with_context(|| format!("Segment name {} is not a number", split[1]))?;
        let tags = &split[3..];
        let sequence = if split[2] != "*" { String::from(split[2].trim()) } else { String::new() };
        let length = if split[2] != "*" {
                         sequence.len()
                     } else {
                         Self::parse_tag(tags, "LN:i:")?
                             .ok_or_else(|| anyhow!("Neither sequence nor LN tag provided"))?
                     };
        let depth: f64 = match Self::parse_tag(tags, "DP:f:")? {
            Some(d) => d,
            None => Self::parse_tag(tags, "ll:f:")?.unwrap_or(0.),
        };
        Ok(Segment {number, length, depth, sequence})
    }

    /// Reads graph from GFA 1 text: S lines (numeric names), L lines with plain match
    /// overlaps (one value for the whole graph) and P lines storing contig paths.
    pub fn read(graph_str: &str) -> Result<Graph> {
        let mut g = Self::new();

        for (line_no, line) in graph_str.lines().enumerate() {
            if line.starts_with("S\t") {
                let split: Vec<&str> = line.trim_end().split('\t').collect();
                let segment = Self::parse_segment(&split)
                    .with_context(|| format!("Invalid segment line {}", line_no + 1))?;
                if g.contains(segment.number) {
                    bail!("Segment {} defined twice (line {})", segment.number, line_no + 1);
                }
                g.add_segment(segment);
            }
        }

        let mut graph_overlap: Option<u32> = None;
        for (line_no, line) in graph_str.lines().enumerate() {
            if line.starts_with("L\t") {
                let split: Vec<&str> = line.trim().split('\t').collect();
                if split.len() < 6 {
                    bail!("Link line {} has too few fields", line_no + 1);
                }
                let link = g.parse_link(&split)
                    .with_context(|| format!("Invalid link line {}", line_no + 1))?;
                match graph_overlap {
                    Some(o) if o != link.overlap => bail!("Link on line {} has overlap {} while previous links have {}",
                                                        line_no + 1, link.overlap, o),
                    _ => graph_overlap = Some(link.overlap),
                }
                g.add_link(link);
            }
        }
        g.overlap = graph_overlap.unwrap_or(0) as usize;

        for (line_no, line) in graph_str.lines().enumerate() {
            if line.starts_with("P\t") {
                let split: Vec<&str> = line.trim().split('\t').collect();
                if split.len() < 3 {
                    bail!("Path line {} has too few fields", line_no + 1);
                }
                let path = g.parse_path(split[2])
                    .with_context(|| format!("Invalid path line {}", line_no + 1))?;
                g.add_path(split[1], path);
            }
        }

        g.check_links();
        Ok(g)
    }

    fn parse_link(&self, split: &[&str]) -> Result<Link> {
        let start = Vertex {
            number: self.parse_segment_number(split[1])?,
            direction: Direction::parse(split[2])?,
        };
        let end = Vertex {
            number: self.parse_segment_number(split[3])?,
            direction: Direction::parse(split[4])?,
        };
        let overlap = Self::parse_overlap(split[5])?;
        Ok(Link{start, end, overlap})
    }

    fn parse_path(&self, path_str: &str) -> Result<Vec<Vertex>> {
        let mut path = Vec::new();
        for s in path_str.split(',') {
            let v = Vertex::parse(s)?;
            if !self.contains(v.number) {
                bail!("Segment {} is not in the graph", v.number);
            }
            path.push(v);
        }
        Ok(path)
    }

    pub fn segment(&self, number: usize) -> &Segment {
        match self.segments.get(&number) {
            Some(s) => s,
            None => panic!("Segment {} is not in the graph", number),
        }
    }

    /// Segment numbers in ascending order
    pub fn segment_numbers(&self) -> Vec<usize> {
        let mut numbers: Vec<usize> = self.segments.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    fn rc(links: &[Link]) -> Vec<Link> {
        links.iter().map(|x| x.rc()).collect()
    }

    pub fn outgoing_edges(&self, v: Vertex) -> Vec<Link> {
        self.segment(v.number);
        match v.direction {
            Direction::FORWARD => self.outgoing_links[&v.number].clone(),
            Direction::REVERSE => Self::rc(&self.incoming_links[&v.number]),
        }
    }

    pub fn incoming_edges(&self, v: Vertex) -> Vec<Link> {
        self.segment(v.number);
        match v.direction {
            Direction::FORWARD => self.incoming_links[&v.number].clone(),
            Direction::REVERSE => Self::rc(&self.outgoing_links[&v.number]),
        }
    }

    pub fn outgoing_edge_cnt(&self, v: Vertex) -> usize {
        match v.direction {
            Direction::FORWARD => self.outgoing_links[&v.number].len(),
            Direction::REVERSE => self.incoming_links[&v.number].len(),
        }
    }

    pub fn incoming_edge_cnt(&self, v: Vertex) -> usize {
        match v.direction {
            Direction::FORWARD => self.incoming_links[&v.number].len(),
            Direction::REVERSE => self.outgoing_links[&v.number].len(),
        }
    }

    /// Every link reported once, in its canonical orientation
    pub fn all_links(&self) -> Vec<Link> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for number in self.segment_numbers() {
            for l in self.outgoing_links[&number].iter().chain(self.incoming_links[&number].iter()) {
                let canonical = l.canonical();
                if seen.insert(canonical) {
                    links.push(canonical);
                }
            }
        }
        links
    }

    pub fn link_cnt(&self) -> usize {
        self.all_links().len()
    }

    /// Numbers of all segments linked to v on either side
    pub fn get_connected_segments(&self, v: Vertex) -> HashSet<usize> {
        self.outgoing_edges(v).iter().map(|l| l.end.number)
            .chain(self.incoming_edges(v).iter().map(|l| l.start.number))
            .collect()
    }

    pub fn oriented_sequence(&self, v: Vertex) -> String {
        let seq = &self.segment(v.number).sequence;
        match v.direction {
            Direction::FORWARD => seq.clone(),
            Direction::REVERSE => reverse_complement(seq),
        }
    }

    /// Every segment after the first contributes its sequence without the graph overlap
    pub fn get_path_sequence(&self, path: &[Vertex]) -> String {
        let mut path_seq = String::new();
        for (i, &v) in path.iter().enumerate() {
            let seq = self.oriented_sequence(v);
            if i == 0 {
                path_seq.push_str(&seq);
            } else {
                path_seq.push_str(seq.get(self.overlap..).unwrap_or(""));
            }
        }
        path_seq
    }

    pub fn contig_paths(&self) -> impl Iterator<Item=&Vec<Vertex>> + '_ {
        self.paths.values()
    }

    pub fn path_cnt(&self) -> usize {
        self.paths.len()
    }

    pub fn find_all_simple_loops(&self) -> Vec<SimpleLoop> {
        simple_loop::find_all_simple_loops(self)
    }

    pub fn l_str(&self, l: Link) -> String {
        format!("{}{}->{}{}", l.start.number, Direction::str(l.start.direction),
                              l.end.number, Direction::str(l.end.direction))
    }
}
