use crate::graph::*;
use crate::graph_algos::only_or_none;
use log::debug;

//       middle
//       /    \
//       \    /
// start - repeat - end
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimpleLoop {
    pub start: Vertex,
    pub end: Vertex,
    pub middle: Vertex,
    pub repeat: Vertex,
}

impl SimpleLoop {
    pub fn reverse_complement(&self) -> SimpleLoop {
        SimpleLoop {
            start: self.end.rc(),
            end: self.start.rc(),
            middle: self.middle.rc(),
            repeat: self.repeat.rc(),
        }
    }
}

//middle has a single incoming and a single outgoing link, both to repeat
//repeat has exactly two incoming and two outgoing links
fn loop_through_middle(g: &Graph, middle: Vertex) -> Option<SimpleLoop> {
    if g.outgoing_edge_cnt(middle) != 1 || g.incoming_edge_cnt(middle) != 1 {
        return None;
    }
    let repeat = g.outgoing_edges(middle)[0].end;
    if g.incoming_edges(middle)[0].start != repeat || repeat.number == middle.number {
        return None;
    }
    if g.outgoing_edge_cnt(repeat) != 2 || g.incoming_edge_cnt(repeat) != 2 {
        return None;
    }

    let start = only_or_none(g.incoming_edges(repeat).into_iter()
                                .map(|l| l.start)
                                .filter(|v| v.number != middle.number))?;
    let end = only_or_none(g.outgoing_edges(repeat).into_iter()
                                .map(|l| l.end)
                                .filter(|v| v.number != middle.number))?;

    //start and end may coincide, but shouldn't be the loop itself
    for v in [start, end] {
        if v.number == middle.number || v.number == repeat.number {
            return None;
        }
    }
    Some(SimpleLoop {start, end, middle, repeat})
}

/// Every loop is reported in a single orientation
pub fn find_all_simple_loops(g: &Graph) -> Vec<SimpleLoop> {
    let mut simple_loops: Vec<SimpleLoop> = Vec::new();
    for number in g.segment_numbers() {
        for middle in [Vertex::forward(number), Vertex::reverse(number)] {
            if let Some(simple_loop) = loop_through_middle(g, middle) {
                if !simple_loops.contains(&simple_loop)
                    && !simple_loops.contains(&simple_loop.reverse_complement()) {
                    debug!("Found simple loop: start {} end {} middle {} repeat {}",
                        simple_loop.start, simple_loop.end, simple_loop.middle, simple_loop.repeat);
                    simple_loops.push(simple_loop);
                }
            }
        }
    }
    simple_loops
}
