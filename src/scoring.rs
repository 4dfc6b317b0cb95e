use crate::graph::{Graph, Segment};

/// Value in [0, 1] describing how well the numbers agree (1 is perfect agreement).
/// Numbers of opposite sign do not agree at all.
pub fn numeric_agreement(num_1: f64, num_2: f64) -> f64 {
    if num_1 == 0. && num_2 == 0. {
        return 1.;
    }
    let (num_1, num_2) = if num_1 < 0. && num_2 < 0. {
        (-num_1, -num_2)
    } else {
        (num_1, num_2)
    };
    if num_1 < 0. || num_2 < 0. {
        return 0.;
    }
    num_1.min(num_2) / num_1.max(num_2)
}

pub fn weighted_average(num_1: f64, num_2: f64, weight_1: f64, weight_2: f64) -> f64 {
    let weight_sum = weight_1 + weight_2;
    assert!(weight_sum > 0., "Weighted average requires positive total weight");
    num_1 * (weight_1 / weight_sum) + num_2 * (weight_2 / weight_sum)
}

//weighted by length without the graph overlap
pub fn mean_depth(g: &Graph, seg_1: &Segment, seg_2: &Segment) -> f64 {
    weighted_average(seg_1.depth, seg_2.depth,
                     seg_1.length_no_overlap(g.overlap()) as f64,
                     seg_2.length_no_overlap(g.overlap()) as f64)
}
