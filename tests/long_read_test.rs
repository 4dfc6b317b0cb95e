use bridger::*;
use bridger::long_read::*;
use bridger::utils::reverse_complement;
use std::collections::BTreeSet;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//1 and 2 single-copy (100 bp), 3 sits between them (50 bp)
fn test_graph() -> Graph {
    let s = "
S 1 * LN:i:100 DP:f:10
S 2 * LN:i:100 DP:f:10
S 3 * LN:i:50 DP:f:10
L 1 + 3 + 0M
L 3 + 2 + 0M
";
    Graph::read(&s.replace(" ", "\t")).unwrap()
}

fn single_copy() -> BTreeSet<usize> {
    [1, 2].into_iter().collect()
}

//alignment covering ref_start..ref_end of a segment of length ref_length
fn aln(ref_number: usize, strand: Direction, read: (usize, usize), read_length: usize,
    refr: (usize, usize), ref_length: usize, score: f64) -> Alignment {
    Alignment {
        ref_number,
        strand,
        raw_score: (read.1 - read.0) as i64,
        scaled_score: score,
        read_length,
        read_start: read.0,
        read_end: read.1,
        ref_length,
        ref_start_pos: refr.0,
        ref_end_gap: ref_length - refr.1,
    }
}

fn read(name: &str, sequence: &str, alignments: Vec<Alignment>) -> Read {
    Read {
        name: String::from(name),
        sequence: String::from(sequence),
        alignments,
    }
}

fn store(reads: Vec<Read>) -> (ReadStore, Vec<String>) {
    let names = reads.iter().map(|r| r.name.clone()).collect();
    (reads.into_iter().map(|r| (r.name.clone(), r)).collect(), names)
}

//read of 100 + span + 100 bases aligned to 1 and 2 on the given strands
fn spanning_read(name: &str, span: &str, strand: Direction) -> Read {
    let seq = format!("{}{}{}", "A".repeat(100), span, "T".repeat(100));
    let len = seq.len();
    read(name, &seq, vec![
        aln(1, strand, (0, 100), len, (0, 100), 100, 95.),
        aln(2, strand, (len - 100, len), len, (0, 100), 100, 95.),
    ])
}

#[test]
fn span_extraction() {
    init();
    let g = test_graph();
    let span = "ACCGG".repeat(10);
    let (reads, names) = store(vec![spanning_read("r1", &span, Direction::FORWARD)]);
    let evidence = collect_long_read_evidence(&g, &reads, &names, &single_copy(), 75.);
    assert_eq!(evidence.spanning.len(), 1);
    let spanning = &evidence.spanning[&(Vertex::forward(1), Vertex::forward(2))];
    assert_eq!(spanning.len(), 1);
    assert_eq!(spanning[0].read_name, "r1");
    assert_eq!(spanning[0].span, ReadSpan::Sequence(span));
    assert_eq!(spanning[0].first.ref_number, 1);
    assert_eq!(spanning[0].second.ref_number, 2);
    assert!(evidence.overlapping.is_empty());
}

#[test]
fn flipped_span() {
    init();
    let g = test_graph();
    let span = "ACCGG".repeat(10);
    let (reads, names) = store(vec![spanning_read("r1", &span, Direction::REVERSE)]);
    let evidence = collect_long_read_evidence(&g, &reads, &names, &single_copy(), 75.);
    //-1 -> -2 is stored as 2 -> 1
    let spanning = &evidence.spanning[&(Vertex::forward(2), Vertex::forward(1))];
    assert_eq!(spanning[0].span, ReadSpan::Sequence("CCGGT".repeat(10)));
    assert_eq!(reverse_complement(&"CCGGT".repeat(10)), span);
}

#[test]
fn overlapping_alignments() {
    init();
    let g = test_graph();
    let seq = "C".repeat(190);
    let (reads, names) = store(vec![read("r1", &seq, vec![
        aln(1, Direction::FORWARD, (0, 100), 190, (0, 100), 100, 95.),
        aln(2, Direction::FORWARD, (90, 190), 190, (0, 100), 100, 95.),
    ])]);
    let evidence = collect_long_read_evidence(&g, &reads, &names, &single_copy(), 75.);
    let spanning = &evidence.spanning[&(Vertex::forward(1), Vertex::forward(2))];
    assert_eq!(spanning[0].span, ReadSpan::Overlap(-10));
    assert_eq!(spanning[0].span.length(), -10);
}

#[test]
fn alignment_filtering() {
    init();
    let g = test_graph();
    let seq = "C".repeat(300);
    let r = read("r1", &seq, vec![
        aln(1, Direction::FORWARD, (0, 100), 300, (0, 100), 100, 95.),
        //low identity
        aln(2, Direction::FORWARD, (200, 300), 300, (0, 100), 100, 60.),
        //not single-copy
        aln(3, Direction::FORWARD, (120, 170), 300, (0, 50), 50, 99.),
    ]);
    let alignments = get_single_copy_alignments(&g, &r, &single_copy(), 0, 75.);
    assert_eq!(alignments.len(), 1);
    assert_eq!(alignments[0].ref_number, 1);

    let alignments = get_single_copy_alignments(&g, &r, &single_copy(), 0, 50.);
    assert_eq!(alignments.len(), 2);

    let (reads, names) = store(vec![r]);
    let evidence = collect_long_read_evidence(&g, &reads, &names, &single_copy(), 75.);
    assert!(evidence.spanning.is_empty());
}

#[test]
fn circular_single_copy_segment() {
    init();
    let g = test_graph();
    let seq = "G".repeat(110);
    //read runs over the end of segment 1 and continues from its start
    let wrap_around = read("r1", &seq, vec![
        aln(1, Direction::FORWARD, (0, 50), 110, (50, 100), 100, 95.),
        aln(1, Direction::FORWARD, (60, 110), 110, (0, 50), 100, 90.),
    ]);
    let alignments = get_single_copy_alignments(&g, &wrap_around, &single_copy(), 0, 75.);
    assert_eq!(alignments.len(), 2);
    assert_eq!(alignments[0].read_start, 0);

    //second alignment covers the same part of the segment
    let bogus = read("r2", &seq, vec![
        aln(1, Direction::FORWARD, (0, 50), 110, (50, 100), 100, 95.),
        aln(1, Direction::FORWARD, (50, 110), 110, (40, 100), 100, 90.),
    ]);
    let alignments = get_single_copy_alignments(&g, &bogus, &single_copy(), 0, 75.);
    assert_eq!(alignments.len(), 1);
    assert_eq!(alignments[0].scaled_score, 95.);

    let (reads, names) = store(vec![wrap_around]);
    let evidence = collect_long_read_evidence(&g, &reads, &names, &single_copy(), 75.);
    let spanning = &evidence.spanning[&(Vertex::forward(1), Vertex::forward(1))];
    assert_eq!(spanning[0].span, ReadSpan::Sequence("G".repeat(10)));
}

#[test]
fn read_extending_past_segment() {
    init();
    let g = test_graph();
    let seq = format!("{}{}", "ACGTT".repeat(4), "C".repeat(100));
    let (reads, names) = store(vec![read("r1", &seq, vec![
        aln(1, Direction::FORWARD, (20, 120), 120, (0, 100), 100, 95.),
    ])]);
    let evidence = collect_long_read_evidence(&g, &reads, &names, &single_copy(), 75.);
    assert!(evidence.spanning.is_empty());
    assert_eq!(evidence.overlapping.len(), 1);
    assert_eq!(evidence.overlapping[&Vertex::reverse(1)], vec!["AACGT".repeat(4)]);
}

#[test]
fn pair_counted_once_per_read() {
    init();
    let s = "
S 1 * LN:i:100 DP:f:10
S 2 * LN:i:100 DP:f:10
S 4 * LN:i:100 DP:f:10
";
    let g = Graph::read(&s.replace(" ", "\t")).unwrap();
    let seq = "C".repeat(500);
    let mut alignments = vec![
        aln(1, Direction::FORWARD, (0, 100), 500, (0, 100), 100, 95.),
        aln(2, Direction::FORWARD, (150, 250), 500, (0, 100), 100, 95.),
        aln(4, Direction::FORWARD, (400, 500), 500, (0, 100), 100, 95.),
    ];
    //strongest alignments first
    alignments[0].raw_score = 300;
    alignments[1].raw_score = 200;
    alignments[2].raw_score = 100;
    let (reads, names) = store(vec![read("r1", &seq, alignments)]);
    let sc: BTreeSet<usize> = [1, 2, 4].into_iter().collect();
    let evidence = collect_long_read_evidence(&g, &reads, &names, &sc, 75.);
    assert_eq!(evidence.spanning.len(), 2);
    assert_eq!(evidence.spanning[&(Vertex::forward(1), Vertex::forward(2))].len(), 1);
    assert_eq!(evidence.spanning[&(Vertex::forward(2), Vertex::forward(4))].len(), 1);
    assert!(!evidence.spanning.contains_key(&(Vertex::forward(1), Vertex::forward(4))));
}

#[test]
fn weak_alignment_between_strong_ones() {
    init();
    let s = "
S 1 * LN:i:100 DP:f:10
S 2 * LN:i:100 DP:f:10
S 4 * LN:i:100 DP:f:10
";
    let g = Graph::read(&s.replace(" ", "\t")).unwrap();
    let seq = "C".repeat(500);
    let mut alignments = vec![
        aln(1, Direction::FORWARD, (0, 100), 500, (0, 100), 100, 95.),
        aln(2, Direction::FORWARD, (150, 250), 500, (0, 100), 100, 95.),
        aln(4, Direction::FORWARD, (400, 500), 500, (0, 100), 100, 95.),
    ];
    alignments[0].raw_score = 300;
    alignments[1].raw_score = 100;
    alignments[2].raw_score = 200;
    let (reads, names) = store(vec![read("r1", &seq, alignments)]);
    let sc: BTreeSet<usize> = [1, 2, 4].into_iter().collect();
    let evidence = collect_long_read_evidence(&g, &reads, &names, &sc, 75.);
    assert_eq!(evidence.spanning.len(), 3);
    assert_eq!(evidence.spanning[&(Vertex::forward(1), Vertex::forward(4))][0].span.length(), 300);
}

#[test]
fn two_read_consensus() {
    init();
    let g = test_graph();
    let (reads, names) = store(vec![
        spanning_read("r1", &"A".repeat(50), Direction::FORWARD),
        spanning_read("r2", &"A".repeat(52), Direction::FORWARD),
    ]);
    let bridges = create_long_read_bridges(&g, &reads, &names, &single_copy(), &[],
                                           &LongReadParams::default());
    assert_eq!(bridges.len(), 1);
    let b = &bridges[0];
    assert_eq!(b.start_segment, Vertex::forward(1));
    assert_eq!(b.end_segment, Vertex::forward(2));
    assert!(b.graph_path.is_empty());
    assert_eq!(b.bridge_sequence.len(), 50);
    let support = b.long_read_support().unwrap();
    assert_eq!(support.read_names, vec!["r1", "r2"]);
    assert_eq!(support.read_lengths, vec![50, 52]);
    assert_eq!(support.consensus_length, 50.);
    //0.75 for two reads, mean length agreement of (1 + 50/52) / 2
    let expected = 0.75 * (1. + 50. / 52.) / 2.;
    assert!((b.quality - expected).abs() < 1e-9);
    assert!((b.quality - 0.7356).abs() < 1e-4);
}

#[test]
fn too_few_reads() {
    init();
    let g = test_graph();
    let (reads, names) = store(vec![
        spanning_read("r1", &"A".repeat(50), Direction::FORWARD),
    ]);
    let params = LongReadParams {
        min_bridge_reads: 2,
        ..Default::default()
    };
    assert!(create_long_read_bridges(&g, &reads, &names, &single_copy(), &[], &params).is_empty());
}

#[test]
fn existing_path_reused() {
    init();
    let s = "
S 1 * LN:i:100 DP:f:10
S 2 * LN:i:100 DP:f:10
S 3 GGGGGCCCCCGGGGGCCCCCGGGGGCCCCCGGGGGCCCCCGGGGGCCCCC DP:f:10
L 1 + 3 + 0M
L 3 + 2 + 0M
P contig_1 1+,3+,2+ *
";
    let g = Graph::read(&s.replace(" ", "\t")).unwrap();
    let existing = create_contig_bridges(&g, &single_copy());
    assert_eq!(existing.len(), 1);

    let (reads, names) = store(vec![
        spanning_read("r1", &"A".repeat(48), Direction::FORWARD),
    ]);
    let bridges = create_long_read_bridges(&g, &reads, &names, &single_copy(), &existing,
                                           &LongReadParams::default());
    assert_eq!(bridges.len(), 1);
    let b = &bridges[0];
    assert_eq!(b.graph_path, vec![Vertex::forward(3)]);
    assert_eq!(b.bridge_sequence, g.segment(3).sequence);
    assert!((b.quality - 0.5).abs() < 1e-9);

    //existing bridge in the opposite orientation
    let flipped: Vec<Bridge> = existing.iter().map(|b| Bridge {
        start_segment: b.end_segment.rc(),
        end_segment: b.start_segment.rc(),
        graph_path: graph::rc_path(&b.graph_path),
        bridge_sequence: reverse_complement(&b.bridge_sequence),
        ..b.clone()
    }).collect();
    let bridges = create_long_read_bridges(&g, &reads, &names, &single_copy(), &flipped,
                                           &LongReadParams::default());
    assert_eq!(bridges[0].graph_path, vec![Vertex::forward(3)]);
    assert_eq!(bridges[0].bridge_sequence, g.segment(3).sequence);

    //read disagrees with the existing path length
    let (reads, names) = store(vec![
        spanning_read("r1", &"A".repeat(80), Direction::FORWARD),
    ]);
    let bridges = create_long_read_bridges(&g, &reads, &names, &single_copy(), &existing,
                                           &LongReadParams::default());
    assert!(bridges[0].graph_path.is_empty());
    assert_eq!(bridges[0].bridge_sequence, "A".repeat(80));
}

#[test]
fn partial_reads_counted() {
    init();
    let g = test_graph();
    let partial = read("p1", &format!("{}{}", "C".repeat(100), "A".repeat(30)), vec![
        aln(1, Direction::FORWARD, (0, 100), 130, (0, 100), 100, 95.),
    ]);
    let (reads, names) = store(vec![
        spanning_read("r1", &"A".repeat(50), Direction::FORWARD),
        partial,
    ]);
    let bridges = create_long_read_bridges(&g, &reads, &names, &single_copy(), &[],
                                           &LongReadParams::default());
    assert_eq!(bridges.len(), 1);
    let support = bridges[0].long_read_support().unwrap();
    assert_eq!(support.start_partial_reads, 1);
    assert_eq!(support.end_partial_reads, 0);
}
