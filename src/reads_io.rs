use crate::graph::Direction;
use crate::long_read::{Alignment, Read, ReadStore};
use anyhow::{anyhow, bail, Context, Result};
use bio::io::fasta;
use log::{info, warn};
use std::fs;
use std::str;

/// Reads in file order, with no alignments yet
pub fn read_fasta(reads_fn: &str) -> Result<Vec<Read>> {
    let reader = fasta::Reader::from_file(reads_fn)
        .with_context(|| format!("Failed to open FASTA file {}", reads_fn))?;
    let mut reads = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Invalid FASTA record in {}", reads_fn))?;
        let sequence = str::from_utf8(record.seq())
            .with_context(|| format!("Read {} has non-ASCII sequence", record.id()))?;
        reads.push(Read {
            name: String::from(record.id()),
            sequence: sequence.to_ascii_uppercase(),
            alignments: Vec::new(),
        });
    }
    Ok(reads)
}

fn parse_field<T: str::FromStr>(fields: &[&str], idx: usize, name: &str) -> Result<T> {
    fields[idx].parse::<T>().map_err(|_| anyhow!("Invalid {} '{}'", name, fields[idx]))
}

fn parse_tag<T: str::FromStr>(fields: &[&str], prefix: &str) -> Option<T> {
    fields.iter()
        .find(|s| s.starts_with(prefix))
        .and_then(|s| s[prefix.len()..].parse::<T>().ok())
}

/// Parses PAF text into (read name, alignment) pairs.
/// Target names must be segment numbers. Raw score comes from the AS tag when present
/// (match count otherwise), scaled score is the percent identity of the alignment block.
pub fn parse_paf(paf_str: &str) -> Result<Vec<(String, Alignment)>> {
    let mut alignments = Vec::new();
    for (line_no, line) in paf_str.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            bail!("PAF line {} has {} fields, at least 12 expected", line_no + 1, fields.len());
        }
        let alignment = parse_paf_alignment(&fields)
            .with_context(|| format!("Invalid PAF line {}", line_no + 1))?;
        alignments.push((String::from(fields[0]), alignment));
    }
    Ok(alignments)
}

fn parse_paf_alignment(fields: &[&str]) -> Result<Alignment> {
    let read_length: usize = parse_field(fields, 1, "query length")?;
    let read_start: usize = parse_field(fields, 2, "query start")?;
    let read_end: usize = parse_field(fields, 3, "query end")?;
    let strand = match fields[4] {
        "+" => Direction::FORWARD,
        "-" => Direction::REVERSE,
        s => bail!("Invalid strand '{}'", s),
    };
    let ref_number: usize = parse_field(fields, 5, "segment number")?;
    let ref_length: usize = parse_field(fields, 6, "target length")?;
    let ref_start: usize = parse_field(fields, 7, "target start")?;
    let ref_end: usize = parse_field(fields, 8, "target end")?;
    let matches: usize = parse_field(fields, 9, "match count")?;
    let block_length: usize = parse_field(fields, 10, "block length")?;

    if read_start > read_end || read_end > read_length {
        bail!("Query coordinates {}-{} inconsistent with length {}", read_start, read_end, read_length);
    }
    if ref_start > ref_end || ref_end > ref_length {
        bail!("Target coordinates {}-{} inconsistent with length {}", ref_start, ref_end, ref_length);
    }

    let scaled_score = if block_length > 0 {
        100. * matches as f64 / block_length as f64
    } else {
        0.
    };
    Ok(Alignment {
        ref_number,
        strand,
        raw_score: parse_tag(&fields[12..], "AS:i:").unwrap_or(matches as i64),
        scaled_score,
        read_length,
        read_start,
        read_end,
        ref_length,
        ref_start_pos: ref_start,
        ref_end_gap: ref_length - ref_end,
    })
}

/// Read store with alignments attached, plus read names in FASTA order
pub fn load_reads(reads_fn: &str, alignments_fn: &str) -> Result<(ReadStore, Vec<String>)> {
    info!("Reading long reads from {}", reads_fn);
    let reads = read_fasta(reads_fn)?;
    let read_names: Vec<String> = reads.iter().map(|r| r.name.clone()).collect();
    let mut store: ReadStore = reads.into_iter().map(|r| (r.name.clone(), r)).collect();
    info!("Read count: {}", store.len());

    info!("Reading alignments from {}", alignments_fn);
    let paf_str = fs::read_to_string(alignments_fn)
        .with_context(|| format!("Failed to read alignments from {}", alignments_fn))?;
    let mut missing = 0;
    let mut alignment_cnt = 0;
    for (read_name, alignment) in parse_paf(&paf_str)
            .with_context(|| format!("Failed to parse {}", alignments_fn))? {
        match store.get_mut(&read_name) {
            Some(read) => {
                if read.sequence.len() != alignment.read_length {
                    bail!("Read {} has length {} but is aligned with length {}",
                        read_name, read.sequence.len(), alignment.read_length);
                }
                read.alignments.push(alignment);
                alignment_cnt += 1;
            }
            None => missing += 1,
        }
    }
    if missing > 0 {
        warn!("{} alignments refer to reads absent from {}", missing, reads_fn);
    }
    info!("Alignment count: {}", alignment_cnt);
    Ok((store, read_names))
}
