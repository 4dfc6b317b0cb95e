use bio::alphabets::dna;

pub fn reverse_complement(seq: &str) -> String {
    String::from_utf8_lossy(&dna::revcomp(seq.as_bytes())).into_owned()
}
