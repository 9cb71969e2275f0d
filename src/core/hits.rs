/// Per-read tally produced by the k-mer table lookup. One instance is reused
/// across reads by each worker; `reset` clears it without reallocating.
#[derive(Clone, Debug)]
pub struct HitCounts {
    pub kmers_loaded: u32,
    pub contaminants_detected: u32,
    pub hits: Vec<u32>,
    pub unique_hits: Vec<u32>,
}

impl HitCounts {
    pub fn new(n_contaminants: usize) -> Self {
        Self {
            kmers_loaded: 0,
            contaminants_detected: 0,
            hits: vec![0; n_contaminants],
            unique_hits: vec![0; n_contaminants],
        }
    }

    pub fn reset(&mut self) {
        self.kmers_loaded = 0;
        self.contaminants_detected = 0;
        self.hits.fill(0);
        self.unique_hits.fill(0);
    }
}

/// Outcome of classifying one read. Returned by value; the lookup tally is
/// never written back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Classification {
    pub assigned: Option<usize>,
    pub unique_assigned: Option<usize>,
}
