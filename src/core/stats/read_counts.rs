use crate::core::hits::{Classification, HitCounts};
use crate::core::model::{Contaminant, MAX_READ_LENGTH};
use crate::core::stats::pc;

/// Aggregate counters for one mate side. All by-contaminant vectors are
/// indexed by contaminant index; `kmers_per_read` has `MAX_READ_LENGTH + 1`
/// buckets with the last one accumulating overflow.
#[derive(Clone, Debug)]
pub struct ReadCounters {
    pub number_of_reads: u64,
    pub k1_reads: u64,
    pub kn_reads: u64,
    pub reads_unclassified: u64,
    pub k1_reads_by_contaminant: Vec<u64>,
    pub k1_unique_reads_by_contaminant: Vec<u64>,
    pub kn_reads_by_contaminant: Vec<u64>,
    pub kn_unique_reads_by_contaminant: Vec<u64>,
    pub assigned_reads_by_contaminant: Vec<u64>,
    pub contaminant_kmers_seen: Vec<u64>,
    pub kmers_per_read: Vec<u64>,
}

impl ReadCounters {
    pub fn new(n_contaminants: usize) -> Self {
        Self {
            number_of_reads: 0,
            k1_reads: 0,
            kn_reads: 0,
            reads_unclassified: 0,
            k1_reads_by_contaminant: vec![0; n_contaminants],
            k1_unique_reads_by_contaminant: vec![0; n_contaminants],
            kn_reads_by_contaminant: vec![0; n_contaminants],
            kn_unique_reads_by_contaminant: vec![0; n_contaminants],
            assigned_reads_by_contaminant: vec![0; n_contaminants],
            contaminant_kmers_seen: vec![0; n_contaminants],
            kmers_per_read: vec![0; MAX_READ_LENGTH + 1],
        }
    }

    /// Classify one read and fold it into the counters. Ties on the hit count
    /// keep the lowest contaminant index. Note the two deliberate asymmetries:
    /// the read-level 1-hit counter increments for any read with at least one
    /// loaded k-mer, and the read-level N-hit counter gates on
    /// `kmers_loaded >= read_threshold` while the per-contaminant N-hit
    /// counters require a strictly greater hit count.
    pub fn update_read(&mut self, counts: &HitCounts, read_threshold: u32) -> Classification {
        let n = self.k1_reads_by_contaminant.len();

        self.number_of_reads += 1;
        let bucket = (counts.kmers_loaded as usize).min(MAX_READ_LENGTH);
        self.kmers_per_read[bucket] += 1;

        let mut largest = 0usize;
        let mut largest_kmers = 0u32;
        let mut unique_largest = 0usize;
        let mut unique_largest_kmers = 0u32;

        if counts.kmers_loaded > 0 {
            for i in 0..n {
                if counts.hits[i] > 0 {
                    if counts.hits[i] > largest_kmers {
                        largest_kmers = counts.hits[i];
                        largest = i;
                    }
                    if counts.unique_hits[i] > unique_largest_kmers {
                        unique_largest_kmers = counts.unique_hits[i];
                        unique_largest = i;
                    }
                    self.k1_reads_by_contaminant[i] += 1;
                    if counts.contaminants_detected == 1 {
                        self.k1_unique_reads_by_contaminant[i] += 1;
                    }
                }
            }
            self.k1_reads += 1;
        }

        let assigned = if largest_kmers == 0 {
            self.reads_unclassified += 1;
            None
        } else {
            self.assigned_reads_by_contaminant[largest] += 1;
            Some(largest)
        };

        let unique_assigned = if unique_largest_kmers == 0 {
            None
        } else {
            Some(unique_largest)
        };

        if counts.kmers_loaded >= read_threshold {
            for i in 0..n {
                if counts.hits[i] > read_threshold {
                    self.kn_reads_by_contaminant[i] += 1;
                    if counts.contaminants_detected == 1 {
                        self.kn_unique_reads_by_contaminant[i] += 1;
                    }
                }
            }
            self.kn_reads += 1;
        }

        Classification {
            assigned,
            unique_assigned,
        }
    }

    /// Derive percentage fields. Pure: never touches the raw counts, so it can
    /// be called any number of times. Zero denominators yield 0.0.
    pub fn finalize(&self, contaminants: &[Contaminant]) -> ReadSummary {
        let reads = self.number_of_reads;
        ReadSummary {
            k1_reads_pc: pc(self.k1_reads, reads),
            kn_reads_pc: pc(self.kn_reads, reads),
            unclassified_pc: pc(self.reads_unclassified, reads),
            k1_by_contaminant_pc: self
                .k1_reads_by_contaminant
                .iter()
                .map(|&c| pc(c, reads))
                .collect(),
            k1_unique_by_contaminant_pc: self
                .k1_unique_reads_by_contaminant
                .iter()
                .map(|&c| pc(c, reads))
                .collect(),
            kn_by_contaminant_pc: self
                .kn_reads_by_contaminant
                .iter()
                .map(|&c| pc(c, reads))
                .collect(),
            kn_unique_by_contaminant_pc: self
                .kn_unique_reads_by_contaminant
                .iter()
                .map(|&c| pc(c, reads))
                .collect(),
            assigned_by_contaminant_pc: self
                .assigned_reads_by_contaminant
                .iter()
                .map(|&c| pc(c, reads))
                .collect(),
            contaminant_kmers_seen_pc: self
                .contaminant_kmers_seen
                .iter()
                .zip(contaminants)
                .map(|(&seen, c)| pc(seen, c.kmers))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadSummary {
    pub k1_reads_pc: f64,
    pub kn_reads_pc: f64,
    pub unclassified_pc: f64,
    pub k1_by_contaminant_pc: Vec<f64>,
    pub k1_unique_by_contaminant_pc: Vec<f64>,
    pub kn_by_contaminant_pc: Vec<f64>,
    pub kn_unique_by_contaminant_pc: Vec<f64>,
    pub assigned_by_contaminant_pc: Vec<f64>,
    pub contaminant_kmers_seen_pc: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hc(n: usize, loaded: u32, raw: &[(usize, u32)], uniq: &[(usize, u32)]) -> HitCounts {
        let mut h = HitCounts::new(n);
        h.kmers_loaded = loaded;
        for &(i, c) in raw {
            h.hits[i] = c;
        }
        for &(i, c) in uniq {
            h.unique_hits[i] = c;
        }
        h.contaminants_detected = h.hits.iter().filter(|&&c| c > 0).count() as u32;
        h
    }

    #[test]
    fn tie_keeps_lowest_index() {
        let mut r = ReadCounters::new(8);
        let c = r.update_read(&hc(8, 10, &[(2, 5), (5, 5)], &[]), 1);
        assert_eq!(c.assigned, Some(2));
        assert_eq!(r.assigned_reads_by_contaminant[2], 1);
        assert_eq!(r.assigned_reads_by_contaminant[5], 0);
    }

    #[test]
    fn no_hits_is_unclassified() {
        let mut r = ReadCounters::new(2);
        let c = r.update_read(&hc(2, 0, &[], &[]), 1);
        assert_eq!(c.assigned, None);
        assert_eq!(c.unique_assigned, None);
        assert_eq!(r.reads_unclassified, 1);
        // No loaded k-mers: the 1-hit read counter stays put.
        assert_eq!(r.k1_reads, 0);
    }

    #[test]
    fn loaded_kmers_without_hits_still_count_as_k1_read() {
        let mut r = ReadCounters::new(2);
        let c = r.update_read(&hc(2, 7, &[], &[]), 1);
        assert_eq!(c.assigned, None);
        assert_eq!(r.k1_reads, 1);
        assert_eq!(r.reads_unclassified, 1);
        assert_eq!(r.k1_reads_by_contaminant, vec![0, 0]);
    }

    #[test]
    fn assigned_plus_unclassified_equals_reads() {
        let mut r = ReadCounters::new(3);
        let inputs = [
            hc(3, 5, &[(0, 3)], &[(0, 1)]),
            hc(3, 4, &[(1, 2), (2, 2)], &[]),
            hc(3, 0, &[], &[]),
            hc(3, 9, &[(2, 7)], &[(2, 7)]),
            hc(3, 2, &[], &[]),
        ];
        for h in &inputs {
            r.update_read(h, 3);
        }
        let assigned: u64 = r.assigned_reads_by_contaminant.iter().sum();
        assert_eq!(assigned + r.reads_unclassified, r.number_of_reads);
        assert_eq!(r.number_of_reads, 5);
    }

    #[test]
    fn threshold_gate_is_inclusive_but_per_contaminant_test_is_strict() {
        let mut r = ReadCounters::new(1);
        // kmers_loaded == threshold passes the outer gate; a hit count equal
        // to the threshold does not pass the inner one.
        r.update_read(&hc(1, 5, &[(0, 5)], &[]), 5);
        assert_eq!(r.kn_reads, 1);
        assert_eq!(r.kn_reads_by_contaminant[0], 0);

        r.update_read(&hc(1, 6, &[(0, 6)], &[]), 5);
        assert_eq!(r.kn_reads, 2);
        assert_eq!(r.kn_reads_by_contaminant[0], 1);

        // Below the outer gate nothing in the N tier moves.
        r.update_read(&hc(1, 4, &[(0, 4)], &[]), 5);
        assert_eq!(r.kn_reads, 2);
    }

    #[test]
    fn unique_counters_require_single_contaminant() {
        let mut r = ReadCounters::new(2);
        r.update_read(&hc(2, 8, &[(0, 4), (1, 2)], &[(0, 2)]), 1);
        assert_eq!(r.k1_reads_by_contaminant, vec![1, 1]);
        assert_eq!(r.k1_unique_reads_by_contaminant, vec![0, 0]);

        r.update_read(&hc(2, 8, &[(0, 4)], &[(0, 4)]), 1);
        assert_eq!(r.k1_unique_reads_by_contaminant, vec![1, 0]);
    }

    #[test]
    fn unique_assignment_is_returned_but_never_counted() {
        let mut r = ReadCounters::new(2);
        let c = r.update_read(&hc(2, 8, &[(0, 2), (1, 5)], &[(0, 2), (1, 1)]), 1);
        assert_eq!(c.assigned, Some(1));
        assert_eq!(c.unique_assigned, Some(0));
        // Only the raw assignment has a counter.
        assert_eq!(r.assigned_reads_by_contaminant, vec![0, 1]);
    }

    #[test]
    fn histogram_overflow_bucket() {
        let mut r = ReadCounters::new(1);
        r.update_read(&hc(1, MAX_READ_LENGTH as u32 + 50, &[], &[]), 1);
        r.update_read(&hc(1, 3, &[], &[]), 1);
        assert_eq!(r.kmers_per_read[MAX_READ_LENGTH], 1);
        assert_eq!(r.kmers_per_read[3], 1);
    }

    #[test]
    fn finalize_is_idempotent_and_guards_zero_denominators() {
        let contaminants = vec![
            Contaminant {
                id: "a".into(),
                kmers: 100,
            },
            Contaminant {
                id: "b".into(),
                kmers: 0,
            },
        ];

        let empty = ReadCounters::new(2);
        let s = empty.finalize(&contaminants);
        assert_eq!(s.k1_reads_pc, 0.0);
        assert_eq!(s.unclassified_pc, 0.0);
        assert_eq!(s.contaminant_kmers_seen_pc, vec![0.0, 0.0]);

        let mut r = ReadCounters::new(2);
        r.update_read(&hc(2, 4, &[(0, 2)], &[(0, 2)]), 1);
        r.update_read(&hc(2, 0, &[], &[]), 1);
        r.contaminant_kmers_seen[0] = 25;
        let first = r.finalize(&contaminants);
        let second = r.finalize(&contaminants);
        assert_eq!(first, second);
        assert_eq!(first.k1_reads_pc, 50.0);
        assert_eq!(first.unclassified_pc, 50.0);
        assert_eq!(first.contaminant_kmers_seen_pc[0], 25.0);
        // The raw unclassified count survives finalization.
        assert_eq!(r.reads_unclassified, 1);
    }
}
