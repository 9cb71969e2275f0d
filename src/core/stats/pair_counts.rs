use crate::core::hits::HitCounts;
use crate::core::model::{Contaminant, Thresholds};
use crate::core::stats::pc;

/// Aggregate counters for the combined mate-pair decision. Three precedence
/// tiers (threshold passed, 1+ k-mer in both mates, 1+ k-mer in either mate),
/// each kept separately for raw and for unique k-mer counts.
#[derive(Clone, Debug)]
pub struct PairCounters {
    pub number_of_pairs: u64,
    pub threshold_passed: u64,
    pub k1_both_not_threshold: u64,
    pub k1_either_not_threshold: u64,
    pub threshold_passed_unique: u64,
    pub k1_both_not_threshold_unique: u64,
    pub k1_either_not_threshold_unique: u64,
    pub threshold_passed_by_contaminant: Vec<u64>,
    pub k1_both_not_threshold_by_contaminant: Vec<u64>,
    pub k1_either_not_threshold_by_contaminant: Vec<u64>,
    pub threshold_passed_unique_by_contaminant: Vec<u64>,
    pub k1_both_not_threshold_unique_by_contaminant: Vec<u64>,
    pub k1_either_not_threshold_unique_by_contaminant: Vec<u64>,
    pub contaminant_kmers_seen: Vec<u64>,
}

// Scan result for one tier of input (raw or unique counts).
struct TierScan {
    threshold_met: bool,
    best: usize,
    best_total: u32,
    one_in_both: u32,
    one_in_either: u32,
}

// One pass over the contaminants for a pair. A single running best is shared
// across the threshold tier and the 1+ tiers, and the 1+ tiers stop being
// evaluated as soon as an earlier index has met the threshold; both behaviors
// are load-bearing for attribution and must not be "simplified".
fn scan_pair(a: &[u32], b: &[u32], read_threshold: u32, overall_threshold: u32) -> TierScan {
    let mut scan = TierScan {
        threshold_met: false,
        best: 0,
        best_total: 0,
        one_in_both: 0,
        one_in_either: 0,
    };
    for i in 0..a.len() {
        let t = a[i] + b[i];
        if a[i] >= read_threshold && b[i] >= read_threshold && t >= overall_threshold {
            if t > scan.best_total {
                scan.best_total = t;
                scan.best = i;
            }
            scan.threshold_met = true;
        } else if !scan.threshold_met {
            if a[i] >= 1 && b[i] >= 1 {
                scan.one_in_both += 1;
                if t > scan.best_total {
                    scan.best_total = t;
                    scan.best = i;
                }
            } else if a[i] >= 1 || b[i] >= 1 {
                scan.one_in_either += 1;
                if scan.one_in_both == 0 && t > scan.best_total {
                    scan.best_total = t;
                    scan.best = i;
                }
            }
        }
    }
    scan
}

impl PairCounters {
    pub fn new(n_contaminants: usize) -> Self {
        Self {
            number_of_pairs: 0,
            threshold_passed: 0,
            k1_both_not_threshold: 0,
            k1_either_not_threshold: 0,
            threshold_passed_unique: 0,
            k1_both_not_threshold_unique: 0,
            k1_either_not_threshold_unique: 0,
            threshold_passed_by_contaminant: vec![0; n_contaminants],
            k1_both_not_threshold_by_contaminant: vec![0; n_contaminants],
            k1_either_not_threshold_by_contaminant: vec![0; n_contaminants],
            threshold_passed_unique_by_contaminant: vec![0; n_contaminants],
            k1_both_not_threshold_unique_by_contaminant: vec![0; n_contaminants],
            k1_either_not_threshold_unique_by_contaminant: vec![0; n_contaminants],
            contaminant_kmers_seen: vec![0; n_contaminants],
        }
    }

    /// Classify a mate pair and fold it into the counters. Returns the
    /// advisory filter decision; acting on it is the caller's business.
    /// Per pair, exactly one raw tier and exactly one unique tier increments.
    pub fn update_pair(&mut self, a: &HitCounts, b: &HitCounts, thresholds: &Thresholds) -> bool {
        self.number_of_pairs += 1;

        let raw = scan_pair(&a.hits, &b.hits, thresholds.read, thresholds.overall);
        let unique = scan_pair(
            &a.unique_hits,
            &b.unique_hits,
            thresholds.read,
            thresholds.overall,
        );

        let mut filter_read = false;

        if raw.threshold_met {
            self.threshold_passed += 1;
            self.threshold_passed_by_contaminant[raw.best] += 1;
            if !thresholds.filter_unique_only {
                filter_read = true;
            }
        } else if raw.one_in_both > 0 {
            self.k1_both_not_threshold += 1;
            self.k1_both_not_threshold_by_contaminant[raw.best] += 1;
        } else if raw.one_in_either > 0 {
            self.k1_either_not_threshold += 1;
            self.k1_either_not_threshold_by_contaminant[raw.best] += 1;
        }

        if unique.threshold_met {
            self.threshold_passed_unique += 1;
            self.threshold_passed_unique_by_contaminant[unique.best] += 1;
            filter_read = true;
        } else if unique.one_in_both > 0 {
            self.k1_both_not_threshold_unique += 1;
            self.k1_both_not_threshold_unique_by_contaminant[unique.best] += 1;
        } else if unique.one_in_either > 0 {
            self.k1_either_not_threshold_unique += 1;
            self.k1_either_not_threshold_unique_by_contaminant[unique.best] += 1;
        }

        filter_read
    }

    /// Derive percentage fields. Pure, zero denominators yield 0.0.
    pub fn finalize(&self, contaminants: &[Contaminant]) -> PairSummary {
        let pairs = self.number_of_pairs;
        let by = |v: &[u64]| v.iter().map(|&c| pc(c, pairs)).collect::<Vec<f64>>();
        PairSummary {
            threshold_passed_pc: pc(self.threshold_passed, pairs),
            k1_both_not_threshold_pc: pc(self.k1_both_not_threshold, pairs),
            k1_either_not_threshold_pc: pc(self.k1_either_not_threshold, pairs),
            threshold_passed_unique_pc: pc(self.threshold_passed_unique, pairs),
            k1_both_not_threshold_unique_pc: pc(self.k1_both_not_threshold_unique, pairs),
            k1_either_not_threshold_unique_pc: pc(self.k1_either_not_threshold_unique, pairs),
            threshold_passed_by_contaminant_pc: by(&self.threshold_passed_by_contaminant),
            k1_both_not_threshold_by_contaminant_pc: by(&self.k1_both_not_threshold_by_contaminant),
            k1_either_not_threshold_by_contaminant_pc: by(
                &self.k1_either_not_threshold_by_contaminant,
            ),
            threshold_passed_unique_by_contaminant_pc: by(
                &self.threshold_passed_unique_by_contaminant,
            ),
            k1_both_not_threshold_unique_by_contaminant_pc: by(
                &self.k1_both_not_threshold_unique_by_contaminant,
            ),
            k1_either_not_threshold_unique_by_contaminant_pc: by(
                &self.k1_either_not_threshold_unique_by_contaminant,
            ),
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
pub struct PairSummary {
    pub threshold_passed_pc: f64,
    pub k1_both_not_threshold_pc: f64,
    pub k1_either_not_threshold_pc: f64,
    pub threshold_passed_unique_pc: f64,
    pub k1_both_not_threshold_unique_pc: f64,
    pub k1_either_not_threshold_unique_pc: f64,
    pub threshold_passed_by_contaminant_pc: Vec<f64>,
    pub k1_both_not_threshold_by_contaminant_pc: Vec<f64>,
    pub k1_either_not_threshold_by_contaminant_pc: Vec<f64>,
    pub threshold_passed_unique_by_contaminant_pc: Vec<f64>,
    pub k1_both_not_threshold_unique_by_contaminant_pc: Vec<f64>,
    pub k1_either_not_threshold_unique_by_contaminant_pc: Vec<f64>,
    pub contaminant_kmers_seen_pc: Vec<f64>,
}
