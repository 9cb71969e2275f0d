pub mod pair_counts;
pub mod read_counts;

pub use pair_counts::{PairCounters, PairSummary};
pub use read_counts::{ReadCounters, ReadSummary};

use crate::core::hits::{Classification, HitCounts};
use crate::core::model::{Contaminant, Thresholds};
use parking_lot::Mutex;

pub(crate) fn pc(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

/// Everything accumulated over one run: the contaminant table, both mates'
/// counters, the pair counters, and the table-wide similarity results.
/// Mutated during processing, read-only during reporting.
pub struct OverallStats {
    pub contaminants: Vec<Contaminant>,
    /// 1 for single-end input, 2 for paired.
    pub input_files: usize,
    pub read: [ReadCounters; 2],
    pub pair: PairCounters,
    /// Symmetric co-occurrence matrix, empty until the similarity scan runs.
    pub kmers_in_common: Vec<Vec<u64>>,
    pub unique_kmers: Vec<u64>,
}

impl OverallStats {
    pub fn new(contaminants: Vec<Contaminant>, input_files: usize) -> Self {
        let n = contaminants.len();
        Self {
            contaminants,
            input_files,
            read: [ReadCounters::new(n), ReadCounters::new(n)],
            pair: PairCounters::new(n),
            kmers_in_common: Vec::new(),
            unique_kmers: Vec::new(),
        }
    }

    pub fn n_contaminants(&self) -> usize {
        self.contaminants.len()
    }

    pub fn finalize(&self) -> ScreenSummary {
        ScreenSummary {
            read: [
                self.read[0].finalize(&self.contaminants),
                self.read[1].finalize(&self.contaminants),
            ],
            pair: self.pair.finalize(&self.contaminants),
        }
    }
}

pub struct ScreenSummary {
    pub read: [ReadSummary; 2],
    pub pair: PairSummary,
}

/// Counter set shared by the parallel workers: one mutex per structure, and a
/// single lock acquisition covering the whole of one read's (or pair's)
/// update, so no observer can see a half-applied read.
pub struct SharedStats {
    read: [Mutex<ReadCounters>; 2],
    pair: Mutex<PairCounters>,
}

impl SharedStats {
    pub fn new(n_contaminants: usize) -> Self {
        Self {
            read: [
                Mutex::new(ReadCounters::new(n_contaminants)),
                Mutex::new(ReadCounters::new(n_contaminants)),
            ],
            pair: Mutex::new(PairCounters::new(n_contaminants)),
        }
    }

    pub fn record_read(
        &self,
        mate: usize,
        counts: &HitCounts,
        read_threshold: u32,
    ) -> Classification {
        self.read[mate].lock().update_read(counts, read_threshold)
    }

    pub fn record_pair(&self, a: &HitCounts, b: &HitCounts, thresholds: &Thresholds) -> bool {
        self.pair.lock().update_pair(a, b, thresholds)
    }

    /// Clone out the counters. Only a snapshot taken after every recording
    /// thread has been joined is final.
    pub fn snapshot(&self) -> ([ReadCounters; 2], PairCounters) {
        (
            [self.read[0].lock().clone(), self.read[1].lock().clone()],
            self.pair.lock().clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hc(n: usize, loaded: u32, raw: &[(usize, u32)]) -> HitCounts {
        let mut h = HitCounts::new(n);
        h.kmers_loaded = loaded;
        for &(i, c) in raw {
            h.hits[i] = c;
        }
        h.contaminants_detected = h.hits.iter().filter(|&&c| c > 0).count() as u32;
        h
    }

    #[test]
    fn concurrent_accumulation_matches_serial() {
        let inputs: Vec<HitCounts> = (0..400)
            .map(|i| match i % 4 {
                0 => hc(3, 10, &[(0, 4)]),
                1 => hc(3, 8, &[(1, 2), (2, 2)]),
                2 => hc(3, 0, &[]),
                _ => hc(3, 20, &[(2, 12)]),
            })
            .collect();

        let mut serial = ReadCounters::new(3);
        for h in &inputs {
            serial.update_read(h, 5);
        }

        let shared = SharedStats::new(3);
        std::thread::scope(|s| {
            for chunk in inputs.chunks(100) {
                let shared = &shared;
                s.spawn(move || {
                    for h in chunk {
                        shared.record_read(0, h, 5);
                    }
                });
            }
        });
        let (read, _) = shared.snapshot();

        assert_eq!(read[0].number_of_reads, serial.number_of_reads);
        assert_eq!(read[0].k1_reads, serial.k1_reads);
        assert_eq!(read[0].kn_reads, serial.kn_reads);
        assert_eq!(read[0].reads_unclassified, serial.reads_unclassified);
        assert_eq!(
            read[0].assigned_reads_by_contaminant,
            serial.assigned_reads_by_contaminant
        );
        assert_eq!(read[0].kmers_per_read, serial.kmers_per_read);
    }

    #[test]
    fn mates_do_not_share_counters() {
        let shared = SharedStats::new(1);
        shared.record_read(0, &hc(1, 5, &[(0, 2)]), 1);
        shared.record_read(1, &hc(1, 5, &[(0, 2)]), 1);
        shared.record_read(1, &hc(1, 5, &[(0, 2)]), 1);
        let (read, _) = shared.snapshot();
        assert_eq!(read[0].number_of_reads, 1);
        assert_eq!(read[1].number_of_reads, 2);
    }
}
