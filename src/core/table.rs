use crate::core::fastq::{FastxReader, Record};
use crate::core::hits::HitCounts;
use crate::core::kmer::{MAX_KMER_SIZE, canonical_kmers};
use crate::core::model::{Contaminant, MAX_CONTAMINANTS};
use anyhow::{Context, Result, bail};
use fxhash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

pub struct KmerEntry {
    /// Contaminant membership, one bit per contaminant index.
    mask: u64,
    /// Per-mate observed-in-reads flags, set from worker threads.
    seen: AtomicU8,
}

/// Reference k-mer table: canonical 2-bit-packed k-mer -> contaminant
/// membership. Immutable after build; lookups mark `seen` through an atomic so
/// the table can be shared across workers by reference.
pub struct KmerTable {
    k: usize,
    n_contaminants: usize,
    map: FxHashMap<u64, KmerEntry>,
}

impl KmerTable {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 || k > MAX_KMER_SIZE {
            bail!("k-mer size must be between 1 and {}", MAX_KMER_SIZE);
        }
        Ok(Self {
            k,
            n_contaminants: 0,
            map: FxHashMap::default(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_contaminants(&self) -> usize {
        self.n_contaminants
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn add_reference_seq(&mut self, index: usize, seq: &[u8]) {
        debug_assert!(index < MAX_CONTAMINANTS);
        for km in canonical_kmers(seq, self.k) {
            let entry = self.map.entry(km).or_insert_with(|| KmerEntry {
                mask: 0,
                seen: AtomicU8::new(0),
            });
            entry.mask |= 1 << index;
        }
        if index + 1 > self.n_contaminants {
            self.n_contaminants = index + 1;
        }
    }

    /// Distinct reference k-mers per contaminant (shared k-mers count for every
    /// member).
    pub fn contaminant_kmers(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.n_contaminants];
        for entry in self.map.values() {
            let mut bits = entry.mask;
            while bits != 0 {
                let i = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                counts[i] += 1;
            }
        }
        counts
    }

    /// Tally one read's k-mers into `counts`. Every valid k-mer extracted from
    /// the read counts toward `kmers_loaded`, hit or not.
    pub fn count_read(&self, mate: usize, seq: &[u8], counts: &mut HitCounts) {
        counts.reset();
        for km in canonical_kmers(seq, self.k) {
            counts.kmers_loaded += 1;
            if let Some(entry) = self.map.get(&km) {
                entry.seen.fetch_or(1 << mate, Ordering::Relaxed);
                let unique = entry.mask.count_ones() == 1;
                let mut bits = entry.mask;
                while bits != 0 {
                    let i = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    counts.hits[i] += 1;
                    if unique {
                        counts.unique_hits[i] += 1;
                    }
                }
            }
        }
        counts.contaminants_detected = counts.hits.iter().filter(|&&c| c > 0).count() as u32;
    }

    /// Traversal primitive for the similarity scan: the membership mask of
    /// every stored k-mer, in no particular order.
    pub fn masks(&self) -> impl Iterator<Item = u64> + '_ {
        self.map.values().map(|e| e.mask)
    }

    /// Distinct reference k-mers observed at least once in the reads, per mate
    /// and per contaminant, plus the either-mate union for the pair table.
    pub fn seen_counts(&self) -> SeenCounts {
        let n = self.n_contaminants;
        let mut out = SeenCounts {
            per_mate: [vec![0; n], vec![0; n]],
            either: vec![0; n],
        };
        for entry in self.map.values() {
            let seen = entry.seen.load(Ordering::Relaxed);
            if seen == 0 {
                continue;
            }
            let mut bits = entry.mask;
            while bits != 0 {
                let i = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                if seen & 1 != 0 {
                    out.per_mate[0][i] += 1;
                }
                if seen & 2 != 0 {
                    out.per_mate[1][i] += 1;
                }
                out.either[i] += 1;
            }
        }
        out
    }
}

pub struct SeenCounts {
    pub per_mate: [Vec<u64>; 2],
    pub either: Vec<u64>,
}

/// Load one reference file per contaminant into a fresh table. Contaminant
/// index is argument order; the display id is the file stem.
pub fn build_table(
    k: usize,
    references: &[PathBuf],
    threads: usize,
) -> Result<(KmerTable, Vec<Contaminant>)> {
    if references.is_empty() {
        bail!("at least one --reference is required");
    }
    if references.len() > MAX_CONTAMINANTS {
        bail!("at most {} references are supported", MAX_CONTAMINANTS);
    }
    let mut table = KmerTable::new(k)?;
    let mut contaminants = Vec::with_capacity(references.len());
    for (index, path) in references.iter().enumerate() {
        let mut reader = FastxReader::open(path, threads)?;
        let mut rec = Record::default();
        let mut sequences = 0u64;
        while reader
            .next_record(&mut rec)
            .with_context(|| format!("while loading reference {}", path.display()))?
        {
            table.add_reference_seq(index, &rec.seq);
            sequences += 1;
        }
        if sequences == 0 {
            bail!("reference {} contains no sequences", path.display());
        }
        contaminants.push(Contaminant {
            id: display_id(path),
            kmers: 0,
        });
    }
    let totals = table.contaminant_kmers();
    for (c, total) in contaminants.iter_mut().zip(totals) {
        c.kmers = total;
    }
    Ok((table, contaminants))
}

fn display_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("reference");
    stem.trim_end_matches(".fasta")
        .trim_end_matches(".fa")
        .trim_end_matches(".fastq")
        .trim_end_matches(".fq")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // AAA is unique to contaminant 0, GTG unique to 1, CCC shared.
    fn small_table() -> KmerTable {
        let mut table = KmerTable::new(3).unwrap();
        table.add_reference_seq(0, b"AAA");
        table.add_reference_seq(0, b"CCC");
        table.add_reference_seq(1, b"CCC");
        table.add_reference_seq(1, b"GTG");
        table
    }

    #[test]
    fn build_masks_and_totals() {
        let table = small_table();
        assert_eq!(table.n_contaminants(), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table.contaminant_kmers(), vec![2, 2]);
        let mut masks: Vec<u64> = table.masks().collect();
        masks.sort_unstable();
        assert_eq!(masks, vec![0b01, 0b10, 0b11]);
    }

    #[test]
    fn count_read_tallies_hits_and_uniques() {
        let table = small_table();
        let mut counts = HitCounts::new(2);
        // AAAT: k-mers AAA (hit, unique to 0) and AAT (miss).
        table.count_read(0, b"AAAT", &mut counts);
        assert_eq!(counts.kmers_loaded, 2);
        assert_eq!(counts.hits, vec![1, 0]);
        assert_eq!(counts.unique_hits, vec![1, 0]);
        assert_eq!(counts.contaminants_detected, 1);
    }

    #[test]
    fn shared_kmer_hits_both_but_is_not_unique() {
        let table = small_table();
        let mut counts = HitCounts::new(2);
        table.count_read(0, b"CCC", &mut counts);
        assert_eq!(counts.hits, vec![1, 1]);
        assert_eq!(counts.unique_hits, vec![0, 0]);
        assert_eq!(counts.contaminants_detected, 2);
    }

    #[test]
    fn seen_counts_track_mates_and_union() {
        let table = small_table();
        let mut counts = HitCounts::new(2);
        table.count_read(0, b"AAA", &mut counts);
        table.count_read(1, b"CCC", &mut counts);
        let seen = table.seen_counts();
        assert_eq!(seen.per_mate[0], vec![1, 0]);
        assert_eq!(seen.per_mate[1], vec![1, 1]);
        assert_eq!(seen.either, vec![2, 1]);
    }

    #[test]
    fn rejects_bad_k() {
        assert!(KmerTable::new(0).is_err());
        assert!(KmerTable::new(MAX_KMER_SIZE + 1).is_err());
    }
}
