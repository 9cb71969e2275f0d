/// Contaminant membership is a u64 bitmask per k-mer, so at most 64 references.
pub const MAX_CONTAMINANTS: usize = 64;

/// Buckets in the loaded-kmers-per-read histogram. The last bucket accumulates
/// every read whose loaded k-mer count exceeds the capacity.
pub const MAX_READ_LENGTH: usize = 1000;

/// One screened reference genome. Immutable once the table is built.
#[derive(Clone, Debug)]
pub struct Contaminant {
    pub id: String,
    /// Distinct k-mers in the reference, shared ones included.
    pub kmers: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    /// Minimum hit count required in each mate of a pair.
    pub read: u32,
    /// Minimum combined hit count required across the pair.
    pub overall: u32,
    /// When set, only the unique-kmer tier may flag a pair for filtering.
    pub filter_unique_only: bool,
}
