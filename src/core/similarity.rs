use crate::core::table::KmerTable;

pub struct Similarity {
    /// Symmetric n x n co-occurrence matrix. The diagonal counts every k-mer
    /// of the contaminant, shared ones included.
    pub kmers_in_common: Vec<Vec<u64>>,
    /// K-mers belonging to exactly one contaminant.
    pub unique_kmers: Vec<u64>,
}

/// Single pass over every stored k-mer's membership mask, building the
/// co-occurrence matrix and the unique-k-mer counts together. The table is
/// read-only here; callers run this outside (or after) read processing and
/// only when at least two contaminants are loaded.
pub fn compare_contaminants(table: &KmerTable) -> Similarity {
    let n = table.n_contaminants();
    let mut kmers_in_common = vec![vec![0u64; n]; n];
    let mut unique_kmers = vec![0u64; n];

    for mask in table.masks() {
        if mask.count_ones() == 1 {
            unique_kmers[mask.trailing_zeros() as usize] += 1;
        }
        for i in 0..n {
            if mask & (1 << i) == 0 {
                continue;
            }
            for j in i..n {
                if mask & (1 << j) == 0 {
                    continue;
                }
                kmers_in_common[i][j] += 1;
                if i != j {
                    kmers_in_common[j][i] += 1;
                }
            }
        }
    }

    Similarity {
        kmers_in_common,
        unique_kmers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_and_unique_kmers_counted() {
        // Memberships {0}, {0,1}, {1}: AAA only in the first reference, GTG
        // only in the second, CCC in both.
        let mut table = KmerTable::new(3).unwrap();
        table.add_reference_seq(0, b"AAA");
        table.add_reference_seq(0, b"CCC");
        table.add_reference_seq(1, b"CCC");
        table.add_reference_seq(1, b"GTG");

        let sim = compare_contaminants(&table);
        assert_eq!(sim.kmers_in_common, vec![vec![2, 1], vec![1, 2]]);
        assert_eq!(sim.unique_kmers, vec![1, 1]);
    }

    #[test]
    fn disjoint_references_share_nothing() {
        let mut table = KmerTable::new(3).unwrap();
        table.add_reference_seq(0, b"AAA");
        table.add_reference_seq(1, b"GTG");
        let sim = compare_contaminants(&table);
        assert_eq!(sim.kmers_in_common, vec![vec![1, 0], vec![0, 1]]);
        assert_eq!(sim.unique_kmers, vec![1, 1]);
    }
}
