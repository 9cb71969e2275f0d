use crate::core::stats::OverallStats;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the per-mate progress files into `dir`. A file that cannot be
/// produced is reported on stderr and skipped; the run carries on.
pub fn write_all(dir: &Path, stats: &OverallStats, read_threshold: u32) {
    for r in 0..stats.input_files {
        let path = dir.join(format!("data_overall_r{}.txt", r + 1));
        if let Err(e) = write_overall(&path, stats, r, read_threshold) {
            eprintln!("warning: skipping {}: {:#}", path.display(), e);
        }

        let path = dir.join(format!("data_per_contaminant_r{}.txt", r + 1));
        if let Err(e) = write_per_contaminant(&path, stats, r) {
            eprintln!("warning: skipping {}: {:#}", path.display(), e);
        }

        let path = dir.join(format!("largest_contaminant_r{}.txt", r + 1));
        if let Err(e) = write_largest(&path, stats, r) {
            eprintln!("warning: skipping {}: {:#}", path.display(), e);
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).with_context(|| {
        format!("failed to create {}", path.display())
    })?))
}

fn write_overall(path: &Path, stats: &OverallStats, r: usize, read_threshold: u32) -> Result<()> {
    let read = &stats.read[r];
    let mut w = create(path)?;
    writeln!(w, "name\tvalue")?;
    writeln!(w, "Number of reads\t{}", read.number_of_reads)?;
    writeln!(w, "Number with k1 contaminants\t{}", read.k1_reads)?;
    writeln!(
        w,
        "Number with k{} contaminants\t{}",
        read_threshold, read.kn_reads
    )?;
    Ok(())
}

fn write_per_contaminant(path: &Path, stats: &OverallStats, r: usize) -> Result<()> {
    let read = &stats.read[r];
    let mut w = create(path)?;
    writeln!(w, "name\tvalue")?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        writeln!(w, "{}\t{}", c.id, read.kn_reads_by_contaminant[i])?;
    }
    Ok(())
}

fn write_largest(path: &Path, stats: &OverallStats, r: usize) -> Result<()> {
    let read = &stats.read[r];
    let mut w = create(path)?;
    writeln!(w, "name\tvalue")?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        writeln!(w, "{}\t{}", c.id, read.assigned_reads_by_contaminant[i])?;
    }
    writeln!(w, "Unclassified\t{}", read.reads_unclassified)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Contaminant;
    use std::fs;

    fn stats() -> OverallStats {
        let contaminants = vec![
            Contaminant {
                id: "phix".into(),
                kmers: 10,
            },
            Contaminant {
                id: "ecoli".into(),
                kmers: 20,
            },
        ];
        let mut s = OverallStats::new(contaminants, 1);
        s.read[0].number_of_reads = 4;
        s.read[0].k1_reads = 3;
        s.read[0].kn_reads = 2;
        s.read[0].kn_reads_by_contaminant = vec![2, 0];
        s.read[0].assigned_reads_by_contaminant = vec![2, 1];
        s.read[0].reads_unclassified = 1;
        s
    }

    #[test]
    fn progress_files_have_expected_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path(), &stats(), 10);

        let overall = fs::read_to_string(dir.path().join("data_overall_r1.txt")).unwrap();
        assert_eq!(
            overall,
            "name\tvalue\nNumber of reads\t4\nNumber with k1 contaminants\t3\nNumber with k10 contaminants\t2\n"
        );

        let per = fs::read_to_string(dir.path().join("data_per_contaminant_r1.txt")).unwrap();
        assert_eq!(per, "name\tvalue\nphix\t2\necoli\t0\n");

        let largest = fs::read_to_string(dir.path().join("largest_contaminant_r1.txt")).unwrap();
        assert_eq!(
            largest,
            "name\tvalue\nphix\t2\necoli\t1\nUnclassified\t1\n"
        );

        // Single-end input: no read-2 files.
        assert!(!dir.path().join("data_overall_r2.txt").exists());
    }

    #[test]
    fn unwritable_directory_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_subdir");
        // Must not panic or abort the run.
        write_all(&missing, &stats(), 10);
        assert!(!missing.exists());
    }
}
