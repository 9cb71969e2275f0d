use crate::core::stats::{OverallStats, pc};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the four similarity artifacts into `dir`. A file that cannot be
/// produced is reported on stderr and skipped; the run carries on.
pub fn write_all(dir: &Path, prefix: &str, stats: &OverallStats) {
    let path = dir.join(format!("{}kmer_similarity_absolute.txt", prefix));
    if let Err(e) = write_matrix(&path, stats, false) {
        eprintln!("warning: skipping {}: {:#}", path.display(), e);
    }

    let path = dir.join(format!("{}kmer_similarity_pc.txt", prefix));
    if let Err(e) = write_matrix(&path, stats, true) {
        eprintln!("warning: skipping {}: {:#}", path.display(), e);
    }

    let path = dir.join(format!("{}kmer_unique_absolute.txt", prefix));
    if let Err(e) = write_unique(&path, stats, false) {
        eprintln!("warning: skipping {}: {:#}", path.display(), e);
    }

    let path = dir.join(format!("{}kmer_unique_pc.txt", prefix));
    if let Err(e) = write_unique(&path, stats, true) {
        eprintln!("warning: skipping {}: {:#}", path.display(), e);
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).with_context(|| {
        format!("failed to create {}", path.display())
    })?))
}

// Percentages are relative to the row contaminant's reference k-mer count.
fn write_matrix(path: &Path, stats: &OverallStats, percentages: bool) -> Result<()> {
    let mut w = create(path)?;
    write!(w, "Contaminant")?;
    for c in &stats.contaminants {
        write!(w, "\t{}", c.id)?;
    }
    writeln!(w)?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        write!(w, "{}", c.id)?;
        for j in 0..stats.contaminants.len() {
            if percentages {
                write!(w, "\t{:.2}", pc(stats.kmers_in_common[i][j], c.kmers))?;
            } else {
                write!(w, "\t{}", stats.kmers_in_common[i][j])?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_unique(path: &Path, stats: &OverallStats, percentages: bool) -> Result<()> {
    let mut w = create(path)?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        if i > 0 {
            write!(w, "\t")?;
        }
        write!(w, "{}", c.id)?;
    }
    writeln!(w)?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        if i > 0 {
            write!(w, "\t")?;
        }
        if percentages {
            write!(w, "{:.2}", pc(stats.unique_kmers[i], c.kmers))?;
        } else {
            write!(w, "{}", stats.unique_kmers[i])?;
        }
    }
    writeln!(w)?;
    Ok(())
}
