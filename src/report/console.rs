use crate::core::model::Thresholds;
use crate::core::stats::{OverallStats, ReadSummary, ScreenSummary};
use anyhow::Result;
use std::io::Write;

/// Human-readable run summary. A pure consumer of finalized statistics.
pub fn print<W: Write>(
    w: &mut W,
    stats: &OverallStats,
    summary: &ScreenSummary,
    thresholds: &Thresholds,
) -> Result<()> {
    writeln!(
        w,
        "\nThreshold: at least {} k-mers in each read and at least {} in pair",
        thresholds.read, thresholds.overall
    )?;

    for r in 0..stats.input_files {
        writeln!(w, "\n========== Statistics for Read {} ==========\n", r + 1)?;
        print_read_stats(w, stats, &summary.read[r], r, thresholds)?;
    }
    print_read_key(w, thresholds)?;

    if stats.input_files == 2 {
        writeln!(w, "\n========== Statistics for both reads ==========\n")?;
        print_pair_stats(w, stats, summary)?;
        print_pair_key(w)?;
    }

    Ok(())
}

fn print_read_stats<W: Write>(
    w: &mut W,
    stats: &OverallStats,
    summary: &ReadSummary,
    r: usize,
    thresholds: &Thresholds,
) -> Result<()> {
    let read = &stats.read[r];

    writeln!(w, "Overall statistics\n")?;
    writeln!(w, "{:>52}: {}", "Number of reads", read.number_of_reads)?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %",
        "Number of reads with 1+ k-mer contamination", read.k1_reads, summary.k1_reads_pc
    )?;
    if thresholds.read != 1 {
        writeln!(
            w,
            "{:>52}: {}\t{:.2} %",
            format!(
                "Number of reads with {}+ k-mer contamination",
                thresholds.read
            ),
            read.kn_reads,
            summary.kn_reads_pc
        )?;
    }

    writeln!(w, "\nPer-contaminant statistics\n")?;
    writeln!(
        w,
        "{:<30} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10}",
        "Contaminant",
        "nKmers",
        "kFound",
        "%kFound",
        "ReadsW1k",
        "%ReadsW1k",
        "UniqW1k",
        "%UniqW1k",
        "ReadsWnk",
        "%ReadsWnk",
        "UniqWnk",
        "%UniqWnk",
        "Assigned",
        "%Assigned"
    )?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        writeln!(
            w,
            "{:<30} {:<10} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2}",
            c.id,
            c.kmers,
            read.contaminant_kmers_seen[i],
            summary.contaminant_kmers_seen_pc[i],
            read.k1_reads_by_contaminant[i],
            summary.k1_by_contaminant_pc[i],
            read.k1_unique_reads_by_contaminant[i],
            summary.k1_unique_by_contaminant_pc[i],
            read.kn_reads_by_contaminant[i],
            summary.kn_by_contaminant_pc[i],
            read.kn_unique_reads_by_contaminant[i],
            summary.kn_unique_by_contaminant_pc[i],
            read.assigned_reads_by_contaminant[i],
            summary.assigned_by_contaminant_pc[i]
        )?;
    }
    writeln!(
        w,
        "{:<30} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10.2}",
        "Unclassified",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        read.reads_unclassified,
        summary.unclassified_pc
    )?;

    Ok(())
}

fn print_read_key<W: Write>(w: &mut W, thresholds: &Thresholds) -> Result<()> {
    let n = thresholds.read;
    writeln!(w, "\n========== Key ==========\n")?;
    writeln!(w, "nKmers    - Number of k-mers in contaminant reference")?;
    writeln!(
        w,
        "kFound    - Number of distinct contaminant k-mers found in reads"
    )?;
    writeln!(
        w,
        "%kFound   - Percentage of contaminant k-mers found in reads"
    )?;
    writeln!(
        w,
        "ReadsW1k  - Reads containing 1 or more k-mer from the contaminant"
    )?;
    writeln!(
        w,
        "%ReadsW1k - Percentage of reads containing 1 or more k-mer from the contaminant"
    )?;
    writeln!(
        w,
        "UniqW1k   - Reads containing 1 or more k-mer from the contaminant and not any other"
    )?;
    writeln!(
        w,
        "%UniqW1k  - Percentage of reads containing 1 or more k-mer from the contaminant and not any other"
    )?;
    writeln!(
        w,
        "ReadsWnk  - Reads containing n or more k-mer from the contaminant (n={})",
        n
    )?;
    writeln!(
        w,
        "%ReadsWnk - Percentage of reads containing n or more k-mer from the contaminant (n={})",
        n
    )?;
    writeln!(
        w,
        "UniqWnk   - Reads containing n or more k-mer from the contaminant and not any other (n={})",
        n
    )?;
    writeln!(
        w,
        "%UniqWnk  - Percentage of reads containing n or more k-mer from the contaminant and not any other (n={})",
        n
    )?;
    writeln!(w, "Assigned  - Reads assigned to this contaminant")?;
    writeln!(
        w,
        "%Assigned - Percentage of reads assigned to this contaminant"
    )?;
    Ok(())
}

fn print_pair_stats<W: Write>(
    w: &mut W,
    stats: &OverallStats,
    summary: &ScreenSummary,
) -> Result<()> {
    let pair = &stats.pair;
    let ps = &summary.pair;

    writeln!(w, "Overall statistics\n")?;
    writeln!(w, "{:>52}: {}\n", "Number of pairs", pair.number_of_pairs)?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %",
        "Pairs meeting threshold (all k-mers)", pair.threshold_passed, ps.threshold_passed_pc
    )?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %",
        "Remaining pairs with at least 1 k-mer in each",
        pair.k1_both_not_threshold,
        ps.k1_both_not_threshold_pc
    )?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %\n",
        "Remaining pairs with at least 1 k-mer in either",
        pair.k1_either_not_threshold,
        ps.k1_either_not_threshold_pc
    )?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %",
        "Pairs meeting threshold (unique k-mers only)",
        pair.threshold_passed_unique,
        ps.threshold_passed_unique_pc
    )?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %",
        "Remaining pairs with at least 1 unique k-mer in each",
        pair.k1_both_not_threshold_unique,
        ps.k1_both_not_threshold_unique_pc
    )?;
    writeln!(
        w,
        "{:>52}: {}\t{:.2} %",
        "Remaining pairs with at least 1 unique k-mer in either",
        pair.k1_either_not_threshold_unique,
        ps.k1_either_not_threshold_unique_pc
    )?;

    writeln!(w, "\nPer-contaminant statistics\n")?;
    writeln!(
        w,
        "{:<30} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10}",
        "Contaminant",
        "nKmers",
        "kFound",
        "%kFound",
        "PairsThr",
        "%PairsThr",
        "BothW1k",
        "%BothW1k",
        "EithW1k",
        "%EithW1k",
        "UniqThr",
        "%UniqThr",
        "UniqB1k",
        "%UniqB1k",
        "UniqE1k",
        "%UniqE1k"
    )?;
    for (i, c) in stats.contaminants.iter().enumerate() {
        writeln!(
            w,
            "{:<30} {:<10} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2} {:<10} {:<10.2}",
            c.id,
            c.kmers,
            pair.contaminant_kmers_seen[i],
            ps.contaminant_kmers_seen_pc[i],
            pair.threshold_passed_by_contaminant[i],
            ps.threshold_passed_by_contaminant_pc[i],
            pair.k1_both_not_threshold_by_contaminant[i],
            ps.k1_both_not_threshold_by_contaminant_pc[i],
            pair.k1_either_not_threshold_by_contaminant[i],
            ps.k1_either_not_threshold_by_contaminant_pc[i],
            pair.threshold_passed_unique_by_contaminant[i],
            ps.threshold_passed_unique_by_contaminant_pc[i],
            pair.k1_both_not_threshold_unique_by_contaminant[i],
            ps.k1_both_not_threshold_unique_by_contaminant_pc[i],
            pair.k1_either_not_threshold_unique_by_contaminant[i],
            ps.k1_either_not_threshold_unique_by_contaminant_pc[i]
        )?;
    }

    Ok(())
}

fn print_pair_key<W: Write>(w: &mut W) -> Result<()> {
    writeln!(w, "\n========== Key ==========\n")?;
    writeln!(w, "nKmers    - Number of k-mers in contaminant reference")?;
    writeln!(
        w,
        "kFound    - Number of distinct contaminant k-mers found in either mate"
    )?;
    writeln!(
        w,
        "%kFound   - Percentage of contaminant k-mers found in either mate"
    )?;
    writeln!(w, "PairsThr  - Pairs passing threshold")?;
    writeln!(w, "%PairsThr - Percentage of pairs passing threshold")?;
    writeln!(
        w,
        "BothW1k   - Pairs not passing threshold, but containing 1 or more k-mer in both mates"
    )?;
    writeln!(
        w,
        "%BothW1k  - Percentage of pairs not passing threshold, but containing 1 or more k-mer in both mates"
    )?;
    writeln!(
        w,
        "EithW1k   - Pairs not passing threshold, but containing 1 or more k-mer in either mate"
    )?;
    writeln!(
        w,
        "%EithW1k  - Percentage of pairs not passing threshold, but containing 1 or more k-mer in either mate"
    )?;
    writeln!(
        w,
        "UniqThr/UniqB1k/UniqE1k - The same three tiers computed on unique k-mers only"
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hits::HitCounts;
    use crate::core::model::Contaminant;

    #[test]
    fn report_covers_both_mates_and_pair_table() {
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
        let mut stats = OverallStats::new(contaminants, 2);
        let mut h = HitCounts::new(2);
        h.kmers_loaded = 5;
        h.hits[0] = 3;
        h.contaminants_detected = 1;
        stats.read[0].update_read(&h, 2);
        stats.read[1].update_read(&h, 2);

        let summary = stats.finalize();
        let thresholds = Thresholds {
            read: 2,
            overall: 4,
            filter_unique_only: false,
        };

        let mut out = Vec::new();
        print(&mut out, &stats, &summary, &thresholds).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Statistics for Read 1"));
        assert!(text.contains("Statistics for Read 2"));
        assert!(text.contains("Statistics for both reads"));
        assert!(text.contains("phix"));
        assert!(text.contains("ecoli"));
        assert!(text.contains("Unclassified"));
        assert!(text.contains("Number of reads with 2+ k-mer contamination"));
    }

    #[test]
    fn single_end_report_omits_pair_table() {
        let contaminants = vec![Contaminant {
            id: "phix".into(),
            kmers: 10,
        }];
        let stats = OverallStats::new(contaminants, 1);
        let summary = stats.finalize();
        let thresholds = Thresholds {
            read: 1,
            overall: 2,
            filter_unique_only: false,
        };

        let mut out = Vec::new();
        print(&mut out, &stats, &summary, &thresholds).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Statistics for Read 1"));
        assert!(!text.contains("Statistics for Read 2"));
        assert!(!text.contains("Statistics for both reads"));
        // Threshold of 1 folds the N-hit line into the 1-hit line.
        assert_eq!(text.matches("k-mer contamination").count(), 1);
    }
}
