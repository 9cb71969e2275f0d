use crate::cli::args::{Cli, Commands, ScreenArgs};
use crate::core::engine::{self, EngineConfig};
use crate::core::kmer::MAX_KMER_SIZE;
use crate::core::model::Thresholds;
use crate::core::similarity;
use crate::core::stats::OverallStats;
use crate::core::table;
use crate::report;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Screen(args) => run(args),
    }
}

fn run(args: ScreenArgs) -> Result<()> {
    let stats = stats_enabled();
    let t0 = Instant::now();

    stage(stats, "preflight", || {
        if !args.reads1.is_file() {
            bail!("input file not found: {}", args.reads1.display());
        }
        if let Some(reads2) = &args.reads2 {
            if !reads2.is_file() {
                bail!("input file not found: {}", reads2.display());
            }
        }
        for reference in &args.references {
            if !reference.is_file() {
                bail!("reference file not found: {}", reference.display());
            }
        }
        if args.threads == 0 {
            bail!("--threads must be >= 1");
        }
        if args.kmer_size == 0 || args.kmer_size > MAX_KMER_SIZE {
            bail!("--kmer-size must be between 1 and {}", MAX_KMER_SIZE);
        }
        Ok(())
    })?;

    let t_table = Instant::now();
    let (table, contaminants) =
        table::build_table(args.kmer_size, &args.references, args.threads)?;
    let table = Arc::new(table);
    stage_done(stats, "table-build", t_table);
    println!(
        "Loaded {} distinct {}-mers from {} reference(s)",
        table.len(),
        table.k(),
        contaminants.len()
    );

    let thresholds = Thresholds {
        read: args.read_threshold,
        overall: args.overall_threshold,
        filter_unique_only: args.filter_unique,
    };
    let input_files = if args.reads2.is_some() { 2 } else { 1 };

    let config = EngineConfig {
        reads1: args.reads1.clone(),
        reads2: args.reads2.clone(),
        threads: args.threads,
        thresholds,
    };

    let t_engine = Instant::now();
    let output = engine::run(&config, &table)?;
    stage_done(stats, "engine", t_engine);

    let mut overall = OverallStats::new(contaminants, input_files);
    overall.read = output.read;
    overall.pair = output.pair;

    if overall.n_contaminants() >= 2 {
        let t_similarity = Instant::now();
        let sim = similarity::compare_contaminants(&table);
        overall.kmers_in_common = sim.kmers_in_common;
        overall.unique_kmers = sim.unique_kmers;
        stage_done(stats, "similarity", t_similarity);
    }

    let summary = overall.finalize();

    let t_console = Instant::now();
    let stdout = std::io::stdout();
    report::console::print(&mut stdout.lock(), &overall, &summary, &thresholds)
        .with_context(|| "failed to write console report")?;
    stage_done(stats, "console", t_console);

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output dir {}", args.out.display()))?;

    let t_files = Instant::now();
    report::progress::write_all(&args.out, &overall, thresholds.read);
    if overall.n_contaminants() >= 2 {
        report::similarity_txt::write_all(&args.out, &args.prefix, &overall);
    }
    stage_done(stats, "output-files", t_files);

    if input_files == 2 {
        println!("\nPairs flagged for filtering: {}", output.pairs_flagged);
    }

    if stats {
        eprintln!("KSCREEN_STATS total={}", fmt_dur(t0.elapsed()));
    }

    Ok(())
}

fn stats_enabled() -> bool {
    matches!(env::var("KSCREEN_STATS").as_deref(), Ok("1"))
}

fn stage<F>(stats: bool, name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    if stats {
        eprintln!("KSCREEN_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
    res
}

fn stage_done(stats: bool, name: &str, t: Instant) {
    if stats {
        eprintln!("KSCREEN_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
