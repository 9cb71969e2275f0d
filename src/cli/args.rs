use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kscreen", version, about = "K-mer contamination screening for FASTA/FASTQ reads")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Screen(ScreenArgs),
}

#[derive(Parser)]
pub struct ScreenArgs {
    /// Reads to screen (read 1 for paired-end input).
    pub reads1: PathBuf,

    /// Read 2 for paired-end input.
    pub reads2: Option<PathBuf>,

    /// Contaminant reference (FASTA or FASTQ), one per contaminant; repeatable.
    #[arg(long = "reference", required = true)]
    pub references: Vec<PathBuf>,

    /// Directory for similarity and progress files.
    #[arg(long)]
    pub out: PathBuf,

    /// Prefix for the similarity file names.
    #[arg(long, default_value = "")]
    pub prefix: String,

    #[arg(long, default_value_t = 21)]
    pub kmer_size: usize,

    /// Minimum k-mer hits required in each read of a pair.
    #[arg(long, default_value_t = 10)]
    pub read_threshold: u32,

    /// Minimum combined k-mer hits required across a pair.
    #[arg(long, default_value_t = 20)]
    pub overall_threshold: u32,

    /// Flag pairs for filtering only on the unique-kmer tier.
    #[arg(long, default_value_t = false)]
    pub filter_unique: bool,

    #[arg(long, default_value_t = num_cpus::get())]
    pub threads: usize,
}
