use crate::core::fastq::{FastxReader, Record};
use crate::core::hits::HitCounts;
use crate::core::model::Thresholds;
use crate::core::stats::{PairCounters, ReadCounters, SharedStats};
use crate::core::table::KmerTable;
use anyhow::{Result, anyhow, bail};
use crossbeam_channel as channel;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

const BATCH_READS: usize = 512;

pub struct EngineConfig {
    pub reads1: PathBuf,
    pub reads2: Option<PathBuf>,
    pub threads: usize,
    pub thresholds: Thresholds,
}

#[derive(Debug)]
pub struct EngineOutput {
    pub read: [ReadCounters; 2],
    pub pair: PairCounters,
    /// Pairs whose advisory filter decision came back true.
    pub pairs_flagged: u64,
}

struct ReadPair {
    a: Record,
    b: Option<Record>,
}

fn read_pair(r1: &mut FastxReader, r2: Option<&mut FastxReader>) -> Result<Option<ReadPair>> {
    let mut a = Record::default();
    if !r1.next_record(&mut a)? {
        if let Some(r2) = r2 {
            let mut b = Record::default();
            if r2.next_record(&mut b)? {
                bail!("paired inputs are out of sync: the first file ended early");
            }
        }
        return Ok(None);
    }
    let b = match r2 {
        Some(r2) => {
            let mut b = Record::default();
            if !r2.next_record(&mut b)? {
                bail!("paired inputs are out of sync: the second file ended early");
            }
            Some(b)
        }
        None => None,
    };
    Ok(Some(ReadPair { a, b }))
}

/// Classify every read (pair) of the input against the table. One algorithm,
/// two execution modes: a single thread updates owned counters directly, more
/// than one goes through the mutex-wrapped `SharedStats`. The per-mate
/// seen-k-mer counts are folded in after all classification is done.
pub fn run(cfg: &EngineConfig, table: &Arc<KmerTable>) -> Result<EngineOutput> {
    let mut out = if cfg.threads <= 1 {
        run_serial(cfg, table)?
    } else {
        run_parallel(cfg, table)?
    };
    let seen = table.seen_counts();
    let [seen0, seen1] = seen.per_mate;
    out.read[0].contaminant_kmers_seen = seen0;
    out.read[1].contaminant_kmers_seen = seen1;
    out.pair.contaminant_kmers_seen = seen.either;
    Ok(out)
}

fn run_serial(cfg: &EngineConfig, table: &KmerTable) -> Result<EngineOutput> {
    let n = table.n_contaminants();
    let mut reader1 = FastxReader::open(&cfg.reads1, 1)?;
    let mut reader2 = match &cfg.reads2 {
        Some(path) => Some(FastxReader::open(path, 1)?),
        None => None,
    };

    let mut read = [ReadCounters::new(n), ReadCounters::new(n)];
    let mut pair = PairCounters::new(n);
    let mut counts_a = HitCounts::new(n);
    let mut counts_b = HitCounts::new(n);
    let mut pairs_flagged = 0u64;

    while let Some(p) = read_pair(&mut reader1, reader2.as_mut())? {
        table.count_read(0, &p.a.seq, &mut counts_a);
        read[0].update_read(&counts_a, cfg.thresholds.read);
        if let Some(b) = &p.b {
            table.count_read(1, &b.seq, &mut counts_b);
            read[1].update_read(&counts_b, cfg.thresholds.read);
            if pair.update_pair(&counts_a, &counts_b, &cfg.thresholds) {
                pairs_flagged += 1;
            }
        }
    }

    Ok(EngineOutput {
        read,
        pair,
        pairs_flagged,
    })
}

fn run_parallel(cfg: &EngineConfig, table: &Arc<KmerTable>) -> Result<EngineOutput> {
    let n = table.n_contaminants();
    let mut reader1 = FastxReader::open(&cfg.reads1, cfg.threads)?;
    let mut reader2 = match &cfg.reads2 {
        Some(path) => Some(FastxReader::open(path, cfg.threads)?),
        None => None,
    };

    let shared = Arc::new(SharedStats::new(n));
    let (batch_tx, batch_rx) = channel::bounded::<Vec<ReadPair>>(cfg.threads * 2);
    let (flag_tx, flag_rx) = channel::unbounded::<u64>();
    let (err_tx, err_rx) = channel::bounded::<anyhow::Error>(1);

    let producer = thread::spawn(move || {
        loop {
            let mut batch = Vec::with_capacity(BATCH_READS);
            loop {
                match read_pair(&mut reader1, reader2.as_mut()) {
                    Ok(Some(p)) => {
                        batch.push(p);
                        if batch.len() >= BATCH_READS {
                            break;
                        }
                    }
                    Ok(None) => {
                        if !batch.is_empty() {
                            let _ = batch_tx.send(batch);
                        }
                        return;
                    }
                    Err(e) => {
                        let _ = err_tx.send(e);
                        return;
                    }
                }
            }
            if batch_tx.send(batch).is_err() {
                return;
            }
        }
    });

    let mut workers = Vec::with_capacity(cfg.threads);
    for _ in 0..cfg.threads {
        let rx = batch_rx.clone();
        let tx = flag_tx.clone();
        let shared = Arc::clone(&shared);
        let table = Arc::clone(table);
        let thresholds = cfg.thresholds;
        workers.push(thread::spawn(move || {
            let n = table.n_contaminants();
            let mut counts_a = HitCounts::new(n);
            let mut counts_b = HitCounts::new(n);
            let mut flagged = 0u64;
            for batch in rx.iter() {
                for p in &batch {
                    table.count_read(0, &p.a.seq, &mut counts_a);
                    shared.record_read(0, &counts_a, thresholds.read);
                    if let Some(b) = &p.b {
                        table.count_read(1, &b.seq, &mut counts_b);
                        shared.record_read(1, &counts_b, thresholds.read);
                        if shared.record_pair(&counts_a, &counts_b, &thresholds) {
                            flagged += 1;
                        }
                    }
                }
            }
            let _ = tx.send(flagged);
        }));
    }
    drop(batch_rx);
    drop(flag_tx);

    producer
        .join()
        .map_err(|_| anyhow!("producer thread panicked"))?;
    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))?;
    }

    if let Ok(err) = err_rx.try_recv() {
        return Err(err);
    }

    let mut pairs_flagged = 0u64;
    for f in flag_rx.iter() {
        pairs_flagged += f;
    }

    // Every worker has joined, so the snapshot is the final state.
    let (read, pair) = shared.snapshot();
    Ok(EngineOutput {
        read,
        pair,
        pairs_flagged,
    })
}
