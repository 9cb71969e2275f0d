use crate::core::io::open_reader;
use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;

const REFILL_BYTES: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FastxFormat {
    Fasta,
    Fastq,
}

#[derive(Clone, Debug, Default)]
pub struct Record {
    pub id: Vec<u8>,
    pub seq: Vec<u8>,
}

/// Buffered FASTA/FASTQ record reader. The format is detected from the first
/// record byte; FASTQ records are the usual four lines, FASTA sequences may
/// span any number of lines. Line endings may be LF or CRLF.
pub struct FastxReader {
    reader: Box<dyn Read + Send>,
    name: String,
    buf: Vec<u8>,
    start: usize,
    eof: bool,
    format: Option<FastxFormat>,
    held_header: Option<Vec<u8>>,
    records: u64,
}

impl FastxReader {
    pub fn open(path: &Path, threads: usize) -> Result<Self> {
        let reader = open_reader(path, threads)?;
        Ok(Self::from_reader(reader, &path.display().to_string()))
    }

    pub fn from_reader(reader: Box<dyn Read + Send>, name: &str) -> Self {
        Self {
            reader,
            name: name.to_string(),
            buf: Vec::new(),
            start: 0,
            eof: false,
            format: None,
            held_header: None,
            records: 0,
        }
    }

    fn fill(&mut self) -> Result<()> {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }
        let mut chunk = [0u8; REFILL_BYTES];
        let n = self
            .reader
            .read(&mut chunk)
            .with_context(|| format!("read error in {}", self.name))?;
        if n == 0 {
            self.eof = true;
        } else {
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    // Next line as a range into self.buf with the terminator trimmed.
    // The range is valid only until the next call on self.
    fn next_line(&mut self) -> Result<Option<(usize, usize)>> {
        loop {
            if let Some(pos) = memchr::memchr(b'\n', &self.buf[self.start..]) {
                let s = self.start;
                let mut e = s + pos;
                self.start = e + 1;
                if e > s && self.buf[e - 1] == b'\r' {
                    e -= 1;
                }
                return Ok(Some((s, e)));
            }
            if self.eof {
                if self.start < self.buf.len() {
                    let s = self.start;
                    let e = self.buf.len();
                    self.start = e;
                    return Ok(Some((s, e)));
                }
                return Ok(None);
            }
            self.fill()?;
        }
    }

    fn next_content_line(&mut self) -> Result<Option<(usize, usize)>> {
        loop {
            match self.next_line()? {
                None => return Ok(None),
                Some((s, e)) if s == e => continue,
                line => return Ok(line),
            }
        }
    }

    fn require_line(&mut self, what: &str) -> Result<(usize, usize)> {
        match self.next_line()? {
            Some(r) => Ok(r),
            None => bail!(
                "{}: record {} truncated (missing {} line)",
                self.name,
                self.records,
                what
            ),
        }
    }

    /// Read the next record into `rec`, reusing its buffers. Returns false at
    /// end of input.
    pub fn next_record(&mut self, rec: &mut Record) -> Result<bool> {
        rec.id.clear();
        rec.seq.clear();

        let header: Vec<u8> = match self.held_header.take() {
            Some(h) => h,
            None => match self.next_content_line()? {
                Some((s, e)) => self.buf[s..e].to_vec(),
                None => return Ok(false),
            },
        };
        self.records += 1;

        let format = match self.format {
            Some(f) => f,
            None => {
                let f = match header.first() {
                    Some(b'>') => FastxFormat::Fasta,
                    Some(b'@') => FastxFormat::Fastq,
                    _ => bail!("{}: not FASTA or FASTQ", self.name),
                };
                self.format = Some(f);
                f
            }
        };

        match format {
            FastxFormat::Fastq => self.read_fastq_tail(&header, rec),
            FastxFormat::Fasta => self.read_fasta_tail(&header, rec),
        }
    }

    fn read_fastq_tail(&mut self, header: &[u8], rec: &mut Record) -> Result<bool> {
        if header.first() != Some(&b'@') {
            bail!(
                "{}: record {} does not start with '@'",
                self.name,
                self.records
            );
        }
        set_id(&mut rec.id, &header[1..]);
        let (s, e) = self.require_line("sequence")?;
        rec.seq.extend_from_slice(&self.buf[s..e]);
        let (s, e) = self.require_line("separator")?;
        if self.buf[s..e].first() != Some(&b'+') {
            bail!(
                "{}: record {} has a malformed '+' line",
                self.name,
                self.records
            );
        }
        let (s, e) = self.require_line("quality")?;
        if e - s != rec.seq.len() {
            bail!(
                "{}: record {} quality length {} does not match sequence length {}",
                self.name,
                self.records,
                e - s,
                rec.seq.len()
            );
        }
        Ok(true)
    }

    fn read_fasta_tail(&mut self, header: &[u8], rec: &mut Record) -> Result<bool> {
        if header.first() != Some(&b'>') {
            bail!(
                "{}: record {} does not start with '>'",
                self.name,
                self.records
            );
        }
        set_id(&mut rec.id, &header[1..]);
        loop {
            match self.next_line()? {
                None => break,
                Some((s, e)) => {
                    if s == e {
                        continue;
                    }
                    if self.buf[s] == b'>' {
                        self.held_header = Some(self.buf[s..e].to_vec());
                        break;
                    }
                    rec.seq.extend_from_slice(&self.buf[s..e]);
                }
            }
        }
        Ok(true)
    }
}

fn set_id(out: &mut Vec<u8>, header: &[u8]) {
    let end = header
        .iter()
        .position(|&b| b == b' ' || b == b'\t')
        .unwrap_or(header.len());
    out.extend_from_slice(&header[..end]);
}
