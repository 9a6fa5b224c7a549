use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

use crate::paging::Vpn;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace file `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk trace flavors: one decimal byte-address per line, or CSV records
/// with the address in the fifth field (MSR Cambridge block traces).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TraceFormat {
    Plain,
    Csv,
}

impl TraceFormat {
    pub fn from_path(path: &Path) -> Self {
        let csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if csv {
            TraceFormat::Csv
        } else {
            TraceFormat::Plain
        }
    }
}

/// Loads at most `max_lines` references from `path`, converting each byte
/// address to a page number. Malformed or short lines are skipped.
pub fn load_trace(path: &Path, page_size: u64, max_lines: usize) -> Result<Vec<Vpn>, TraceError> {
    let io_err = |source| TraceError::Io {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let format = TraceFormat::from_path(path);
    let trace = parse_trace(BufReader::new(file), format, page_size, max_lines).map_err(io_err)?;
    log::info!("loaded {} accesses from {}", trace.len(), path.display());
    Ok(trace)
}

pub fn parse_trace<R: BufRead>(
    reader: R,
    format: TraceFormat,
    page_size: u64,
    max_lines: usize,
) -> io::Result<Vec<Vpn>> {
    let mut trace = Vec::new();
    for line in reader.lines().take(max_lines) {
        let line = line?;
        let address = match format {
            TraceFormat::Plain => line.trim().parse::<u64>().ok(),
            TraceFormat::Csv => csv_address(&line),
        };
        if let Some(address) = address {
            trace.push(Vpn(address / page_size));
        }
    }
    Ok(trace)
}

fn csv_address(line: &str) -> Option<u64> {
    line.split(',').nth(4)?.trim().parse().ok()
}

/// Knobs for the synthetic locality-biased generator. With probability
/// `locality` an access lands inside the current working set; the working
/// set slides to a random position every `shift_every` accesses.
#[derive(Clone, Copy, Debug)]
pub struct TraceConfig {
    pub accesses: usize,
    pub pages: u64,
    pub working_set: u64,
    pub shift_every: usize,
    pub locality: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            accesses: 5_000,
            pages: 100,
            working_set: 10,
            shift_every: 500,
            locality: 0.85,
        }
    }
}

/// Generates raw byte addresses with locality of reference. The addresses go
/// through the same page-number conversion as a loaded trace.
pub fn generate_trace(config: &TraceConfig, page_size: u64, rng: &mut impl Rng) -> Vec<u64> {
    let mut working_set_start = 0;
    let mut trace = Vec::with_capacity(config.accesses);

    for i in 0..config.accesses {
        if i > 0 && i % config.shift_every == 0 {
            working_set_start = rng.random_range(0..=config.pages - config.working_set);
            log::debug!("working set shifted to page {working_set_start}");
        }

        let page = if rng.random_bool(config.locality) {
            working_set_start + rng.random_range(0..config.working_set)
        } else {
            rng.random_range(0..config.pages)
        };
        trace.push(page * page_size + rng.random_range(0..page_size));
    }
    trace
}

/// Writes addresses one per line, in the plain trace format.
pub fn write_trace(path: &Path, addresses: &[u64]) -> Result<(), TraceError> {
    let io_err = |source| TraceError::Io {
        path: path.to_owned(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    for address in addresses {
        writeln!(out, "{address}").map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}
