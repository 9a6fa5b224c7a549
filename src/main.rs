use std::fmt::Display;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use pagesim::paging::Vpn;
use pagesim::policy::{Fifo, Lru, MarkovPredictive, ReplacementPolicy};
use pagesim::simulator::{SimStats, Simulator};
use pagesim::trace::{self, TraceConfig};

#[derive(Parser)]
#[command(about = "Compare page-replacement policies on a memory access trace")]
struct Args {
    /// Trace file to replay (plain addresses, or CSV with the address in the
    /// fifth field). A synthetic locality-biased trace is generated if omitted.
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Frame pool capacity.
    #[arg(long, default_value_t = 50)]
    frames: usize,

    /// Page size used to turn byte addresses into page numbers.
    #[arg(long, default_value_t = 100)]
    page_size: u64,

    /// TLB capacity; 0 disables the translation cache.
    #[arg(long, default_value_t = 16)]
    tlb_size: usize,

    /// Which policy to run.
    #[arg(long, value_enum, default_value_t = PolicyChoice::All)]
    policy: PolicyChoice,

    /// Read at most this many lines from the trace file.
    #[arg(long, default_value_t = 100_000)]
    max_lines: usize,

    /// Synthetic trace length, when no trace file is given.
    #[arg(long, default_value_t = 5_000)]
    accesses: usize,

    /// Synthetic trace page count.
    #[arg(long, default_value_t = 100)]
    pages: u64,

    /// Save the synthetic trace to this file for later replay.
    #[arg(long)]
    save_trace: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyChoice {
    All,
    Fifo,
    Lru,
    Markov,
}

impl PolicyChoice {
    fn selects(self, other: PolicyChoice) -> bool {
        self == PolicyChoice::All || self == other
    }
}

impl Args {
    /// Trace file if given, otherwise a fresh synthetic trace.
    fn acquire_trace(&self) -> Option<Vec<Vpn>> {
        let Some(path) = &self.trace else {
            return Some(self.synthesize_trace());
        };
        match trace::load_trace(path, self.page_size, self.max_lines) {
            Ok(trace) => Some(trace),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }

    fn synthesize_trace(&self) -> Vec<Vpn> {
        let defaults = TraceConfig::default();
        let config = TraceConfig {
            accesses: self.accesses,
            pages: self.pages,
            working_set: defaults.working_set.min(self.pages),
            ..defaults
        };
        let addresses = trace::generate_trace(&config, self.page_size, &mut rand::rng());
        if let Some(path) = &self.save_trace {
            if let Err(err) = trace::write_trace(path, &addresses) {
                log::warn!("{err}");
            }
        }
        addresses
            .iter()
            .map(|addr| Vpn(addr / self.page_size))
            .collect()
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if args.frames == 0 || args.page_size == 0 || args.pages == 0 {
        log::error!("--frames, --page-size and --pages must be positive");
        std::process::exit(1);
    }

    let Some(trace) = args.acquire_trace() else {
        return;
    };
    if trace.is_empty() {
        log::warn!("empty trace, nothing to simulate");
        return;
    }

    print_header(&args, trace.len());

    if args.policy.selects(PolicyChoice::Fifo) {
        print_report("FIFO", run_simulation(&args, &trace, Fifo::new()));
    }
    if args.policy.selects(PolicyChoice::Lru) {
        print_report("LRU", run_simulation(&args, &trace, Lru::new()));
    }
    if args.policy.selects(PolicyChoice::Markov) {
        let mut markov = MarkovPredictive::new(trace.clone());
        markov.train(&trace);
        print_report("Markov", run_simulation(&args, &trace, markov));
    }
}

fn run_simulation<P: ReplacementPolicy>(args: &Args, trace: &[Vpn], policy: P) -> SimStats {
    let mut sim = Simulator::new(args.frames, args.tlb_size, policy);
    *sim.run(trace)
}

fn print_header(args: &Args, trace_len: usize) {
    print_row_header("## Conditions");
    print_row("Frame count", &args.frames);
    print_row("Page size", &args.page_size);
    print_row("TLB size", &args.tlb_size);
    print_row("Trace length", &trace_len);
    println!();
}

fn print_report(name: &str, stats: SimStats) {
    print_row_header(&format!("## Stats for the `{name}` policy"));
    print_row("Total accesses", &stats.total_accesses);
    print_row("TLB hits", &stats.tlb_hits);
    print_row("TLB misses", &stats.tlb_misses);
    print_row("Page hits", &stats.page_hits);
    print_row("Page faults", &stats.page_faults);
    print_row("TLB hit rate", &format!("{:.2}%", stats.tlb_hit_rate()));
    print_row("Page hit rate", &format!("{:.2}%", stats.page_hit_rate()));
    println!();
}

fn print_row_header(title: &str) {
    println!("{title}");
    println!("| {:<20} | {:<20} |", "Metric", "Value");
    println!("| {:-<20} | {:-<20} |", "-", "-");
}

fn print_row(label: &str, value: &dyn Display) {
    println!("| {label:<20} | {value:<20} |");
}
