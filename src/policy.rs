use std::collections::VecDeque;

use lru::LruCache;
use rustc_hash::FxHashMap;

use crate::paging::Vpn;

/// Page-replacement strategy. The simulator consults `choose_victim` only
/// when the frame pool is full, strictly before it mutates any pool or table
/// state; all residency changes are carried out by the simulator and reported
/// back through `page_loaded` and `page_accessed`.
pub trait ReplacementPolicy {
    /// Picks a resident page to evict. `frames` is the pool contents in
    /// frame-id order and holds at least one resident page.
    fn choose_victim(&mut self, frames: &[Option<Vpn>]) -> Vpn;

    /// Called after `vpn` has been placed into a frame.
    fn page_loaded(&mut self, vpn: Vpn);

    /// Called on a hit. Order-insensitive policies ignore it.
    fn page_accessed(&mut self, _vpn: Vpn) {}
}

/// First-in, first-out: evicts the oldest-loaded page, regardless of how
/// recently it was accessed.
pub struct Fifo {
    queue: VecDeque<Vpn>,
}

impl Fifo {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl Default for Fifo {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacementPolicy for Fifo {
    fn choose_victim(&mut self, _frames: &[Option<Vpn>]) -> Vpn {
        self.queue
            .pop_front()
            .expect("victim requested but no page was ever loaded")
    }

    fn page_loaded(&mut self, vpn: Vpn) {
        self.queue.push_back(vpn);
    }
}

/// Least-recently-used: evicts the resident page whose last load or access
/// is oldest. Backed by `lru::LruCache` so a hit is an O(1) move-to-front
/// rather than a linear remove-and-reinsert.
pub struct Lru {
    order: LruCache<Vpn, ()>,
}

impl Lru {
    pub fn new() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }
}

impl Default for Lru {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacementPolicy for Lru {
    fn choose_victim(&mut self, _frames: &[Option<Vpn>]) -> Vpn {
        self.order
            .pop_lru()
            .expect("victim requested but no page was ever loaded")
            .0
    }

    fn page_loaded(&mut self, vpn: Vpn) {
        self.order.put(vpn, ());
    }

    fn page_accessed(&mut self, vpn: Vpn) {
        self.order.promote(&vpn);
    }
}

/// Predictive policy backed by a first-order Markov chain over the page
/// reference stream. Trained offline on the full trace; at eviction time it
/// evicts the resident page the model considers least likely to follow the
/// most recent reference.
pub struct MarkovPredictive {
    pages: Vec<Vpn>,
    index: FxHashMap<Vpn, usize>,
    /// Row-major `|P| x |P|` transition matrix; row `i` is either all zero
    /// (no observed outgoing transition) or L1-normalized.
    matrix: Vec<f64>,
    last: Option<Vpn>,
}

impl MarkovPredictive {
    /// `all_pages` is the set of distinct pages the model can condition on,
    /// typically every distinct page in the training trace.
    pub fn new(mut all_pages: Vec<Vpn>) -> Self {
        all_pages.sort_unstable();
        all_pages.dedup();
        let index = all_pages
            .iter()
            .enumerate()
            .map(|(i, &vpn)| (vpn, i))
            .collect();
        let n = all_pages.len();
        Self {
            pages: all_pages,
            index,
            matrix: vec![0.0; n * n],
            last: None,
        }
    }

    /// Builds the transition count matrix from every consecutive pair in
    /// `trace`, then normalizes each row into a probability distribution.
    /// Pairs involving a page outside the model's page set are ignored.
    pub fn train(&mut self, trace: &[Vpn]) {
        log::info!("training Markov model on {} accesses", trace.len());
        let n = self.pages.len();
        for pair in trace.windows(2) {
            if let (Some(&i), Some(&j)) = (self.index.get(&pair[0]), self.index.get(&pair[1])) {
                self.matrix[i * n + j] += 1.0;
            }
        }
        for row in self.matrix.chunks_mut(n) {
            let sum: f64 = row.iter().sum();
            if sum > 0.0 {
                for p in row {
                    *p /= sum;
                }
            }
        }
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// Probability that `to` follows `from`; zero for pages the model never
    /// saw during training.
    pub fn transition_prob(&self, from: Vpn, to: Vpn) -> f64 {
        match (self.index.get(&from), self.index.get(&to)) {
            (Some(&i), Some(&j)) => self.matrix[i * self.pages.len() + j],
            _ => 0.0,
        }
    }

    fn first_resident(frames: &[Option<Vpn>]) -> Vpn {
        frames
            .iter()
            .flatten()
            .next()
            .copied()
            .expect("victim requested from an empty frame pool")
    }
}

impl ReplacementPolicy for MarkovPredictive {
    fn choose_victim(&mut self, frames: &[Option<Vpn>]) -> Vpn {
        // Without history (or with a last page the model never saw) there is
        // nothing to condition on; evict the first resident page.
        let Some(last) = self.last else {
            return Self::first_resident(frames);
        };
        if !self.index.contains_key(&last) {
            return Self::first_resident(frames);
        }

        // Strict `<` keeps the earliest frame on ties, which also makes the
        // all-zero-probability case collapse to the first resident page.
        let mut best: Option<(f64, Vpn)> = None;
        for &vpn in frames.iter().flatten() {
            let prob = self.transition_prob(last, vpn);
            if best.is_none_or(|(min, _)| prob < min) {
                best = Some((prob, vpn));
            }
        }
        best.expect("victim requested from an empty frame pool").1
    }

    fn page_loaded(&mut self, vpn: Vpn) {
        self.last = Some(vpn);
    }

    fn page_accessed(&mut self, vpn: Vpn) {
        self.last = Some(vpn);
    }
}
