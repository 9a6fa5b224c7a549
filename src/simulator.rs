use crate::memory::FramePool;
use crate::paging::{PageTable, Vpn};
use crate::policy::ReplacementPolicy;
use crate::tlb::Tlb;

/// Access counters, each incremented exactly once per access on exactly one
/// of the four access paths.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SimStats {
    pub total_accesses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub page_hits: u64,
    pub page_faults: u64,
}

impl SimStats {
    pub fn tlb_hit_rate(&self) -> f64 {
        Self::rate(self.tlb_hits, self.total_accesses)
    }

    pub fn page_hit_rate(&self) -> f64 {
        Self::rate(self.page_hits, self.total_accesses)
    }

    fn rate(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            0.0
        } else {
            (part as f64 / whole as f64) * 100.0
        }
    }
}

/// Replays a page reference trace against a TLB, a page table and a bounded
/// frame pool, delegating eviction decisions to the configured policy.
///
/// A simulator (and its policy) is single-use: construct a fresh pair for
/// every comparison run so no recency or training state leaks between runs.
pub struct Simulator<P: ReplacementPolicy> {
    policy: P,
    memory: FramePool,
    page_table: PageTable,
    tlb: Tlb,
    stats: SimStats,
}

impl<P: ReplacementPolicy> Simulator<P> {
    pub fn new(num_frames: usize, tlb_size: usize, policy: P) -> Self {
        Self {
            policy,
            memory: FramePool::new(num_frames),
            page_table: PageTable::new(),
            tlb: Tlb::new(tlb_size),
            stats: SimStats::default(),
        }
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn run(&mut self, trace: &[Vpn]) -> &SimStats {
        log::info!("starting simulation over {} accesses", trace.len());
        for &vpn in trace {
            self.access(vpn);
        }
        log::info!(
            "simulation finished: {} faults, {} TLB hits",
            self.stats.page_faults,
            self.stats.tlb_hits
        );
        &self.stats
    }

    /// Resolves one reference through the four mutually exclusive paths:
    /// TLB hit, TLB miss + table hit, fault with a free frame, fault with
    /// eviction. The policy decides the victim before any pool, table or
    /// cache state changes; this function performs every mutation itself.
    pub fn access(&mut self, vpn: Vpn) {
        self.stats.total_accesses += 1;

        if self.tlb.lookup(vpn).is_some() {
            self.stats.tlb_hits += 1;
            self.stats.page_hits += 1;
            self.policy.page_accessed(vpn);
            return;
        }
        self.stats.tlb_misses += 1;

        if let Some(pfn) = self.page_table.lookup(vpn) {
            self.stats.page_hits += 1;
            self.policy.page_accessed(vpn);
            self.tlb.insert(vpn, pfn);
            return;
        }

        self.stats.page_faults += 1;
        if self.memory.is_full() {
            let victim = self.policy.choose_victim(self.memory.frames());
            let freed = self.memory.evict_page(victim);
            self.page_table.evict(victim);
            self.tlb.invalidate(victim);
            log::trace!("evicted page {victim} from frame {freed} for page {vpn}");
        }

        let pfn = self
            .memory
            .get_free_frame()
            .expect("a frame is free after fault handling");
        self.memory.load_page(vpn, pfn);
        self.page_table.update(vpn, pfn);
        self.tlb.insert(vpn, pfn);
        self.policy.page_loaded(vpn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Fifo, Lru, MarkovPredictive};

    fn trace(vpns: &[u64]) -> Vec<Vpn> {
        vpns.iter().map(|&v| Vpn(v)).collect()
    }

    fn run_fifo(num_frames: usize, tlb_size: usize, vpns: &[u64]) -> SimStats {
        let mut sim = Simulator::new(num_frames, tlb_size, Fifo::new());
        *sim.run(&trace(vpns))
    }

    #[test]
    fn counters_always_balance() {
        let vpns = [1, 2, 3, 1, 2, 4, 1, 5, 3, 2];
        let stats = run_fifo(3, 2, &vpns);

        assert_eq!(stats.total_accesses, vpns.len() as u64);
        assert_eq!(stats.tlb_hits + stats.tlb_misses, stats.total_accesses);
        assert_eq!(stats.page_hits + stats.page_faults, stats.total_accesses);
    }

    #[test]
    fn fifo_evicts_first_loaded_despite_hit() {
        // 1 and 2 fault in, the hit on 1 changes nothing for FIFO, so 3
        // evicts 1; the re-access of 1 faults again and evicts 2, so the
        // final access of 2 faults as well.
        let stats = run_fifo(2, 0, &[1, 2, 3, 1, 2]);
        assert_eq!(stats.page_faults, 5);
        assert_eq!(stats.page_hits, 0);
    }

    #[test]
    fn lru_keeps_recently_accessed_page() {
        // The hit on 1 makes 2 the LRU victim when 3 faults, so the final
        // state is {1, 3}.
        let mut sim = Simulator::new(2, 0, Lru::new());
        let stats = *sim.run(&trace(&[1, 2, 1, 3]));
        assert_eq!(stats.page_faults, 3);
        assert_eq!(stats.page_hits, 1);

        sim.access(Vpn(1));
        assert_eq!(sim.stats().page_hits, 2);
    }

    #[test]
    fn no_faults_once_working_set_is_resident() {
        let vpns = [1, 2, 3, 1, 2, 3, 3, 2, 1, 1];
        let stats = run_fifo(3, 2, &vpns);
        // Three compulsory faults, then hits forever.
        assert_eq!(stats.page_faults, 3);
        assert_eq!(stats.page_hits, 7);
    }

    #[test]
    fn pool_and_table_stay_bounded() {
        let vpns: Vec<u64> = (0..50).map(|i| i % 7).collect();
        let mut sim = Simulator::new(4, 2, Fifo::new());
        for &v in &vpns {
            sim.access(Vpn(v));
            assert!(sim.memory.occupied() <= 4);
            assert_eq!(sim.page_table.len(), sim.memory.occupied());
            assert!(sim.tlb.len() <= 2);
        }
    }

    #[test]
    fn eviction_invalidates_tlb_entry() {
        // With one frame, 2 evicts 1. A stale TLB entry for 1 would turn the
        // third access into a TLB hit; it must fault instead.
        let stats = {
            let mut sim = Simulator::new(1, 4, Fifo::new());
            *sim.run(&trace(&[1, 2, 1]))
        };
        assert_eq!(stats.page_faults, 3);
        assert_eq!(stats.tlb_hits, 0);
    }

    #[test]
    fn tlb_size_only_shifts_hit_attribution() {
        let vpns: Vec<u64> = (0..200).map(|i| (i * 7) % 13).collect();
        let cached = run_fifo(5, 4, &vpns);
        let uncached = run_fifo(5, 0, &vpns);

        assert_eq!(cached.page_faults, uncached.page_faults);
        assert_eq!(cached.page_hits, uncached.page_hits);
        assert_eq!(uncached.tlb_hits, 0);
        assert_eq!(uncached.tlb_misses, uncached.total_accesses);
    }

    #[test]
    fn identical_runs_are_identical() {
        let vpns: Vec<u64> = (0..500).map(|i| (i * 31) % 17).collect();
        assert_eq!(run_fifo(6, 3, &vpns), run_fifo(6, 3, &vpns));
    }

    #[test]
    fn markov_run_stays_consistent() {
        let vpns = trace(&[1, 2, 3, 1, 2, 4, 1, 2, 3, 4, 1]);
        let mut policy = MarkovPredictive::new(vpns.clone());
        policy.train(&vpns);

        let mut sim = Simulator::new(2, 2, policy);
        let stats = *sim.run(&vpns);
        assert_eq!(stats.total_accesses, vpns.len() as u64);
        assert_eq!(stats.page_hits + stats.page_faults, stats.total_accesses);
        assert!(sim.memory.occupied() <= 2);
    }
}
