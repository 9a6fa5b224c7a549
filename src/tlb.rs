use std::num::NonZeroUsize;

use lru::LruCache;

use crate::paging::{Pfn, Vpn};

/// Fully-associative translation cache in front of the page table, with its
/// own LRU eviction independent of the page-replacement policy.
///
/// A size of zero disables the cache entirely: every lookup misses and
/// inserts are dropped, so the page table absorbs all translation work.
pub struct Tlb {
    cache: Option<LruCache<Vpn, Pfn>>,
}

impl Tlb {
    pub fn new(size: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(size).map(LruCache::new),
        }
    }

    /// On a hit the entry becomes most-recently-used; a miss mutates nothing.
    pub fn lookup(&mut self, vpn: Vpn) -> Option<Pfn> {
        self.cache.as_mut().and_then(|c| c.get(&vpn).copied())
    }

    /// Inserts or refreshes the translation as most-recently-used, evicting
    /// the least-recently-used entry if the cache is at capacity.
    pub fn insert(&mut self, vpn: Vpn, pfn: Pfn) {
        if let Some(cache) = self.cache.as_mut() {
            cache.put(vpn, pfn);
        }
    }

    /// Drops any entry for `vpn`. Must be called whenever the page leaves the
    /// frame pool, so the cache never serves a stale translation.
    pub fn invalidate(&mut self, vpn: Vpn) {
        if let Some(cache) = self.cache.as_mut() {
            cache.pop(&vpn);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut tlb = Tlb::new(2);
        tlb.insert(Vpn(1), Pfn(0));
        tlb.insert(Vpn(2), Pfn(1));

        // Touching 1 makes 2 the LRU entry.
        assert_eq!(tlb.lookup(Vpn(1)), Some(Pfn(0)));
        tlb.insert(Vpn(3), Pfn(2));

        assert_eq!(tlb.lookup(Vpn(2)), None);
        assert_eq!(tlb.lookup(Vpn(1)), Some(Pfn(0)));
        assert_eq!(tlb.lookup(Vpn(3)), Some(Pfn(2)));
        assert_eq!(tlb.len(), 2);
    }

    #[test]
    fn invalidate_removes_entry() {
        let mut tlb = Tlb::new(4);
        tlb.insert(Vpn(1), Pfn(0));
        tlb.invalidate(Vpn(1));
        assert_eq!(tlb.lookup(Vpn(1)), None);
        assert!(tlb.is_empty());
    }

    #[test]
    fn zero_capacity_always_misses() {
        let mut tlb = Tlb::new(0);
        tlb.insert(Vpn(1), Pfn(0));
        assert_eq!(tlb.lookup(Vpn(1)), None);
        assert_eq!(tlb.len(), 0);
    }
}
