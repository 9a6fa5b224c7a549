use std::fmt;

use rustc_hash::FxHashMap;

/// Virtual page number, derived from a byte address divided by the page size.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Vpn(pub u64);

/// Physical frame number, in `[0, num_frames)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Pfn(pub usize);

impl fmt::Display for Vpn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Pfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact map of every resident page to its frame. A page appears here iff it
/// currently occupies a frame; residency is the only thing this table tracks.
pub struct PageTable {
    mapping: FxHashMap<Vpn, Pfn>,
}

impl PageTable {
    pub fn new() -> Self {
        Self {
            mapping: FxHashMap::default(),
        }
    }

    pub fn lookup(&self, vpn: Vpn) -> Option<Pfn> {
        self.mapping.get(&vpn).copied()
    }

    pub fn update(&mut self, vpn: Vpn, pfn: Pfn) {
        self.mapping.insert(vpn, pfn);
    }

    pub fn evict(&mut self, vpn: Vpn) {
        self.mapping.remove(&vpn);
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_lookup_evict() {
        let mut table = PageTable::new();
        assert_eq!(table.lookup(Vpn(3)), None);

        table.update(Vpn(3), Pfn(0));
        table.update(Vpn(7), Pfn(1));
        assert_eq!(table.lookup(Vpn(3)), Some(Pfn(0)));
        assert_eq!(table.len(), 2);

        table.evict(Vpn(3));
        assert_eq!(table.lookup(Vpn(3)), None);
        assert_eq!(table.len(), 1);

        // Evicting a non-resident page is a no-op.
        table.evict(Vpn(3));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn update_overwrites_frame() {
        let mut table = PageTable::new();
        table.update(Vpn(5), Pfn(0));
        table.update(Vpn(5), Pfn(2));
        assert_eq!(table.lookup(Vpn(5)), Some(Pfn(2)));
        assert_eq!(table.len(), 1);
    }
}
