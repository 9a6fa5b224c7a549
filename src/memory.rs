use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::paging::{Pfn, Vpn};

/// Fixed pool of physical frames: a slot per frame holding the resident page
/// (if any), a free-list of unused frame ids, and a reverse page-to-frame map.
///
/// Invariant: `occupied() == num_frames - free count`, and the reverse map
/// agrees with the slot array at every index. Both are maintained here and
/// nowhere else; the simulator mutates the pool only through `load_page` and
/// `evict_page`.
pub struct FramePool {
    frames: Vec<Option<Vpn>>,
    free: VecDeque<Pfn>,
    page_to_frame: FxHashMap<Vpn, Pfn>,
}

impl FramePool {
    pub fn new(num_frames: usize) -> Self {
        Self {
            frames: vec![None; num_frames],
            free: (0..num_frames).map(Pfn).collect(),
            page_to_frame: FxHashMap::default(),
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn occupied(&self) -> usize {
        self.page_to_frame.len()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Current frame contents in frame-id order, for the eviction policy.
    pub fn frames(&self) -> &[Option<Vpn>] {
        &self.frames
    }

    pub fn frame_of(&self, vpn: Vpn) -> Option<Pfn> {
        self.page_to_frame.get(&vpn).copied()
    }

    /// Pops the next free frame id. Callers must check `is_full` first; `None`
    /// here simply means the pool is full.
    pub fn get_free_frame(&mut self) -> Option<Pfn> {
        self.free.pop_front()
    }

    pub fn load_page(&mut self, vpn: Vpn, pfn: Pfn) {
        self.frames[pfn.0] = Some(vpn);
        self.page_to_frame.insert(vpn, pfn);
    }

    /// Removes `vpn` from its frame, returns the frame to the free-list, and
    /// reports which frame was freed.
    pub fn evict_page(&mut self, vpn: Vpn) -> Pfn {
        let pfn = self
            .page_to_frame
            .remove(&vpn)
            .expect("evicted page must be resident");
        self.frames[pfn.0] = None;
        self.free.push_back(pfn);
        pfn
    }
}
