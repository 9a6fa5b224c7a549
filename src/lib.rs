//! Virtual-memory simulator: replays a page reference trace through a TLB, a
//! page table and a bounded frame pool, comparing page-replacement policies.

pub mod memory;
pub mod paging;
pub mod policy;
pub mod simulator;
pub mod tlb;
pub mod trace;
