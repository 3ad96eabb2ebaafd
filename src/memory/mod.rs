//! The memory management subsystem: physical frames, address spaces, and the
//! TLB-miss fault path.

pub use self::heap::KernelAllocator;

pub mod addrspace;
pub mod error;
pub mod fault;
pub mod frame_allocator;
mod heap;

use crate::machine::PAGE_SIZE;
use crate::memory::addrspace::KERNEL_VBASE;
use crate::memory::frame_allocator::PhysAddr;

/// Bring up the VM subsystem: seed the kernel heap, then the Frame Allocator.
///
/// Order matters - `frame_allocator::bootstrap` allocates its bookkeeping
/// `Vec` on the kernel heap, so the heap must already be usable. The early,
/// reserved-in-.bss heap is the only kernel heap this design needs: all user
/// and kernel page allocations beyond it go through the Frame Allocator
/// instead, so there is no second heap region to carve out of RAM (doing so
/// would double-book pages the allocator also hands out).
pub fn init(allocator: &mut KernelAllocator) {
    heap::early::init(allocator);
    frame_allocator::bootstrap();
}

/// Allocate `npages` contiguous physical pages and return their
/// kernel-virtual address (the direct-map window, not the physical
/// address). Used by kernel code that wants raw pages rather than
/// heap-managed allocations.
pub fn alloc_kpages(npages: u32) -> Option<usize> {
    let paddr = frame_allocator::alloc_frames(npages);
    if paddr.is_null() {
        None
    } else {
        Some((paddr.0 + KERNEL_VBASE) as usize)
    }
}

/// Free pages previously returned by [`alloc_kpages`].
pub fn free_kpages(kvaddr: usize) {
    let paddr = PhysAddr(kvaddr as u32 - KERNEL_VBASE);
    debug_assert!(paddr.is_page_aligned());
    frame_allocator::free_frames(paddr);
}
