//! RAM probe and boot-time physical-memory stealer.
//!
//! Before the Frame Allocator is bootstrapped there is no buddy list to
//! allocate from, but early init (the kernel heap, the page tables
//! themselves) still needs a handful of physical frames. `ram_stealmem`
//! bump-allocates from the top of RAM downward and never frees; once
//! `frame_allocator::bootstrap` runs, all further allocation goes through the
//! buddy list instead.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::machine::PAGE_SIZE;

/// Lowest usable physical address (just past the kernel image). Fixed for
/// this teaching machine rather than probed from a boot loader, since this
/// crate has no ELF/E820 loader in scope.
const RAM_LOW: u32 = 0x0020_0000;

/// Highest usable physical address (exclusive). 8 MiB of RAM, matching the
/// scale of the original teaching machine's default QEMU configuration.
const RAM_HIGH: u32 = 0x0080_0000;

/// Next address available to `ram_stealmem`, counting down from `RAM_HIGH`.
static STEAL_TOP: AtomicU32 = AtomicU32::new(RAM_HIGH);

/// Report the `[lo, hi)` range of usable physical RAM.
pub fn ram_getsize() -> (u32, u32) {
    (RAM_LOW, STEAL_TOP.load(Ordering::SeqCst))
}

/// Bump-allocate `npages` physical pages from the top of RAM. Used only
/// before the Frame Allocator is bootstrapped. Returns 0 on exhaustion.
pub fn ram_stealmem(npages: u32) -> u32 {
    let size = npages * PAGE_SIZE;

    loop {
        let top = STEAL_TOP.load(Ordering::SeqCst);
        if top < RAM_LOW + size {
            return 0;
        }
        let new_top = top - size;
        if STEAL_TOP
            .compare_exchange(top, new_top, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return new_top;
        }
    }
}
