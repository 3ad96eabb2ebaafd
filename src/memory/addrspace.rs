//! The per-process Address Space: two code/data regions plus a fixed-size
//! stack, each backed by a contiguous run of physical frames.
//!
//! Translated from the original machine's `as_create`/`as_destroy`/
//! `as_define_region`/`as_prepare_load`/`as_complete_load`/`as_define_stack`/
//! `as_activate`/`as_copy`.

use alloc::boxed::Box;

use crate::io::random;
use crate::machine::{self, tlbhi_invalid, tlblo_invalid, InterruptGuard, PAGE_SIZE};
use crate::memory::error::VmError;
use crate::memory::frame_allocator::{self, PhysAddr};

/// User code starts here (fixed for this teaching machine).
pub const USER_CODE_BASE: u32 = 0x0040_0000;

/// Lowest possible (unrandomized) stack virtual top.
const STACK_VBASE_MIN: u32 = 0x005c_0000;

/// Width of the window `define_stack` randomizes the stack top within.
const STACK_VBASE_SPAN: u32 = 0x7fa4_0000;

/// Kernel virtual range begins here; never collides with user addresses
/// picked from `[STACK_VBASE_MIN, STACK_VBASE_MIN + STACK_VBASE_SPAN)`.
pub const KERNEL_VBASE: u32 = 0x8000_0000;

/// User stack size, fixed at 12 pages (48 KiB).
pub const STACK_PAGES: u32 = 12;

/// A process address space: two virtual/physical region pairs plus a stack.
///
/// Virtual and physical fields are plain `u32`s rather than [`PhysAddr`]
/// newtypes: every field here mixes into address arithmetic against the
/// other (`faultaddress - vbase1 + pbase1`), which the newtype would only
/// get in the way of. [`PhysAddr`] earns its keep at the Frame Allocator's
/// API boundary instead, where "a physical frame base" and "anything else"
/// genuinely should not unify.
///
/// All three physical ranges are disjoint and page-aligned once
/// [`AddressSpace::prepare_load`] has succeeded. Protection is not tracked -
/// every mapping is effectively read/write.
#[derive(Debug, Default)]
pub struct AddressSpace {
    pub vbase1: u32,
    pub pbase1: u32,
    pub npages1: u32,

    pub vbase2: u32,
    pub pbase2: u32,
    pub npages2: u32,

    /// Virtual *top* of the stack; the stack occupies
    /// `[stackvbase - STACK_PAGES*PAGE_SIZE, stackvbase)`.
    pub stackvbase: u32,
    pub stackpbase: u32,
}

impl AddressSpace {
    /// Create a new, zero-initialized address space.
    pub fn create() -> Box<AddressSpace> {
        Box::new(AddressSpace::default())
    }

    /// Free the physical ranges backing this address space.
    pub fn destroy(&self) {
        frame_allocator::free_frames(PhysAddr(self.pbase1));
        frame_allocator::free_frames(PhysAddr(self.pbase2));
        frame_allocator::free_frames(PhysAddr(self.stackpbase));
    }

    /// Record a new virtual region, page-aligning it outward. Protection
    /// flags are accepted for interface compatibility but ignored - every
    /// mapping is effectively read/write/execute.
    pub fn define_region(
        &mut self,
        vaddr: u32,
        size: u32,
        _readable: bool,
        _writable: bool,
        _executable: bool,
    ) -> Result<(), VmError> {
        let misalignment = vaddr % PAGE_SIZE;
        let size = size + misalignment;
        let vaddr = vaddr - misalignment;
        let size = (size + PAGE_SIZE - 1) / PAGE_SIZE * PAGE_SIZE;

        let npages = size / PAGE_SIZE;

        if self.vbase1 == 0 {
            self.vbase1 = vaddr;
            self.npages1 = npages;
            return Ok(());
        }

        if self.vbase2 == 0 {
            self.vbase2 = vaddr;
            self.npages2 = npages;
            return Ok(());
        }

        printk!("dumbvm: Warning: too many regions\n");
        Err(VmError::TooManyRegions)
    }

    /// Reserve physical frames for both regions and the stack.
    ///
    /// Preconditions: `pbase1 == pbase2 == stackpbase == 0`. If the second or
    /// third allocation fails, frames already reserved are *not* rolled
    /// back - `destroy` will free whatever ended up populated, matching the
    /// original's behavior.
    pub fn prepare_load(&mut self) -> Result<(), VmError> {
        debug_assert_eq!(self.pbase1, 0);
        debug_assert_eq!(self.pbase2, 0);
        debug_assert_eq!(self.stackpbase, 0);

        self.pbase1 = frame_allocator::alloc_frames(self.npages1).0;
        if self.pbase1 == 0 {
            return Err(VmError::NoMem);
        }

        self.pbase2 = frame_allocator::alloc_frames(self.npages2).0;
        if self.pbase2 == 0 {
            return Err(VmError::NoMem);
        }

        self.stackpbase = frame_allocator::alloc_frames(STACK_PAGES).0;
        if self.stackpbase == 0 {
            return Err(VmError::NoMem);
        }

        Ok(())
    }

    /// Reserved hook for future zero-on-load or protection installation.
    /// Currently a no-op.
    pub fn complete_load(&self) {}

    /// Pick a randomized stack virtual top in
    /// `[STACK_VBASE_MIN, STACK_VBASE_MIN + STACK_VBASE_SPAN)`, page-aligned.
    ///
    /// Precondition: `stackpbase != 0` (i.e. `prepare_load` has run).
    pub fn define_stack(&mut self) -> Result<u32, VmError> {
        debug_assert_ne!(self.stackpbase, 0);

        let rand = random::read_u32();

        // code starts at        0x00400000
        // code imagined to end  0x00500000
        // 12 pages for stack    0x005c0000
        // kernel starts at      0x80000000
        let mut newstack = STACK_VBASE_MIN.wrapping_add(rand % STACK_VBASE_SPAN);
        newstack &= machine::PAGE_FRAME;

        self.stackvbase = newstack;
        Ok(newstack)
    }

    /// Flush every TLB entry. The argument is unused - there are no address
    /// space IDs in this design, so a context switch always flushes
    /// wholesale rather than targeting only the outgoing process's entries.
    /// The parameter stays in the signature as a forward-compatibility hook
    /// (a forward-compatibility hook for a future ASID scheme).
    pub fn activate(&self) {
        let _guard = InterruptGuard::new();

        for i in 0..machine::NUM_TLB {
            unsafe {
                machine::tlb_write(tlbhi_invalid(i), tlblo_invalid(), i);
            }
        }
    }

    /// Deep-copy this address space: a fresh descriptor with the same
    /// virtual layout, freshly allocated (and therefore different) physical
    /// backing, with the same bytes.
    pub fn copy(&self) -> Result<Box<AddressSpace>, VmError> {
        let mut new = AddressSpace::create();

        new.vbase1 = self.vbase1;
        new.npages1 = self.npages1;
        new.vbase2 = self.vbase2;
        new.npages2 = self.npages2;
        new.stackvbase = self.stackvbase;

        if let Err(e) = new.prepare_load() {
            new.destroy();
            return Err(e);
        }

        debug_assert_ne!(new.pbase1, 0);
        debug_assert_ne!(new.pbase2, 0);
        debug_assert_ne!(new.stackpbase, 0);

        unsafe {
            copy_physical_range(self.pbase1, new.pbase1, self.npages1 * PAGE_SIZE);
            copy_physical_range(self.pbase2, new.pbase2, self.npages2 * PAGE_SIZE);
            copy_physical_range(self.stackpbase, new.stackpbase, STACK_PAGES * PAGE_SIZE);
        }

        Ok(new)
    }
}

/// Byte-copy `len` bytes from physical `src` to physical `dst` through the
/// kernel-virtual direct-map window.
///
/// # Safety
/// `src` and `dst` must each name `len` bytes of valid, non-overlapping
/// physical memory (true for any two address spaces' regions, since the
/// Frame Allocator never hands out overlapping ranges).
unsafe fn copy_physical_range(src: u32, dst: u32, len: u32) {
    let src_kv = (src + KERNEL_VBASE) as *const u8;
    let dst_kv = (dst + KERNEL_VBASE) as *mut u8;
    core::ptr::copy_nonoverlapping(src_kv, dst_kv, len as usize);
}
