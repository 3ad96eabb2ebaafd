//! The TLB-miss Fault Handler: classifies a faulting address against the
//! current thread's address space and installs a translation on success.
//!
//! Translated from the original machine's `vm_fault`.

use crate::machine::{self, InterruptGuard, PAGE_FRAME, TLBLO_DIRTY, TLBLO_VALID};
use crate::memory::addrspace::AddressSpace;
use crate::memory::error::VmError;

/// The three fault causes the hardware can report for a TLB miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The faulting access was a read.
    Read,
    /// The faulting access was a write.
    Write,
    /// The faulting access was a read from a page marked read-only. Always
    /// fatal in this design.
    ReadOnly,
}

/// Handle a TLB miss at `faultaddress` against `r#as`.
///
/// On success, installs one new TLB entry mapping the containing page and
/// returns `Ok(())` - the faulting instruction should be retried. On
/// failure, returns `Err(VmError::Fault)`: either the address matched no
/// region (after printing allocator diagnostics) or every TLB slot was
/// already valid.
///
/// # Panics
/// Panics immediately if `kind` is [`FaultKind::ReadOnly`] - this design
/// never marks any page read-only, so observing that fault
/// kind means the hardware or caller is confused, not that recovery is
/// possible.
pub fn vm_fault(kind: FaultKind, faultaddress: u32, r#as: &AddressSpace) -> Result<(), VmError> {
    if kind == FaultKind::ReadOnly {
        panic!("dumbvm: got VM_FAULT_READONLY\n");
    }

    let _guard = InterruptGuard::new();

    let faultaddress = faultaddress & PAGE_FRAME;

    let vbase1 = r#as.vbase1;
    let vtop1 = vbase1 + r#as.npages1 * machine::PAGE_SIZE;
    let vbase2 = r#as.vbase2;
    let vtop2 = vbase2 + r#as.npages2 * machine::PAGE_SIZE;
    // `stackvbase` names the stack's virtual *top*, not its base.
    let stacktop = r#as.stackvbase;
    let stackbase = r#as.stackvbase - crate::memory::addrspace::STACK_PAGES * machine::PAGE_SIZE;

    let paddr = if faultaddress >= vbase1 && faultaddress < vtop1 {
        faultaddress - vbase1 + r#as.pbase1
    } else if faultaddress >= vbase2 && faultaddress < vtop2 {
        faultaddress - vbase2 + r#as.pbase2
    } else if faultaddress >= stackbase && faultaddress < stacktop {
        faultaddress - stackbase + r#as.stackpbase
    } else {
        crate::memory::frame_allocator::print_stats();
        return Err(VmError::Fault);
    };

    debug_assert_eq!(paddr & !PAGE_FRAME, 0);

    for i in 0..machine::NUM_TLB {
        let (_, elo) = unsafe { machine::tlb_read(i) };
        if elo & TLBLO_VALID != 0 {
            continue;
        }

        let elo = paddr | TLBLO_DIRTY | TLBLO_VALID;
        unsafe {
            machine::tlb_write(faultaddress, elo, i);
        }
        return Ok(());
    }

    printk!("dumbvm: Ran out of TLB entries - cannot handle page fault\n");
    Err(VmError::Fault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::frame_allocator::test_support;

    fn setup(npages: u32) -> AddressSpace {
        test_support::reset_and_bootstrap(0x0020_0000, npages);
        crate::io::random::init();

        let mut r#as = AddressSpace::create();
        r#as.define_region(0x0040_0000, 0x2000, true, true, true).unwrap();
        r#as.define_region(0x0050_0000, 0x1000, true, true, true).unwrap();
        r#as.prepare_load().unwrap();
        r#as.define_stack().unwrap();
        *r#as
    }

    fn clear_tlb() {
        for i in 0..machine::NUM_TLB {
            unsafe {
                machine::tlb_write(machine::tlbhi_invalid(i), machine::tlblo_invalid(), i);
            }
        }
    }

    /// A fault inside region 1 installs a mapping and can be retried.
    #[test]
    fn fault_inside_region_installs_mapping() {
        let r#as = setup(4096);
        clear_tlb();

        let res = vm_fault(FaultKind::Read, r#as.vbase1, &r#as);
        assert!(res.is_ok());

        let mut found = false;
        for i in 0..machine::NUM_TLB {
            let (ehi, elo) = unsafe { machine::tlb_read(i) };
            if elo & TLBLO_VALID != 0 && ehi == r#as.vbase1 {
                assert_eq!(elo & !PAGE_FRAME & !(TLBLO_VALID | TLBLO_DIRTY), 0);
                assert_eq!((elo & PAGE_FRAME), r#as.pbase1);
                found = true;
            }
        }
        assert!(found);
    }

    #[test]
    fn fault_inside_stack_installs_mapping() {
        let r#as = setup(4096);
        clear_tlb();

        let addr = r#as.stackvbase - machine::PAGE_SIZE;
        let res = vm_fault(FaultKind::Write, addr, &r#as);
        assert!(res.is_ok());
    }

    /// A fault outside every region is reported as a fault.
    #[test]
    fn fault_outside_every_region_fails() {
        let r#as = setup(4096);
        clear_tlb();

        let res = vm_fault(FaultKind::Read, 0x1234_0000, &r#as);
        assert_eq!(res, Err(VmError::Fault));
    }

    /// A full TLB causes the fault to fail without corrupting any existing
    /// entry.
    #[test]
    fn full_tlb_reports_fault_without_overwriting_entries() {
        let r#as = setup(4096);

        for i in 0..machine::NUM_TLB {
            unsafe {
                machine::tlb_write(0x9000_0000 + (i as u32) * machine::PAGE_SIZE, TLBLO_VALID, i);
            }
        }

        let res = vm_fault(FaultKind::Read, r#as.vbase1, &r#as);
        assert_eq!(res, Err(VmError::Fault));

        for i in 0..machine::NUM_TLB {
            let (ehi, _) = unsafe { machine::tlb_read(i) };
            assert_eq!(ehi, 0x9000_0000 + (i as u32) * machine::PAGE_SIZE);
        }
    }

    #[test]
    #[should_panic]
    fn readonly_fault_is_fatal() {
        let r#as = setup(4096);
        let _ = vm_fault(FaultKind::ReadOnly, r#as.vbase1, &r#as);
    }
}
