//! Exception dispatch: routes a TLB-miss trap to the Fault Handler.
//!
//! The original machine's trap handler (`mips_trap`) decodes the CP0 `Cause`
//! register and calls `vm_fault` for the three TLB-miss causes. We don't have
//! real CP0 trap entry in this teaching environment, so `dispatch` takes the
//! already-decoded cause and faulting address directly - everything below it
//! (address-space lookup, TLB installation) is the genuine logic under test.

use crate::memory::error::VmError;
use crate::memory::fault::{vm_fault, FaultKind};

/// Route one decoded TLB-miss trap to the Fault Handler against the current
/// thread's address space.
///
/// Returns `Err(VmError::Fault)` if there is no current address space (the
/// kernel itself faulted, or ran before any process existed) or if
/// `vm_fault` itself reports a fault.
pub fn dispatch(kind: FaultKind, faultaddress: u32) -> Result<(), VmError> {
    let current = crate::process::CURRENT_THREAD.lock();
    let r#as = current.vmspace.as_ref().ok_or(VmError::Fault)?;
    vm_fault(kind, faultaddress, r#as)
}

/// Perform one-time exception-handling setup. On real hardware this would
/// install the MIPS general exception vector at `0x80000080`; there is
/// nothing further to initialize here since `dispatch` is called directly
/// by whatever decodes the trap.
pub fn init() {
    printk!("\texception dispatch ready\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::addrspace::AddressSpace;
    use crate::memory::frame_allocator::test_support;

    #[test]
    fn dispatch_without_a_current_address_space_faults() {
        test_support::reset_and_bootstrap(0x0020_0000, 4096);
        crate::process::CURRENT_THREAD.lock().vmspace = None;

        let res = dispatch(FaultKind::Read, 0x0040_0000);
        assert_eq!(res, Err(VmError::Fault));
    }

    #[test]
    fn dispatch_with_a_current_address_space_succeeds_inside_a_region() {
        test_support::reset_and_bootstrap(0x0020_0000, 4096);
        crate::io::random::init();

        let mut r#as = AddressSpace::create();
        r#as.define_region(0x0040_0000, 0x1000, true, true, true).unwrap();
        r#as.prepare_load().unwrap();
        r#as.define_stack().unwrap();
        let vbase1 = r#as.vbase1;

        crate::process::CURRENT_THREAD.lock().vmspace = Some(r#as);

        let res = dispatch(FaultKind::Read, vbase1);
        assert!(res.is_ok());
    }
}
