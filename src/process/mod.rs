//! The running thread and its Active-Address-Space Pointer.
//!
//! Trimmed down from a full scheduler to exactly what the Fault Handler and
//! `as_activate` need: one box holding the current thread's address space,
//! if it has one.

use alloc::boxed::Box;

use spin::Mutex;

use crate::memory::addrspace::AddressSpace;

/// A unit of execution. This teaching kernel runs one thread at a time, so
/// there is no run queue - only the currently-running thread's state.
pub struct Thread {
    pub vmspace: Option<Box<AddressSpace>>,
}

impl Thread {
    pub const fn new() -> Self {
        Thread { vmspace: None }
    }
}

/// The thread presently executing. `vm_fault` and the exception dispatcher
/// read this to find the address space a faulting access should be checked
/// against.
pub static CURRENT_THREAD: Mutex<Thread> = Mutex::new(Thread::new());

/// Install `vmspace` as the current thread's address space and activate it
/// (flush the TLB). Used both at initial thread creation and by `as_copy`'s
/// caller when switching to a forked child.
pub fn set_current_vmspace(vmspace: Box<AddressSpace>) {
    vmspace.activate();
    CURRENT_THREAD.lock().vmspace = Some(vmspace);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::frame_allocator::test_support;

    #[test]
    fn setting_current_vmspace_makes_it_observable() {
        test_support::reset_and_bootstrap(0x0020_0000, 4096);
        crate::io::random::init();

        let mut r#as = AddressSpace::create();
        r#as.define_region(0x0040_0000, 0x1000, true, true, true).unwrap();
        r#as.prepare_load().unwrap();

        set_current_vmspace(r#as);

        assert!(CURRENT_THREAD.lock().vmspace.is_some());
    }
}
