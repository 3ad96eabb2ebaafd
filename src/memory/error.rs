//! The error taxonomy for the VM subsystem.

use core::fmt;

/// An error returned by the Frame Allocator, Address Space, or Fault Handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// Physical-frame allocation failed during `prepare_load` or `copy`.
    NoMem,

    /// The faulting address is unmapped, the current thread has no address
    /// space, or the TLB has no free slot.
    Fault,

    /// `vm_fault` was called with an unrecognized fault kind. Never actually
    /// constructed by this crate: [`crate::memory::fault::FaultKind`] is a
    /// closed enum, so there is no "unknown kind" to report once the fault
    /// cause has already been decoded into it. Kept as a variant for callers
    /// that still classify a raw integer fault code before it becomes one.
    InvalidArgument,

    /// A third call to `define_region` on the same address space.
    TooManyRegions,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VmError::NoMem => "out of physical memory",
            VmError::Fault => "segmentation fault",
            VmError::InvalidArgument => "invalid fault kind",
            VmError::TooManyRegions => "too many regions",
        };
        f.write_str(msg)
    }
}
