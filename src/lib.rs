//! Library root: every module lives here so both the bare-metal binary and
//! the host test harness compile the identical VM logic.
#![cfg_attr(not(test), no_std)]
#![feature(alloc_error_handler)]

extern crate alloc;

#[macro_use]
pub mod debug;

#[cfg(not(test))]
pub mod bare_bones;

pub mod interrupts;
pub mod io;
pub mod machine;
pub mod memory;
pub mod process;
pub mod ram;

/// The kernel heap. `main.rs` is the only other place that names this
/// static; it lives here so library-only test builds also link against one
/// allocator instance.
#[cfg(not(test))]
#[global_allocator]
pub static mut ALLOCATOR: memory::KernelAllocator = memory::KernelAllocator::new();
