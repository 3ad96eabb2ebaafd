#![no_std]
#![no_main]

extern crate rlibc;

use dumbvm_kernel::memory::addrspace::AddressSpace;
use dumbvm_kernel::printk;
use dumbvm_kernel::{interrupts, memory, process, ram, ALLOCATOR};

/// This is the entry point to the kernel. It is the first Rust code that
/// runs, reached from the assembly stub that sets up a provisional stack.
#[no_mangle]
extern "C" fn kernel_main() -> ! {
    // Make sure interrupts are off until we've installed the exception
    // dispatcher.
    let _ = dumbvm_kernel::machine::splhigh();

    printk!("\ndumbvm-kernel booting\n");

    printk!("Memory ...\n");
    memory::init(unsafe { &mut ALLOCATOR });
    printk!("Memory done\n");

    printk!("Interrupts ...\n");
    interrupts::init();
    printk!("Interrupts done\n");

    let (lo, hi) = ram::ram_getsize();
    printk!(
        "usable RAM: [0x{:08x}, 0x{:08x}), {} pages\n",
        lo,
        hi,
        (hi - lo) / dumbvm_kernel::machine::PAGE_SIZE
    );

    // Bring up an initial, empty address space as the running thread's own
    // - real process creation (loading an ELF image and populating
    // `define_region` calls from its segments) is not implemented here.
    let r#as = AddressSpace::create();
    process::set_current_vmspace(r#as);

    printk!("dumbvm-kernel ready\n");

    loop {
        core::hint::spin_loop();
    }
}
