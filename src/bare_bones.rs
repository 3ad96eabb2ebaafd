//! Basic functionality `libstd` would normally provide: the panic handler and
//! the raw kernel entry symbol.

use core::fmt::Write;
use core::panic::PanicInfo;

use crate::debug::Debug;

/// Used by `panic!` to display an error message on the console, then halt.
#[cfg(not(test))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // We should not be taking any more interrupts.
    let _ = crate::machine::splhigh();

    printk!("\n========{{ PANIC }}========\n");
    let _ = Debug.write_fmt(format_args!("{}\n", info));
    printk!("===========================\n");

    loop {}
}
