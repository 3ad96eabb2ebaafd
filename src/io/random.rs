//! The `random:` device.
//!
//! Stands in for `vfs_open("random:", O_RDONLY, &v)` + `VOP_READ` against a
//! true hardware RNG or entropy pool. `define_stack` reads exactly 4 bytes
//! from this device and treats them as an unsigned 32-bit integer in host
//! order (no endian conversion), matching the original machine's behavior.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use spin::Mutex;

static DEVICE: Mutex<Option<StdRng>> = Mutex::new(None);

/// Open the random device. Must be called once during boot, before any call
/// to [`read_u32`].
pub fn init() {
    // NOTE: a real boot would seed this from a hardware entropy source (a
    // cycle counter, a TRNG peripheral, ...). We don't have one to read in
    // this teaching environment, so the seed is fixed - this is a known,
    // intentional departure from "random" and only affects ASLR strength,
    // not correctness of the address-space layout math that consumes it.
    *DEVICE.lock() = Some(StdRng::from_seed([0x5a; 32]));
}

/// Read 4 bytes from the device and return them as a host-order `u32`.
///
/// # Panics
/// Panics if [`init`] has not been called yet - same as reading from an
/// unopened vnode in the original would be a kernel bug.
pub fn read_u32() -> u32 {
    DEVICE
        .lock()
        .as_mut()
        .expect("random device not initialized")
        .next_u32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_after_init_does_not_panic() {
        init();
        let _ = read_u32();
    }
}
