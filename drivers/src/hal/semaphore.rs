//! Arbitration Semaphore Hardware Abstraction Layer.
//!
//! The arbitration semaphore is a status word shared between the CPU cluster
//! and the peer coprocessor, exposed through three sub-registers: a readable
//! status word, a write-only "set bits" register and a write-only "clear
//! bits" register. The split exists so that each side can flip its own bits
//! without a read-modify-write cycle, which would race the other processor's
//! writes to the same word.

/// Arbitration-semaphore register window.
///
/// Implementations must treat `set` and `clear` as atomic single-word
/// hardware operations that touch only the named bits. The protocol is
/// unsound on hardware that cannot guarantee this.
pub trait ArbSemaphore {
    /// Read the full status word.
    fn status(&self) -> u32;

    /// Set the given bits, leaving all others untouched.
    fn set(&mut self, bits: u32);

    /// Clear the given bits, leaving all others untouched.
    fn clear(&mut self, bits: u32);
}
