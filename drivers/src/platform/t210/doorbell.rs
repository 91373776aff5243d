//! Tegra210 Doorbell Controller Driver
//!
//! Outbound doorbells are rung through a single trigger register. Inbound
//! doorbells are one interrupt line per CPU; the platform's interrupt glue
//! calls [`T210DoorbellController::fire`] from the vector, and the
//! controller routes it to the handler bound at initialization.

use crate::hal::doorbell::{DoorbellController, DoorbellId, InboundHandler};
use common::{ChannelIndex, CpuId, NR_CPUS};
use core::ptr::write_volatile;
use spin::Mutex;

// Ring trigger register offset
const RING_OFFSET: usize = 0x0;

/// A per-CPU inbound binding.
#[derive(Debug, Copy, Clone)]
struct Binding {
    channel: ChannelIndex,
    handler: InboundHandler,
}

/// Doorbell registration errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DoorbellError {
    /// The CPU id is outside the configured core count.
    InvalidCpu(CpuId),
    /// The CPU's inbound doorbell already has a handler.
    AlreadyBound(CpuId),
}

/// Tegra210 doorbell controller.
///
/// The binding table is written at initialization and read from interrupt
/// context; the lock guards the table only, never the protocol path.
#[derive(Debug)]
pub struct T210DoorbellController {
    ring_reg: *mut u32,
    bindings: Mutex<[Option<Binding>; NR_CPUS]>,
}

impl T210DoorbellController {
    /// Create a controller over a mapped doorbell register block.
    ///
    /// # Safety
    ///
    /// `base` must point at the mapped doorbell block.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            ring_reg: (base + RING_OFFSET) as *mut u32,
            bindings: Mutex::new([None; NR_CPUS]),
        }
    }

    /// Deliver `cpu`'s inbound doorbell interrupt.
    ///
    /// Called from the interrupt vector with no payload; the bound handler
    /// receives the CPU's inbound channel index and inspects its token.
    pub fn fire(&self, cpu: CpuId) {
        let binding = self.bindings.lock().get(cpu).copied().flatten();
        if let Some(binding) = binding {
            (binding.handler)(binding.channel);
        } else {
            log::warn!("doorbell for cpu{cpu} fired with no handler bound");
        }
    }
}

impl DoorbellController for T210DoorbellController {
    type Error = DoorbellError;

    fn ring(&mut self, bell: DoorbellId) {
        unsafe { write_volatile(self.ring_reg, 1 << bell) }
    }

    fn register(
        &mut self,
        cpu: CpuId,
        channel: ChannelIndex,
        handler: InboundHandler,
    ) -> Result<(), DoorbellError> {
        if cpu >= NR_CPUS {
            return Err(DoorbellError::InvalidCpu(cpu));
        }
        let mut bindings = self.bindings.lock();
        if bindings[cpu].is_some() {
            return Err(DoorbellError::AlreadyBound(cpu));
        }
        bindings[cpu] = Some(Binding { channel, handler });
        Ok(())
    }
}

// SAFETY: the ring register is memory-mapped hardware; the binding table is
// lock-protected.
unsafe impl Send for T210DoorbellController {}
unsafe impl Sync for T210DoorbellController {}
