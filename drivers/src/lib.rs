//! Coprocessor Mailbox Transport
//!
//! This crate implements the communication core between the CPU cluster and
//! the power-management coprocessor ("the peer"): fixed-size messages
//! exchanged through shared-memory channels whose ownership is arbitrated by
//! a 2-bit hardware token per channel, with completion signaled by an
//! interrupt doorbell.
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent capability traits (register windows,
//!   doorbell, shared memory)
//! - [`platform`]: Platform-specific MMIO drivers (SoC level)
//! - [`mailbox`]: The protocol core (token state machine, channel areas,
//!   handshake, facade)
//!
//! # Design Principles
//!
//! 1. **No hidden locks**: channel ownership lives entirely in the hardware
//!    token bits; the protocol path takes no software lock
//! 2. **Set/clear only**: token transitions never read-modify-write the
//!    shared status word
//! 3. **Explicit capabilities**: the transport is a handle built from the
//!    register windows and doorbell it is given, so tests run it against
//!    in-memory fakes
//!
//! # Usage Example
//!
//! ```no_run
//! use drivers::mailbox::{MailboxTransport, TransportConfig};
//! use drivers::platform::t210;
//!
//! # fn current_cpu() -> common::CpuId { 0 }
//! # fn example(sema_base: usize, exchange_base: usize,
//! #            shmem: impl drivers::hal::shmem::SharedMemoryMapper,
//! #            bell: t210::T210DoorbellController) -> Result<(), drivers::mailbox::ConnectError> {
//! let config = TransportConfig {
//!     exchange: Some(unsafe { t210::T210ExchangeBlock::new(exchange_base) }),
//!     sema: Some(unsafe { t210::T210ArbSemaphore::new(sema_base) }),
//!     shmem,
//!     doorbell: bell,
//!     outbound_doorbell: t210::CPU_OUTBOUND_DOORBELL,
//!     current_cpu,
//! };
//! let mailbox = MailboxTransport::connect(config)?;
//! let ch = mailbox.current_outbound_channel();
//! # let _ = ch;
//! # Ok(())
//! # }
//! ```

#![no_std]
#![allow(dead_code)]

pub mod hal;
pub mod mailbox;
pub mod platform;

// Re-export commonly used types
pub use hal::doorbell::{DoorbellController, DoorbellId, InboundHandler};
pub use hal::semaphore::ArbSemaphore;
pub use mailbox::{ChannelState, ConnectError, MailboxError, MailboxTransport, TransportConfig};

#[cfg(test)]
extern crate alloc;
