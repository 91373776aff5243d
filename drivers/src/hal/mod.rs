//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines the capability traits the mailbox core is built on.
//! Platform drivers implement them over MMIO; tests implement them over
//! plain memory. The core never touches hardware directly.
//!
//! # Available Interfaces
//!
//! - [`semaphore`]: Arbitration-semaphore register window (status/set/clear)
//! - [`exchange`]: Trigger/result exchange block used during handshake
//! - [`doorbell`]: Doorbell ring and per-CPU interrupt callback registration
//! - [`shmem`]: Mapping of peer-allocated shared memory

pub mod doorbell;
pub mod exchange;
pub mod semaphore;
pub mod shmem;
