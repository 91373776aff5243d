//! Shared protocol types for the coprocessor mailbox transport.
//!
//! Everything in this crate is part of the contract between the CPU side and
//! the peer coprocessor: the fixed channel numbering and the shared-memory
//! message layout. The driver crate builds the transport on top of these.

#![no_std]

pub mod channel;
pub mod message;

pub use channel::{ChannelIndex, ChannelKind, CpuId, NR_CHANNELS, NR_CPUS};
pub use message::{
    CHANNEL_AREA_SIZE, InboundRequest, MSG_DATA_CAPACITY, MessageArea, MessageFlags, Response,
};
