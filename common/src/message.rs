//! Shared-memory message layout.
//!
//! Each channel's buffer holds one message descriptor: a small header (a
//! status/operation code and a flags word) followed by a fixed-capacity
//! opaque payload. The layout below is read and written by both processors
//! and must match the peer bit for bit.

use bitflags::bitflags;

/// Maximum payload bytes of a single transfer.
///
/// Part of the wire contract; a larger request is a caller error.
pub const MSG_DATA_CAPACITY: usize = 120;

/// Size of one channel's shared buffer (header plus payload).
pub const CHANNEL_AREA_SIZE: usize = core::mem::size_of::<MessageArea>();

bitflags! {
    /// Header flags carried in a request.
    ///
    /// The bit positions are wire contract with the peer.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct MessageFlags: u32 {
        /// The requester wants to observe the ACKED token state itself and
        /// will free the channel explicitly. Without this bit the responder
        /// returns the channel straight to the free state.
        const WANT_ACK = 1 << 0;
        /// Ring the completion doorbell once the response is written.
        const RING_DOORBELL = 1 << 1;
    }
}

/// One message descriptor in a channel's shared buffer.
///
/// Whichever side currently owns the channel (per its token) may write this;
/// the other side must not touch it.
#[repr(C)]
pub struct MessageArea {
    /// Request operation code, or response status code.
    pub code: i32,
    /// [`MessageFlags`] bits.
    pub flags: u32,
    /// Opaque payload.
    pub data: [u8; MSG_DATA_CAPACITY],
}

/// Owned copy of a peer response.
#[derive(Debug, Copy, Clone)]
pub struct Response {
    /// Status code reported by the peer.
    pub code: i32,
    /// Payload bytes (full buffer capacity; meaning is caller-defined).
    pub data: [u8; MSG_DATA_CAPACITY],
}

/// Owned copy of a peer-initiated request read from an inbound channel.
#[derive(Debug, Copy, Clone)]
pub struct InboundRequest {
    /// Operation code requested by the peer.
    pub code: i32,
    /// Completion policy requested by the peer.
    pub flags: MessageFlags,
    /// Payload bytes.
    pub data: [u8; MSG_DATA_CAPACITY],
}
