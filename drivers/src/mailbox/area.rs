//! Channel area management.
//!
//! Each channel's shared buffer is discovered once during connect and never
//! moves afterwards. The buffer holds a colocated inbound/outbound
//! descriptor pair; which descriptor a transaction touches depends on the
//! direction of the transfer, and which side may touch it at all is decided
//! by the channel token.
//!
//! Every write is guarded by a hard size check: an oversized payload would
//! overrun into the next channel's shared memory, so it is rejected loudly
//! and nothing is written.

use super::MailboxError;
use common::{
    ChannelIndex, InboundRequest, MSG_DATA_CAPACITY, MessageArea, MessageFlags, NR_CHANNELS,
    Response,
};
use core::ptr::{NonNull, read_volatile, write_volatile};

/// Inbound/outbound descriptor pair of one channel.
///
/// Both descriptors live in the same page-sized mapping.
#[derive(Debug, Copy, Clone)]
pub(crate) struct ChannelArea {
    ib: NonNull<MessageArea>,
    ob: NonNull<MessageArea>,
}

impl ChannelArea {
    pub(crate) const fn colocated(base: NonNull<MessageArea>) -> Self {
        Self { ib: base, ob: base }
    }
}

/// Table mapping each channel index to its descriptor pair.
pub(crate) struct ChannelAreas {
    table: [ChannelArea; NR_CHANNELS],
}

impl ChannelAreas {
    /// Wrap the mapped per-channel buffers.
    ///
    /// # Safety
    ///
    /// Every entry must point at a live channel buffer shared with the peer,
    /// valid for the lifetime of the connection.
    pub(crate) const unsafe fn new(table: [ChannelArea; NR_CHANNELS]) -> Self {
        Self { table }
    }

    fn check_size(ch: ChannelIndex, size: usize) -> Result<(), MailboxError> {
        if size > MSG_DATA_CAPACITY {
            log::warn!(
                "mailbox: dropping {size} byte payload for {ch}, channel areas hold {MSG_DATA_CAPACITY}"
            );
            return Err(MailboxError::PayloadTooLarge {
                size,
                capacity: MSG_DATA_CAPACITY,
            });
        }
        Ok(())
    }

    /// Write a request (code, flags and payload) into `ch`'s outbound
    /// descriptor.
    pub(crate) fn write_request(
        &mut self,
        ch: ChannelIndex,
        code: i32,
        flags: MessageFlags,
        payload: &[u8],
    ) -> Result<(), MailboxError> {
        Self::check_size(ch, payload.len())?;
        let p = self.table[ch.index()].ob.as_ptr();
        // SAFETY: p is a live channel buffer per `new`; the caller holds the
        // token, so the peer is not writing.
        unsafe {
            write_volatile(&raw mut (*p).code, code);
            write_volatile(&raw mut (*p).flags, flags.bits());
            copy_payload_in(p, payload);
        }
        Ok(())
    }

    /// Write a response (code and payload) into `ch`'s outbound descriptor.
    ///
    /// The flags word is left alone: it belongs to the request that is being
    /// answered.
    pub(crate) fn write_response(
        &mut self,
        ch: ChannelIndex,
        code: i32,
        payload: &[u8],
    ) -> Result<(), MailboxError> {
        Self::check_size(ch, payload.len())?;
        let p = self.table[ch.index()].ob.as_ptr();
        // SAFETY: as in `write_request`.
        unsafe {
            write_volatile(&raw mut (*p).code, code);
            copy_payload_in(p, payload);
        }
        Ok(())
    }

    /// Read the peer's response from `ch`'s inbound descriptor.
    pub(crate) fn read_response(&self, ch: ChannelIndex) -> Response {
        let p = self.table[ch.index()].ib.as_ptr();
        // SAFETY: p is a live channel buffer per `new`; the token says the
        // peer has finished writing.
        unsafe {
            Response {
                code: read_volatile(&raw const (*p).code),
                data: copy_payload_out(p),
            }
        }
    }

    /// Read a peer-initiated request from `ch`'s inbound descriptor.
    pub(crate) fn read_request(&self, ch: ChannelIndex) -> InboundRequest {
        let p = self.table[ch.index()].ib.as_ptr();
        // SAFETY: as in `read_response`.
        unsafe {
            InboundRequest {
                code: read_volatile(&raw const (*p).code),
                flags: MessageFlags::from_bits_truncate(read_volatile(&raw const (*p).flags)),
                data: copy_payload_out(p),
            }
        }
    }

    /// Completion policy the peer asked for in its request on `ch`.
    pub(crate) fn inbound_flags(&self, ch: ChannelIndex) -> MessageFlags {
        let p = self.table[ch.index()].ib.as_ptr();
        // SAFETY: as in `read_response`.
        unsafe { MessageFlags::from_bits_truncate(read_volatile(&raw const (*p).flags)) }
    }
}

unsafe fn copy_payload_in(p: *mut MessageArea, payload: &[u8]) {
    // SAFETY: payload fits per check_size; data is plain bytes, copied the
    // way the peer copies them.
    unsafe {
        let dst = (&raw mut (*p).data) as *mut u8;
        core::ptr::copy_nonoverlapping(payload.as_ptr(), dst, payload.len());
    }
}

unsafe fn copy_payload_out(p: *const MessageArea) -> [u8; MSG_DATA_CAPACITY] {
    let mut data = [0u8; MSG_DATA_CAPACITY];
    // SAFETY: the area holds MSG_DATA_CAPACITY payload bytes.
    unsafe {
        let src = (&raw const (*p).data) as *const u8;
        core::ptr::copy_nonoverlapping(src, data.as_mut_ptr(), MSG_DATA_CAPACITY);
    }
    data
}
