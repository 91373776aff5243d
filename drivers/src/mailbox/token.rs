//! Channel ownership tokens.
//!
//! Each channel owns a 2-bit slice of the arbitration-semaphore status word,
//! at bit offset `2 * index`. The slice is the single source of truth for
//! who may write the channel's buffer; there is no other lock.
//!
//! Bit discipline: the peer only sets bits and the master only clears them,
//! with one documented exception in the acknowledge path (see
//! [`MailboxTransport::acknowledge`](super::MailboxTransport::acknowledge)).

use common::ChannelIndex;

/// Ownership state of one channel, decoded from its 2-bit token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum ChannelState {
    /// The peer owns the channel: a response (or a peer-initiated request)
    /// is ready, or the channel is idle on the peer side.
    SlaveSignalled = 0b00,
    /// A request is queued; the peer must service it.
    SlaveQueued = 0b01,
    /// The CPU may issue a new request.
    MasterFree = 0b10,
    /// The CPU has consumed the response and is finalizing.
    MasterAcked = 0b11,
}

impl ChannelState {
    /// Decode a 2-bit token value.
    ///
    /// Total and pure: every 2-bit value maps to exactly one state.
    pub const fn from_token(token: u32) -> Self {
        match token & 0b11 {
            0b00 => ChannelState::SlaveSignalled,
            0b01 => ChannelState::SlaveQueued,
            0b10 => ChannelState::MasterFree,
            _ => ChannelState::MasterAcked,
        }
    }

    /// The state's 2-bit token value.
    pub const fn token(self) -> u32 {
        self as u32
    }
}

/// Mask of `ch`'s token slice within the status word.
pub(crate) const fn mask(ch: ChannelIndex) -> u32 {
    0b11 << (ch.index() * 2)
}

/// `state`'s bit pattern positioned in `ch`'s slice.
pub(crate) const fn pattern(state: ChannelState, ch: ChannelIndex) -> u32 {
    state.token() << (ch.index() * 2)
}

/// Decode `ch`'s state from a full status word.
pub(crate) const fn decode(status: u32, ch: ChannelIndex) -> ChannelState {
    ChannelState::from_token(status >> (ch.index() * 2))
}
