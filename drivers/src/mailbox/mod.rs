//! Mailbox transport core.
//!
//! # Architecture
//!
//! - [`token`]: the channel ownership state machine over the shared 2-bit
//!   tokens
//! - [`area`]: the per-channel shared buffer table and payload copying
//! - [`connect`]: the one-time bring-up handshake
//! - [`MailboxTransport`]: the operation set consumed by higher layers
//!
//! # Control flow
//!
//! A caller picks an outbound channel, writes a request into its buffer,
//! queues the token and optionally rings the doorbell. The peer services the
//! request, writes the response and flips the token back; an inbound
//! interrupt (or the caller polling) picks it up, acknowledges and frees the
//! channel. The token transitions are the only synchronization: each CPU
//! owns its statically assigned channels, so contention exists only between
//! one CPU and the peer, and is resolved entirely by the bit protocol.
//!
//! Blocking policy belongs to the caller: nothing here waits. A caller that
//! gives up on a response must still acknowledge and free the channel, or
//! the channel leaks.

mod area;
mod connect;
mod token;

#[cfg(test)]
mod fake;

pub use connect::{ConnectError, TransportConfig};
pub use token::ChannelState;

use crate::hal::doorbell::{DoorbellController, DoorbellId, InboundHandler};
use crate::hal::exchange::ExchangeWindow;
use crate::hal::semaphore::ArbSemaphore;
use crate::hal::shmem::SharedMemoryMapper;
use area::ChannelAreas;
use common::{ChannelIndex, CpuId, InboundRequest, MessageFlags, NR_CPUS, Response};

/// Local mailbox faults.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// The payload exceeds the fixed channel buffer capacity. Nothing was
    /// written; the shared memory of adjacent channels is untouched.
    PayloadTooLarge { size: usize, capacity: usize },
    /// The channel token was not in the state this transition requires: the
    /// local and peer views have desynchronized. Retrying cannot heal this.
    StateMismatch {
        channel: ChannelIndex,
        expected: ChannelState,
        found: ChannelState,
    },
}

/// The mailbox transport handle.
///
/// Built by [`MailboxTransport::connect`]; owns the semaphore window, the
/// doorbell controller and the channel area table. Pass it explicitly to
/// whoever issues requests; there is no process-wide instance, so tests run
/// several transports against fake registers side by side.
pub struct MailboxTransport<S, D> {
    sema: S,
    doorbell: D,
    areas: ChannelAreas,
    outbound_doorbell: DoorbellId,
    current_cpu: fn() -> CpuId,
}

impl<S, D> MailboxTransport<S, D>
where
    S: ArbSemaphore,
    D: DoorbellController,
{
    /// Run the bring-up handshake and build the transport.
    ///
    /// Fails on the first missing window, a peer that has not initialized
    /// its side, or any channel whose buffer the peer cannot name. No
    /// partial transport is ever returned; connecting again re-runs the
    /// whole handshake.
    pub fn connect<X, M>(config: TransportConfig<S, X, M, D>) -> Result<Self, ConnectError>
    where
        X: ExchangeWindow,
        M: SharedMemoryMapper,
    {
        connect::connect(config)
    }

    pub(crate) fn assemble(
        sema: S,
        doorbell: D,
        areas: ChannelAreas,
        outbound_doorbell: DoorbellId,
        current_cpu: fn() -> CpuId,
    ) -> Self {
        Self {
            sema,
            doorbell,
            areas,
            outbound_doorbell,
            current_cpu,
        }
    }

    /// Bind `handler` to every CPU's inbound doorbell, in CPU order.
    ///
    /// The handler is invoked from interrupt context with the CPU's inbound
    /// channel index and no payload; it inspects the channel to discover
    /// what is pending. A registration failure aborts the remaining CPUs.
    pub fn register_interrupts(&mut self, handler: InboundHandler) -> Result<(), D::Error> {
        for cpu in 0..NR_CPUS {
            self.doorbell
                .register(cpu, ChannelIndex::inbound_for_cpu(cpu), handler)?;
        }
        Ok(())
    }

    /// The calling CPU's outbound atomic channel.
    pub fn current_outbound_channel(&self) -> ChannelIndex {
        ChannelIndex::atomic_for_cpu((self.current_cpu)())
    }

    /// Observe a channel's ownership state.
    pub fn channel_state(&self, ch: ChannelIndex) -> ChannelState {
        token::decode(self.sema.status(), ch)
    }

    /// Issue a request on `ch`.
    ///
    /// Requires the channel to be [`ChannelState::MasterFree`]. Copies the
    /// payload, moves the token to [`ChannelState::SlaveQueued`] and rings
    /// the outbound doorbell when `flags` ask for it; callers that poll
    /// instead leave [`MessageFlags::RING_DOORBELL`] out.
    pub fn issue(
        &mut self,
        ch: ChannelIndex,
        code: i32,
        payload: &[u8],
        flags: MessageFlags,
    ) -> Result<(), MailboxError> {
        self.expect_state(ch, ChannelState::MasterFree)?;
        self.areas.write_request(ch, code, flags, payload)?;

        // FREE -> QUEUED: drop the free bit, raise the queued bit. Targeted
        // set/clear only; rewriting the word would race the peer's writes.
        self.sema.clear(token::pattern(ChannelState::MasterFree, ch));
        self.sema.set(token::pattern(ChannelState::SlaveQueued, ch));

        if flags.contains(MessageFlags::RING_DOORBELL) {
            self.doorbell.ring(self.outbound_doorbell);
        }
        Ok(())
    }

    /// Non-blocking completion check.
    ///
    /// Returns the peer's response only when the token reads
    /// [`ChannelState::SlaveSignalled`]; any other state yields `None`. A
    /// peer using the direct-ack variant parks the channel in
    /// [`ChannelState::MasterAcked`] instead; poll [`Self::channel_state`]
    /// and reclaim with [`Self::free`] for those.
    pub fn try_complete(&mut self, ch: ChannelIndex) -> Option<Response> {
        if self.channel_state(ch) != ChannelState::SlaveSignalled {
            return None;
        }
        Some(self.areas.read_response(ch))
    }

    /// Acknowledge a completed transaction on `ch`.
    ///
    /// Writes the ACKED pattern with a single set: whatever completion bits
    /// the peer left, the combination reads back as ACKED. This is the
    /// documented exception to "the master only clears bits"; without it a
    /// deferred-ack channel could starve in the ACKED state across the full
    /// round trip. With `immediate`, the matching free runs in the same
    /// call and the channel is instantly reusable.
    pub fn acknowledge(&mut self, ch: ChannelIndex, immediate: bool) {
        self.sema.set(token::pattern(ChannelState::MasterAcked, ch));
        if immediate {
            self.clear_to_free(ch);
        }
    }

    /// Return a deferred-ack channel to [`ChannelState::MasterFree`].
    pub fn free(&mut self, ch: ChannelIndex) -> Result<(), MailboxError> {
        self.expect_state(ch, ChannelState::MasterAcked)?;
        self.clear_to_free(ch);
        Ok(())
    }

    /// Read the peer-initiated request pending on inbound `ch`.
    pub fn inbound_request(&self, ch: ChannelIndex) -> InboundRequest {
        self.areas.read_request(ch)
    }

    /// Answer the peer's request on inbound `ch` in one call: write the
    /// response, acknowledge per the completion policy the peer put in its
    /// request flags, and ring back if it asked.
    pub fn return_data(
        &mut self,
        ch: ChannelIndex,
        code: i32,
        payload: &[u8],
    ) -> Result<(), MailboxError> {
        self.areas.write_response(ch, code, payload)?;

        let flags = self.areas.inbound_flags(ch);
        self.acknowledge(ch, !flags.contains(MessageFlags::WANT_ACK));
        if flags.contains(MessageFlags::RING_DOORBELL) {
            self.doorbell.ring(self.outbound_doorbell);
        }
        Ok(())
    }

    fn clear_to_free(&mut self, ch: ChannelIndex) {
        // ACKED and FREE differ in exactly the low token bit; clearing it is
        // the one master-side write that completes the acknowledge exception.
        self.sema.clear(
            token::pattern(ChannelState::MasterAcked, ch)
                ^ token::pattern(ChannelState::MasterFree, ch),
        );
    }

    fn expect_state(&self, ch: ChannelIndex, expected: ChannelState) -> Result<(), MailboxError> {
        let found = self.channel_state(ch);
        if found == expected {
            Ok(())
        } else {
            Err(MailboxError::StateMismatch {
                channel: ch,
                expected,
                found,
            })
        }
    }
}

// SAFETY: the channel area pointers reference peer shared memory that stays
// mapped for the connection lifetime; which context may access a buffer is
// arbitrated by the tokens, not by the address of the handle.
unsafe impl<S: Send, D: Send> Send for MailboxTransport<S, D> {}
