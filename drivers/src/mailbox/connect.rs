//! Transport bring-up.
//!
//! Connect runs once, in three strictly ordered phases with no retries:
//! check that both register windows exist, check that the peer has
//! initialized its side, then ask the peer for every channel's buffer
//! address and map them. Any failure aborts the whole sequence; no partial
//! transport is ever handed out.

use super::area::{ChannelArea, ChannelAreas};
use super::MailboxTransport;
use crate::hal::doorbell::{DoorbellController, DoorbellId};
use crate::hal::exchange::ExchangeWindow;
use crate::hal::semaphore::ArbSemaphore;
use crate::hal::shmem::SharedMemoryMapper;
use common::{CHANNEL_AREA_SIZE, ChannelIndex, CpuId, NR_CHANNELS};
use core::ptr::NonNull;

/// Exchange command asking the peer for a channel's buffer address.
const TRIGGER_CMD_GET_ADDRESS: u32 = 4;
/// Position of the channel index within a trigger command word.
const TRIGGER_ID_SHIFT: u32 = 16;

/// Bring-up failures.
///
/// Each is fatal to this connect attempt; the caller decides whether to run
/// the whole handshake again.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The trigger/result exchange window was not provided: device absent.
    MissingExchangeWindow,
    /// The arbitration-semaphore window was not provided: device absent.
    MissingSemaphoreWindow,
    /// The status word reads all-zero: the peer has not initialized its
    /// side yet.
    PeerNotReady,
    /// The peer reported no buffer address for `channel`: it never
    /// allocated that channel.
    ChannelUnresolved { channel: ChannelIndex },
    /// `channel`'s buffer address could not be mapped.
    MapFailed { channel: ChannelIndex },
}

/// Capabilities and configuration consumed by [`MailboxTransport::connect`].
///
/// The register windows are handed in already mapped (or `None` when the
/// firmware description lacks the device). The exchange window and the
/// shared-memory mapper are only needed during the handshake and are not
/// retained by the transport.
pub struct TransportConfig<S, X, M, D> {
    /// Trigger/result exchange window, if the device exists.
    pub exchange: Option<X>,
    /// Arbitration-semaphore window, if the device exists.
    pub sema: Option<S>,
    /// Mapper for the peer-allocated channel buffers.
    pub shmem: M,
    /// Doorbell controller.
    pub doorbell: D,
    /// Doorbell rung to interrupt the peer.
    pub outbound_doorbell: DoorbellId,
    /// "Which CPU am I" capability.
    pub current_cpu: fn() -> CpuId,
}

pub(super) fn connect<S, X, M, D>(
    config: TransportConfig<S, X, M, D>,
) -> Result<MailboxTransport<S, D>, ConnectError>
where
    S: ArbSemaphore,
    X: ExchangeWindow,
    M: SharedMemoryMapper,
    D: DoorbellController,
{
    let mut exchange = config.exchange.ok_or(ConnectError::MissingExchangeWindow)?;
    let sema = config.sema.ok_or(ConnectError::MissingSemaphoreWindow)?;

    // The peer parks every token in a non-zero state before declaring the
    // transport live; an all-zero word means it has not run yet.
    if sema.status() == 0 {
        return Err(ConnectError::PeerNotReady);
    }

    // The peer placed the channel buffers before signalling readiness; ask
    // it where. In index order, aborting on the first unresolved channel.
    let mut hwaddr = [0u32; NR_CHANNELS];
    for ch in ChannelIndex::all() {
        exchange.trigger((ch.index() as u32) << TRIGGER_ID_SHIFT | TRIGGER_CMD_GET_ADDRESS);
        let addr = exchange.result(ch.index());
        if addr == 0 {
            return Err(ConnectError::ChannelUnresolved { channel: ch });
        }
        hwaddr[ch.index()] = addr;
    }

    let mut shmem = config.shmem;
    // Placeholder entries; the loop below overwrites every slot or bails.
    let mut table = [ChannelArea::colocated(NonNull::dangling()); NR_CHANNELS];
    for ch in ChannelIndex::all() {
        // SAFETY: the address came out of the peer's handshake exchange, so
        // it names the channel buffer the peer set aside for us.
        let base = unsafe { shmem.map(hwaddr[ch.index()], CHANNEL_AREA_SIZE) }
            .ok_or(ConnectError::MapFailed { channel: ch })?;
        table[ch.index()] = ChannelArea::colocated(base.cast());
    }

    log::debug!("mailbox transport connected, {NR_CHANNELS} channels mapped");

    // SAFETY: every table entry was just mapped from a peer-reported
    // address and stays valid for the connection lifetime.
    let areas = unsafe { ChannelAreas::new(table) };
    Ok(MailboxTransport::assemble(
        sema,
        config.doorbell,
        areas,
        config.outbound_doorbell,
        config.current_cpu,
    ))
}
