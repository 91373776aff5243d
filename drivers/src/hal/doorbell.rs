//! Doorbell Hardware Abstraction Layer.
//!
//! A doorbell is an interrupt line used purely as a notification: it carries
//! no payload, only "look at your channel". The transport rings a fixed
//! outbound doorbell to get the peer's attention and registers one inbound
//! callback per CPU to receive the peer's.

use common::{ChannelIndex, CpuId};

/// Identifies one doorbell line of the controller.
pub type DoorbellId = u32;

/// Callback bound to a CPU's inbound doorbell.
///
/// Invoked with the inbound channel index as its sole context; the handler
/// inspects the channel's token to discover what is pending.
pub type InboundHandler = fn(ChannelIndex);

/// Doorbell controller capability.
pub trait DoorbellController {
    /// Error type for registration failures.
    type Error: core::fmt::Debug;

    /// Ring an outbound doorbell to interrupt the peer.
    fn ring(&mut self, bell: DoorbellId);

    /// Bind `handler` to `cpu`'s inbound doorbell, to be invoked with
    /// `channel` when it fires.
    ///
    /// Called once per CPU at initialization.
    fn register(
        &mut self,
        cpu: CpuId,
        channel: ChannelIndex,
        handler: InboundHandler,
    ) -> Result<(), Self::Error>;
}
