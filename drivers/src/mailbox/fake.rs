//! In-memory stand-ins for the HAL capabilities.
//!
//! The fakes emulate what the hardware does (bit set/clear on a shared
//! word, address lookup, doorbell lines) so the protocol core can run
//! entire transactions without a device. `PeerHandle` plays the
//! coprocessor's side of the shared word.

use super::connect::TransportConfig;
use super::token::{self, ChannelState};
use super::MailboxTransport;
use crate::hal::doorbell::{DoorbellController, DoorbellId, InboundHandler};
use crate::hal::exchange::ExchangeWindow;
use crate::hal::semaphore::ArbSemaphore;
use crate::hal::shmem::SharedMemoryMapper;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use common::{
    CHANNEL_AREA_SIZE, ChannelIndex, CpuId, MSG_DATA_CAPACITY, MessageArea, MessageFlags,
    NR_CHANNELS,
};
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;

pub(crate) fn cpu0() -> CpuId {
    0
}

pub(crate) fn cpu2() -> CpuId {
    2
}

fn fake_phys(index: usize) -> u32 {
    0x8000_0000 + (index * CHANNEL_AREA_SIZE) as u32
}

fn leak_area() -> NonNull<MessageArea> {
    NonNull::from(Box::leak(Box::new(MessageArea {
        code: 0,
        flags: 0,
        data: [0; MSG_DATA_CAPACITY],
    })))
}

/// Backing buffers for a full channel table, leaked for the test's lifetime.
pub(crate) fn leak_areas() -> [NonNull<MessageArea>; NR_CHANNELS] {
    core::array::from_fn(|_| leak_area())
}

// ---------------------------------------------------------------------------
// Arbitration semaphore
// ---------------------------------------------------------------------------

/// Shared status word with hardware-style set/clear semantics.
pub(crate) struct FakeSema {
    word: Rc<Cell<u32>>,
}

impl FakeSema {
    pub fn new(initial: u32) -> Self {
        Self {
            word: Rc::new(Cell::new(initial)),
        }
    }

    /// Every channel parked in `MasterFree`, as the peer leaves them after
    /// its own bring-up.
    pub fn all_free() -> Self {
        let mut word = 0;
        for ch in ChannelIndex::all() {
            word |= token::pattern(ChannelState::MasterFree, ch);
        }
        Self::new(word)
    }

    pub fn handle(&self) -> PeerHandle {
        PeerHandle {
            word: self.word.clone(),
        }
    }
}

impl ArbSemaphore for FakeSema {
    fn status(&self) -> u32 {
        self.word.get()
    }

    // The read-modify-write below emulates what the set/clear hardware does
    // internally; the driver side still only names bits.
    fn set(&mut self, bits: u32) {
        self.word.set(self.word.get() | bits);
    }

    fn clear(&mut self, bits: u32) {
        self.word.set(self.word.get() & !bits);
    }
}

/// The coprocessor's view of the shared word.
pub(crate) struct PeerHandle {
    word: Rc<Cell<u32>>,
}

impl PeerHandle {
    pub fn raw(&self) -> u32 {
        self.word.get()
    }

    pub fn state(&self, ch: ChannelIndex) -> ChannelState {
        token::decode(self.word.get(), ch)
    }

    /// Overwrite one channel's token. Test backdoor; the scripted peer does
    /// not model its own set/clear sequences.
    pub fn force(&self, ch: ChannelIndex, state: ChannelState) {
        let word = self.word.get() & !token::mask(ch);
        self.word.set(word | token::pattern(state, ch));
    }
}

// ---------------------------------------------------------------------------
// Exchange window
// ---------------------------------------------------------------------------

/// Scripted trigger/result block answering buffer-address queries.
pub(crate) struct FakeExchange {
    addrs: [u32; NR_CHANNELS],
    pub triggers: Rc<RefCell<Vec<u32>>>,
    pub queries: Rc<RefCell<Vec<usize>>>,
}

impl FakeExchange {
    pub fn fully_mapped() -> Self {
        Self {
            addrs: core::array::from_fn(fake_phys),
            triggers: Rc::new(RefCell::new(Vec::new())),
            queries: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Peer never allocated channel `index`.
    pub fn unmapped_at(index: usize) -> Self {
        let mut fake = Self::fully_mapped();
        fake.addrs[index] = 0;
        fake
    }
}

impl ExchangeWindow for FakeExchange {
    fn trigger(&mut self, value: u32) {
        self.triggers.borrow_mut().push(value);
    }

    fn result(&self, slot: usize) -> u32 {
        self.queries.borrow_mut().push(slot);
        self.addrs[slot]
    }
}

// ---------------------------------------------------------------------------
// Shared memory
// ---------------------------------------------------------------------------

/// Mapper backed by leaked buffers, one per mapped address.
pub(crate) struct FakeShmem {
    pub mapped: Rc<RefCell<Vec<(u32, NonNull<MessageArea>)>>>,
    fail_at: Option<usize>,
}

impl FakeShmem {
    pub fn new() -> Self {
        Self {
            mapped: Rc::new(RefCell::new(Vec::new())),
            fail_at: None,
        }
    }

    /// Fail the n-th map call (0-based).
    pub fn failing_at(n: usize) -> Self {
        let mut fake = Self::new();
        fake.fail_at = Some(n);
        fake
    }
}

impl SharedMemoryMapper for FakeShmem {
    unsafe fn map(&mut self, phys: u32, _len: usize) -> Option<NonNull<u8>> {
        let mut mapped = self.mapped.borrow_mut();
        if self.fail_at == Some(mapped.len()) {
            return None;
        }
        let area = leak_area();
        mapped.push((phys, area));
        Some(area.cast())
    }
}

// ---------------------------------------------------------------------------
// Doorbell
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum FakeDoorbellError {
    Busy,
}

/// Records rings and registrations; optionally fails the n-th registration.
pub(crate) struct FakeDoorbell {
    pub rings: Rc<RefCell<Vec<DoorbellId>>>,
    pub registrations: Rc<RefCell<Vec<(CpuId, ChannelIndex)>>>,
    fail_at: Option<usize>,
}

impl FakeDoorbell {
    pub fn new() -> Self {
        Self {
            rings: Rc::new(RefCell::new(Vec::new())),
            registrations: Rc::new(RefCell::new(Vec::new())),
            fail_at: None,
        }
    }

    pub fn failing_at(n: usize) -> Self {
        let mut fake = Self::new();
        fake.fail_at = Some(n);
        fake
    }
}

impl DoorbellController for FakeDoorbell {
    type Error = FakeDoorbellError;

    fn ring(&mut self, bell: DoorbellId) {
        self.rings.borrow_mut().push(bell);
    }

    fn register(
        &mut self,
        cpu: CpuId,
        channel: ChannelIndex,
        _handler: InboundHandler,
    ) -> Result<(), FakeDoorbellError> {
        let mut registrations = self.registrations.borrow_mut();
        if self.fail_at == Some(registrations.len()) {
            return Err(FakeDoorbellError::Busy);
        }
        registrations.push((cpu, channel));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A fully connected transport over fakes, plus the peer's handles.
pub(crate) struct Harness {
    pub mailbox: MailboxTransport<FakeSema, FakeDoorbell>,
    pub peer: PeerHandle,
    pub rings: Rc<RefCell<Vec<DoorbellId>>>,
    pub registrations: Rc<RefCell<Vec<(CpuId, ChannelIndex)>>>,
    areas: Rc<RefCell<Vec<(u32, NonNull<MessageArea>)>>>,
}

impl Harness {
    pub fn connect() -> Self {
        Self::build(FakeDoorbell::new(), cpu0)
    }

    pub fn connect_on_cpu(current_cpu: fn() -> CpuId) -> Self {
        Self::build(FakeDoorbell::new(), current_cpu)
    }

    pub fn connect_with_doorbell(doorbell: FakeDoorbell) -> Self {
        Self::build(doorbell, cpu0)
    }

    fn build(doorbell: FakeDoorbell, current_cpu: fn() -> CpuId) -> Self {
        let sema = FakeSema::all_free();
        let peer = sema.handle();
        let shmem = FakeShmem::new();
        let areas = shmem.mapped.clone();
        let rings = doorbell.rings.clone();
        let registrations = doorbell.registrations.clone();

        let mailbox = MailboxTransport::connect(TransportConfig {
            exchange: Some(FakeExchange::fully_mapped()),
            sema: Some(sema),
            shmem,
            doorbell,
            outbound_doorbell: 4,
            current_cpu,
        })
        .expect("fake handshake cannot fail");

        Self {
            mailbox,
            peer,
            rings,
            registrations,
            areas,
        }
    }

    pub fn area(&self, ch: ChannelIndex) -> *mut MessageArea {
        self.areas.borrow()[ch.index()].1.as_ptr()
    }

    /// Peer completes a request on `ch`: response written, token signalled.
    pub fn peer_respond(&self, ch: ChannelIndex, code: i32, data: &[u8]) {
        let p = self.area(ch);
        unsafe {
            (*p).code = code;
            (&mut (*p).data)[..data.len()].copy_from_slice(data);
        }
        self.peer.force(ch, ChannelState::SlaveSignalled);
    }

    /// Peer starts a request on inbound `ch`.
    pub fn peer_request(
        &self,
        ch: ChannelIndex,
        code: i32,
        flags: MessageFlags,
        data: &[u8],
    ) {
        let p = self.area(ch);
        unsafe {
            (*p).code = code;
            (*p).flags = flags.bits();
            (&mut (*p).data)[..data.len()].copy_from_slice(data);
        }
        self.peer.force(ch, ChannelState::SlaveSignalled);
    }
}
