//! SPI transaction engine.
//!
//! Drivers describe a transfer as a list of [`Segment`]s and submit it
//! against an [`SpiBus`]. The engine copies the segments into a pooled
//! transaction slot, appends the slot to the port's FIFO and, when the port
//! is free, selects the chip and starts the transfer by DMA. The DMA
//! completion interrupt releases the chip, copies received bytes out, runs
//! the completion callback, recycles the slot and starts the next queued
//! transaction.
//!
//! # Ownership protocol
//!
//! Slot bodies live outside the critical-section state so the DMA engine can
//! stream them without interrupts being masked. Access follows the status:
//!
//! | Status       | Body owned by                                  |
//! |--------------|------------------------------------------------|
//! | `Waiting`    | the submitting call                            |
//! | `Ready`      | nobody (read only during the claim)            |
//! | `InProgress` | the executor, then the completion handler      |
//!
//! Every status transition happens inside a critical section.
//!
//! # Polled mode
//!
//! Before [`SpiEngine::enable_dma`] is called, on ports without a DMA
//! binding, and for [`SpiEngine::submit_and_wait`], transfers run byte by
//! byte inside the dispatching call and complete before it returns.
//!
//! The completion interrupt only chains DMA transfers. A polled transaction
//! reached from it stays queued and is marked deferred until the next
//! [`SpiEngine::continue_port`] or [`SpiEngine::wait`] from thread context.

use core::cell::UnsafeCell;
use core::sync::atomic::{Ordering, compiler_fence};

use embedded_hal::spi::Mode;

use crate::board::BoardConfig;
use crate::constants::{DMA_PRIORITY, SPI_PORT_COUNT, SPI_TXN_BUFFER_SIZE, SPI_TXN_MAX, SPI_TXN_SEG_MAX};
use crate::error::{SpiError, SpiResult};
use crate::fatal::unwrap_or_failloop;
use crate::fmt::{debug, info, trace, warn};
use crate::hal::{DmaBinding, DmaBuffer, SpiHardware, SpiPort};
use crate::sync::CriticalSectionCell;

use super::bus::SpiBus;
use super::pool::TxnPool;
use super::queue::BusQueue;
use super::segment::{self, Segment};
use super::txn::{Completion, Transaction, TxnStatus};

// =============================================================================
// Internal State
// =============================================================================

struct TxnSlot<const BUF: usize>(UnsafeCell<Transaction<BUF>>);

// SAFETY: access to the body is serialized by the status protocol above.
unsafe impl<const BUF: usize> Sync for TxnSlot<BUF> {}

impl<const BUF: usize> TxnSlot<BUF> {
    const fn new() -> Self {
        Self(UnsafeCell::new(Transaction::new()))
    }
}

/// Register writes decided under the critical section, applied after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Reconfigure {
    hz: Option<u32>,
    mode: Option<Mode>,
}

impl Reconfigure {
    fn is_some(&self) -> bool {
        self.hz.is_some() || self.mode.is_some()
    }
}

struct PortState<const N: usize> {
    is_init: bool,
    dma: Option<DmaBinding>,
    /// A transfer holds the bus (chip selected)
    transferring: bool,
    /// Dispatch was refused by the readiness or DMA capability check, or
    /// the head needs a polled transfer and was reached from the interrupt
    deferred: bool,
    /// Last programmed clock, 0 = never
    hz: u32,
    /// Last programmed mode
    mode: Option<Mode>,
    reconfigurations: u32,
    queue: BusQueue<N>,
}

impl<const N: usize> PortState<N> {
    const fn new() -> Self {
        Self {
            is_init: false,
            dma: None,
            transferring: false,
            deferred: false,
            hz: 0,
            mode: None,
            reconfigurations: 0,
            queue: BusQueue::new(),
        }
    }

    /// Record the settings of the next transfer, returning what changed.
    fn reconfigure(&mut self, hz: u32, mode: Mode) -> Reconfigure {
        let mut change = Reconfigure::default();
        if self.hz != hz {
            self.hz = hz;
            change.hz = Some(hz);
        }
        if self.mode != Some(mode) {
            self.mode = Some(mode);
            change.mode = Some(mode);
        }
        if change.is_some() {
            self.reconfigurations = self.reconfigurations.wrapping_add(1);
        }
        change
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.transferring
    }
}

struct EngineState<const N: usize> {
    pool: TxnPool<N>,
    status: [TxnStatus; N],
    ports: [PortState<N>; SPI_PORT_COUNT],
    dma_enabled: bool,
}

/// Where a dispatch is attempted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Main loop; may run polled transfers inline
    Thread,
    /// DMA completion interrupt; starts DMA transfers only
    Interrupt,
}

/// A claimed transaction ready to start.
struct Dispatch {
    slot: usize,
    dma: bool,
    reconfigure: Reconfigure,
}

// =============================================================================
// Engine
// =============================================================================

/// SPI transaction engine with `N` pooled slots of `BUF` bytes each.
///
/// Place it in a `static` and call [`on_dma_complete`](Self::on_dma_complete)
/// from each port's DMA receive-stream interrupt:
///
/// ```ignore
/// static SPI: SpiEngineDefault<Stm32Spi> = SpiEngine::new(Stm32Spi);
///
/// SPI.init(&GenericF405::CONFIG);
/// SPI.enable_dma();
///
/// static WHO_AM_I: RxBuffer<1> = RxBuffer::new();
/// let gyro = GenericF405::gyro_bus();
/// SPI.submit_continue(&gyro, &[Segment::bytes(&[0x75 | 0x80]), Segment::read(&WHO_AM_I, 1)]);
/// SPI.wait(gyro.port);
///
/// #[interrupt]
/// fn DMA2_STREAM0() {
///     SPI.on_dma_complete(SpiPort::Spi1);
/// }
/// ```
pub struct SpiEngine<H, const N: usize = SPI_TXN_MAX, const BUF: usize = SPI_TXN_BUFFER_SIZE> {
    hw: H,
    state: CriticalSectionCell<EngineState<N>>,
    slots: [TxnSlot<BUF>; N],
}

/// Engine with the default pool (32 slots of 512 bytes).
pub type SpiEngineDefault<H> = SpiEngine<H, SPI_TXN_MAX, SPI_TXN_BUFFER_SIZE>;

impl<H, const N: usize, const BUF: usize> SpiEngine<H, N, BUF> {
    /// Create an engine (const, suitable for statics).
    pub const fn new(hw: H) -> Self {
        Self {
            hw,
            state: CriticalSectionCell::new(EngineState {
                pool: TxnPool::new(),
                status: [TxnStatus::Idle; N],
                ports: [const { PortState::new() }; SPI_PORT_COUNT],
                dma_enabled: false,
            }),
            slots: [const { TxnSlot::new() }; N],
        }
    }

    /// Hardware implementation.
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Shared view of a slot body.
    ///
    /// # Safety
    ///
    /// The slot must be `Ready` and the caller inside the critical section
    /// that claims it, or the caller must own it under the status protocol.
    unsafe fn txn(&self, slot: usize) -> &Transaction<BUF> {
        // SAFETY: upheld by the caller.
        unsafe { &*self.slots[slot].0.get() }
    }

    /// Exclusive view of a slot body.
    ///
    /// # Safety
    ///
    /// The caller must own the slot under the status protocol: `Waiting` for
    /// the submitter, `InProgress` for the executor and completion handler.
    #[allow(clippy::mut_from_ref)]
    unsafe fn txn_mut(&self, slot: usize) -> &mut Transaction<BUF> {
        // SAFETY: upheld by the caller.
        unsafe { &mut *self.slots[slot].0.get() }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Any transaction slot free?
    pub fn has_free_slot(&self) -> bool {
        self.state.with_ref(|s| s.pool.has_free())
    }

    /// Number of free transaction slots.
    pub fn free_slot_count(&self) -> usize {
        self.state.with_ref(|s| s.pool.free_count())
    }

    /// Nothing queued and nothing in flight on `port`.
    pub fn is_idle(&self, port: SpiPort) -> bool {
        self.state.with_ref(|s| s.ports[port.index()].is_idle())
    }

    /// Transactions queued on `port`, including the one in flight.
    pub fn queued(&self, port: SpiPort) -> usize {
        self.state.with_ref(|s| s.ports[port.index()].queue.len())
    }

    /// Transactions currently `InProgress` on `port` (0 or 1).
    pub fn in_flight(&self, port: SpiPort) -> usize {
        self.state.with_ref(|s| {
            s.ports[port.index()]
                .queue
                .iter()
                .filter(|&slot| s.status[slot] == TxnStatus::InProgress)
                .count()
        })
    }

    /// Number of times `port` had its clock or mode reprogrammed.
    pub fn reconfigurations(&self, port: SpiPort) -> u32 {
        self.state.with_ref(|s| s.ports[port.index()].reconfigurations)
    }

    /// Has `port` been initialized?
    pub fn is_port_initialized(&self, port: SpiPort) -> bool {
        self.state.with_ref(|s| s.ports[port.index()].is_init)
    }

    /// Are DMA transfers enabled?
    pub fn dma_enabled(&self) -> bool {
        self.state.with_ref(|s| s.dma_enabled)
    }
}

impl<H: SpiHardware, const N: usize, const BUF: usize> SpiEngine<H, N, BUF> {
    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize every SPI port and chip-select of a board.
    ///
    /// Ports come up with their DMA binding and completion interrupt, but
    /// transfers stay polled until [`enable_dma`](Self::enable_dma).
    pub fn init(&self, board: &BoardConfig) {
        info!("spi: init board {}", board.name);
        for def in board.spi_ports {
            self.init_port(def.port, def.dma);
        }
        for device in board.spi_devices() {
            self.hw.init_chip_select(device.nss);
        }
    }

    /// Prepare one device: chip-select idle high, and its port initialized
    /// if nothing has initialized it yet (without DMA).
    pub fn init_bus(&self, bus: &SpiBus) {
        self.hw.init_chip_select(bus.nss);
        self.init_port(bus.port, None);
    }

    fn init_port(&self, port: SpiPort, dma: Option<DmaBinding>) {
        let first = self.state.with(|s| {
            let p = &mut s.ports[port.index()];
            if p.is_init {
                return false;
            }
            p.is_init = true;
            p.dma = dma;
            true
        });
        if !first {
            return;
        }

        self.hw.init_port(port, dma);
        if dma.is_some() {
            self.hw.dma_interrupt_enable(port, DMA_PRIORITY);
        }
        info!("spi{}: initialized, dma {}", port.number(), dma.is_some());
    }

    /// Switch ports with a DMA binding from polled to DMA transfers. Call
    /// once interrupts are configured.
    pub fn enable_dma(&self) {
        self.state.with(|s| s.dma_enabled = true);
        info!("spi: dma enabled");
    }

    // =========================================================================
    // Submission
    // =========================================================================

    fn allocate(&self) -> Option<usize> {
        self.state.with(|s| {
            let slot = s.pool.allocate()?;
            s.status[slot] = TxnStatus::Waiting;
            Some(slot)
        })
    }

    /// Validate, take a slot, fill it and queue it as `Ready`.
    ///
    /// Segments are checked before allocation, so an error never holds a
    /// slot and a slot only returns to `Idle` through completion.
    fn enqueue(
        &self,
        bus: &SpiBus,
        segments: &[Segment<'_>],
        done: Option<Completion>,
        polled: bool,
    ) -> SpiResult<()> {
        segment::validate(segments, BUF, SPI_TXN_SEG_MAX)?;
        let slot = self.allocate().ok_or(SpiError::PoolExhausted)?;

        // SAFETY: `slot` is Waiting and owned by this call.
        let txn = unsafe { self.txn_mut(slot) };
        txn.prepare(bus, segments, done, polled);
        let size = txn.size;

        self.state.with(|s| {
            let queued = s.ports[bus.port.index()].queue.push(slot);
            debug_assert!(queued, "bus queue shorter than pool");
            // Body writes must be visible before the slot reads as Ready.
            compiler_fence(Ordering::Release);
            s.status[slot] = TxnStatus::Ready;
        });

        trace!("spi{}: queued slot {} ({} bytes)", bus.port.number(), slot, size);
        Ok(())
    }

    /// Queue a transaction.
    ///
    /// Nothing is started; call [`continue_port`](Self::continue_port) or use
    /// [`submit_continue`](Self::submit_continue). An exhausted pool or
    /// segments that do not fit halt via [`failloop`](crate::fatal::failloop).
    pub fn submit(&self, bus: &SpiBus, segments: &[Segment<'_>]) {
        unwrap_or_failloop(self.enqueue(bus, segments, None, false));
    }

    /// Queue a transaction with a completion callback. Provisioning errors
    /// halt via [`failloop`](crate::fatal::failloop).
    pub fn submit_ex(&self, bus: &SpiBus, segments: &[Segment<'_>], done: Completion) {
        unwrap_or_failloop(self.enqueue(bus, segments, Some(done), false));
    }

    /// Queue a transaction and try to start the port right away.
    pub fn submit_continue(&self, bus: &SpiBus, segments: &[Segment<'_>]) {
        self.submit(bus, segments);
        self.continue_port(bus.port);
    }

    /// Run a transaction synchronously with polled transfers.
    ///
    /// Waits for the port to drain, runs the transaction byte by byte and
    /// returns once it completed. Do not call from a completion callback.
    pub fn submit_and_wait(&self, bus: &SpiBus, segments: &[Segment<'_>]) {
        self.wait(bus.port);
        unwrap_or_failloop(self.enqueue(bus, segments, None, true));
        self.wait(bus.port);
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Claim the head of `port`'s queue if it may start now.
    fn claim_next(&self, port: SpiPort, context: Context) -> Option<Dispatch> {
        self.state.with(|s| {
            let dma_enabled = s.dma_enabled;
            let EngineState { status, ports, .. } = s;
            let p = &mut ports[port.index()];

            if p.transferring {
                return None;
            }
            let slot = p.queue.front()?;
            if status[slot] != TxnStatus::Ready {
                return None;
            }

            // SAFETY: Ready slots are not written; the claim happens within
            // this critical section.
            let txn = unsafe { self.txn(slot) };
            let dma = dma_enabled && p.dma.is_some() && !txn.polled() && txn.size > 0;
            let blocked = !dma && context == Context::Interrupt;
            if blocked || !txn.bus.is_ready() || (dma && !self.hw.dma_can_start(port)) {
                p.deferred = true;
                return None;
            }

            p.deferred = false;
            p.transferring = true;
            status[slot] = TxnStatus::InProgress;
            let reconfigure = p.reconfigure(txn.bus.hz, txn.bus.mode);
            Some(Dispatch {
                slot,
                dma,
                reconfigure,
            })
        })
    }

    /// Start a claimed transaction. Returns `true` if it ran to completion
    /// (polled), `false` if the DMA completion interrupt will finish it.
    fn execute(&self, port: SpiPort, dispatch: &Dispatch) -> bool {
        if dispatch.reconfigure.is_some() {
            debug!(
                "spi{}: reconfigure clock {:?} mode {}",
                port.number(),
                dispatch.reconfigure.hz,
                dispatch.reconfigure.mode.is_some()
            );
        }
        if let Some(hz) = dispatch.reconfigure.hz {
            self.hw.set_clock(port, hz);
        }
        if let Some(mode) = dispatch.reconfigure.mode {
            self.hw.set_mode(port, mode);
        }

        // SAFETY: the slot is InProgress and was claimed by the caller.
        let txn = unsafe { self.txn_mut(dispatch.slot) };
        self.hw.chip_select(txn.bus.nss, true);

        if dispatch.dma {
            let buffer = DmaBuffer::new(txn.buffer.as_mut_ptr(), txn.size);
            self.hw.dma_begin(port, buffer, txn.delayed_rx());
            return false;
        }

        self.hw.enable(port, true);
        for byte in &mut txn.buffer[..txn.size] {
            *byte = self.hw.transfer_byte(port, *byte);
        }
        self.hw.enable(port, false);
        true
    }

    /// Start the next ready transaction on `port` if the bus is free.
    ///
    /// Polled transactions complete inside this call and the next one is
    /// considered, so this returns only once the port is idle, waiting on
    /// DMA, or deferred. Returns `true` if anything was started.
    pub fn continue_port(&self, port: SpiPort) -> bool {
        self.dispatch(port, Context::Thread)
    }

    fn dispatch(&self, port: SpiPort, context: Context) -> bool {
        let mut started = false;
        while let Some(dispatch) = self.claim_next(port, context) {
            started = true;
            if !self.execute(port, &dispatch) {
                break;
            }
            self.complete(port);
        }
        started
    }

    /// Finish the in-flight transaction at the head of `port`'s queue.
    fn complete(&self, port: SpiPort) -> bool {
        let slot = self.state.with_ref(|s| {
            let slot = s.ports[port.index()].queue.front()?;
            (s.status[slot] == TxnStatus::InProgress).then_some(slot)
        });
        let Some(slot) = slot else {
            warn!("spi{}: completion with no transfer in flight", port.number());
            return false;
        };

        // SAFETY: InProgress slot at the queue head; the completion path owns it.
        let txn = unsafe { self.txn_mut(slot) };
        self.hw.chip_select(txn.bus.nss, false);
        txn.deliver_rx();
        if let Some(done) = txn.done.take() {
            done.call();
        }

        self.state.with(|s| {
            let p = &mut s.ports[port.index()];
            p.queue.pop();
            p.transferring = false;
            s.status[slot] = TxnStatus::Idle;
            s.pool.release(slot);
        });
        trace!("spi{}: slot {} done", port.number(), slot);
        true
    }

    /// Retry DMA dispatch on ports whose dispatch was refused while another
    /// port held a shared resource.
    fn retry_deferred(&self, except: SpiPort) {
        let deferred: [bool; SPI_PORT_COUNT] =
            self.state.with_ref(|s| core::array::from_fn(|i| s.ports[i].deferred));
        for port in SpiPort::ALL {
            if port != except && deferred[port.index()] {
                self.dispatch(port, Context::Interrupt);
            }
        }
    }

    /// DMA receive-complete interrupt entry for `port`.
    ///
    /// Ignores the call unless the completion flag is set, then releases the
    /// transaction and chains the next DMA transfer on this port and any
    /// deferred port. Polled work found here is left for thread context.
    pub fn on_dma_complete(&self, port: SpiPort) {
        if !self.hw.dma_transfer_complete(port) {
            return;
        }
        self.hw.dma_finish(port);
        if self.complete(port) {
            self.dispatch(port, Context::Interrupt);
            self.retry_deferred(port);
        }
    }

    /// Spin until `port` has nothing queued or in flight, kicking the queue.
    ///
    /// No timeout: a bus that never completes hangs here.
    pub fn wait(&self, port: SpiPort) {
        while !self.is_idle(port) {
            self.continue_port(port);
            core::hint::spin_loop();
        }
    }
}
