//! Interrupt-driven serial streaming over the UART data register

use core::cell::RefCell;
use critical_section::Mutex;
use heapless::spsc::Queue;
use portable_atomic::{AtomicU32, Ordering};

use crate::hal::{PortError, SerialRegisters};

/// Default line rate
pub const BAUD_RATE: u32 = 115_200;

/// Receive buffer size; the queue holds one byte less
pub const RX_BUFFER_SIZE: usize = 128;

/// Transmit buffer size; the queue holds one byte less
pub const TX_BUFFER_SIZE: usize = 64;

/// Buffered UART.
///
/// Bytes written from main-line code are queued and streamed out by the
/// data-register-empty vector; received bytes are queued by the receive
/// vector until read.
pub struct Serial<U, const RX: usize = RX_BUFFER_SIZE, const TX: usize = TX_BUFFER_SIZE> {
    hw: U,
    rx: Mutex<RefCell<Queue<u8, RX>>>,
    tx: Mutex<RefCell<Queue<u8, TX>>>,
    rx_dropped: AtomicU32,
}

impl<U: SerialRegisters, const RX: usize, const TX: usize> Serial<U, RX, TX> {
    pub const fn new(hw: U) -> Self {
        Self {
            hw,
            rx: Mutex::new(RefCell::new(Queue::new())),
            tx: Mutex::new(RefCell::new(Queue::new())),
            rx_dropped: AtomicU32::new(0),
        }
    }

    pub fn init(&self, baud: u32) {
        critical_section::with(|cs| {
            self.hw.init(baud);
            *self.rx.borrow_ref_mut(cs) = Queue::new();
            *self.tx.borrow_ref_mut(cs) = Queue::new();
        });

        #[cfg(feature = "defmt")]
        defmt::info!("📡 Serial ready at {} baud", baud);
    }

    /// Queue one byte and make sure streaming is running
    pub fn write(&self, byte: u8) -> Result<(), PortError> {
        critical_section::with(|cs| {
            self.tx.borrow_ref_mut(cs).enqueue(byte).map_err(|_| PortError::BufferFull)?;
            self.hw.enable_tx_interrupt(true);
            Ok(())
        })
    }

    /// Queue as many bytes as fit; returns how many were taken
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|&&b| self.write(b).is_ok()).count()
    }

    /// Next received byte, if any
    pub fn read(&self) -> Option<u8> {
        critical_section::with(|cs| self.rx.borrow_ref_mut(cs).dequeue())
    }

    /// Bytes waiting to be read
    pub fn rx_available(&self) -> usize {
        critical_section::with(|cs| self.rx.borrow_ref(cs).len())
    }

    /// Bytes waiting to be sent
    pub fn tx_pending(&self) -> usize {
        critical_section::with(|cs| self.tx.borrow_ref(cs).len())
    }

    /// Drop everything received but not read
    pub fn reset_read_buffer(&self) {
        critical_section::with(|cs| *self.rx.borrow_ref_mut(cs) = Queue::new());
    }

    /// Bytes lost to a full receive buffer
    pub fn rx_dropped(&self) -> u32 {
        self.rx_dropped.load(Ordering::Relaxed)
    }

    /// Receive-complete vector body
    pub fn on_rx_interrupt(&self) {
        let byte = self.hw.read_data();
        let stored = critical_section::with(|cs| self.rx.borrow_ref_mut(cs).enqueue(byte).is_ok());
        if !stored {
            self.rx_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Data-register-empty vector body: send one byte or stop streaming
    pub fn on_tx_interrupt(&self) {
        critical_section::with(|cs| match self.tx.borrow_ref_mut(cs).dequeue() {
            Some(byte) => self.hw.write_data(byte),
            None => self.hw.enable_tx_interrupt(false),
        });
    }

    pub fn hardware(&self) -> &U {
        &self.hw
    }
}
