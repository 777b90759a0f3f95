//! Interrupt-fed UART receive ring.
//!
//! The UART receive interrupt pushes every byte into a fixed-capacity
//! single-producer/single-consumer queue; the polled main loop drains it and
//! feeds the bytes to the [`SerialLink`](crate::link::SerialLink).
//!
//! ## Design Notes
//!
//! The producer only ever moves the write index and the consumer only ever
//! moves the read index, so no lock is needed between the interrupt and the
//! main loop. When the main loop falls behind and the queue fills up, new bytes
//! are dropped and counted; the broken frame fails its CRC and the host resends.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sniffer_link::ring::UartRing;
//!
//! let mut ring: UartRing<128> = UartRing::new();
//! let (mut producer, mut consumer) = ring.split();
//!
//! // UART interrupt
//! let _ = producer.on_interrupt(|| uart.read());
//!
//! // main loop
//! let _ = link.receive(&mut consumer);
//! ```

use core::fmt;

use heapless::spsc::{Consumer, Producer, Queue};

use crate::consts::SERIAL_RX_BUFFER_LEN;
use crate::error::LinkError;

/// Backing storage for the UART receive queue.
///
/// Holds at most `Q - 1` bytes.
pub struct UartRing<const Q: usize = SERIAL_RX_BUFFER_LEN> {
    queue: Queue<u8, Q>,
}

impl<const Q: usize> UartRing<Q> {
    /// Creates an empty ring. Usable in `static` initializers.
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }

    /// Number of bytes the ring can hold between two drains.
    pub const fn capacity(&self) -> usize {
        Q - 1
    }

    /// Splits the ring into its interrupt half and its polled half.
    pub fn split(&mut self) -> (RxProducer<'_, Q>, RxConsumer<'_, Q>) {
        let (producer, consumer) = self.queue.split();
        (
            RxProducer {
                inner: producer,
                overruns: 0,
            },
            RxConsumer { inner: consumer },
        )
    }
}

impl<const Q: usize> Default for UartRing<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const Q: usize> fmt::Debug for UartRing<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UartRing")
            .field("len", &self.queue.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Interrupt side of the ring.
pub struct RxProducer<'a, const Q: usize> {
    inner: Producer<'a, u8, Q>,
    /// Bytes dropped because the ring was full.
    pub overruns: u16,
}

impl<const Q: usize> RxProducer<'_, Q> {
    /// Appends one received byte.
    ///
    /// Never blocks. A full ring drops the byte and returns [`LinkError::RxOverrun`].
    pub fn produce(&mut self, byte: u8) -> Result<(), LinkError> {
        match self.inner.enqueue(byte) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.overruns = self.overruns.wrapping_add(1);
                Err(LinkError::RxOverrun)
            }
        }
    }

    /// Moves every byte the UART has available into the ring.
    ///
    /// `read` is the UART driver's non-blocking read; it is called until it
    /// reports [`nb::Error::WouldBlock`] or fails.
    ///
    /// # Returns
    /// The number of bytes read from the UART, dropped ones included.
    pub fn on_interrupt<E, F>(&mut self, mut read: F) -> usize
    where
        F: FnMut() -> nb::Result<u8, E>,
    {
        let mut count = 0;
        while let Ok(byte) = read() {
            let _ = self.produce(byte);
            count += 1;
        }
        count
    }
}

impl<const Q: usize> fmt::Debug for RxProducer<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxProducer")
            .field("overruns", &self.overruns)
            .finish()
    }
}

/// Polled side of the ring.
pub struct RxConsumer<'a, const Q: usize> {
    inner: Consumer<'a, u8, Q>,
}

impl<const Q: usize> RxConsumer<'_, Q> {
    /// Takes the oldest byte, if any.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.inner.dequeue();
        if let Some(b) = byte {
            trace!("uart rx {}", b);
        }
        byte
    }

    /// Number of bytes waiting to be drained.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the ring is drained.
    pub fn is_empty(&self) -> bool {
        !self.inner.ready()
    }
}

impl<const Q: usize> Iterator for RxConsumer<'_, Q> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.next_byte()
    }
}

impl<const Q: usize> fmt::Debug for RxConsumer<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxConsumer")
            .field("len", &self.len())
            .finish()
    }
}
