//! Sharing the UART ring producer with the receive interrupt.
//!
//! The producer half of a [`UartRing`](crate::ring::UartRing) has to live in a
//! `static` so the interrupt handler can reach it. These helpers wrap it in a
//! `critical_section::Mutex` the same way for every target; the macros at the
//! crate root declare and use a global named `UART_RX`.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::consts::SERIAL_RX_BUFFER_LEN;
use crate::error::LinkError;
use crate::ring::RxProducer;

/// The global slot holding the interrupt side of the UART ring.
pub type GlobalUartRx<const Q: usize = SERIAL_RX_BUFFER_LEN> =
    Mutex<RefCell<Option<RxProducer<'static, Q>>>>;

/// Used to initialize the global static producer slot.
///
/// # Returns
/// * An empty slot
///
/// # Example
/// ```rust,ignore
/// use sniffer_link::isr::{global_uart_rx_init, GlobalUartRx};
///
/// static UART_RX: GlobalUartRx<128> = global_uart_rx_init::<128>();
/// ```
pub const fn global_uart_rx_init<const Q: usize>() -> GlobalUartRx<Q> {
    Mutex::new(RefCell::new(None))
}

/// Moves the producer into the global slot.
///
/// # Arguments
/// * The global static slot
/// * The producer half of a `'static` ring
///
/// # Example
/// ```rust,ignore
/// static mut RING: UartRing<128> = UartRing::new();
///
/// fn main() {
///     let (producer, consumer) = unsafe { (*core::ptr::addr_of_mut!(RING)).split() };
///     global_uart_rx_setup(&UART_RX, producer);
/// }
/// ```
pub fn global_uart_rx_setup<const Q: usize>(
    global: &'static GlobalUartRx<Q>,
    producer: RxProducer<'static, Q>,
) {
    critical_section::with(|cs| {
        let _ = global.borrow(cs).replace(Some(producer));
    });
}

/// Pushes one byte from the UART receive interrupt.
///
/// Bytes arriving before [`global_uart_rx_setup`] are dropped and reported as
/// [`LinkError::RxOverrun`].
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn USART1() {
///     let _ = global_uart_byte_received(&UART_RX, uart.read_byte());
/// }
/// ```
pub fn global_uart_byte_received<const Q: usize>(
    global: &'static GlobalUartRx<Q>,
    byte: u8,
) -> Result<(), LinkError> {
    critical_section::with(|cs| match global.borrow_ref_mut(cs).as_mut() {
        Some(producer) => producer.produce(byte),
        None => Err(LinkError::RxOverrun),
    })
}

/// Bytes dropped so far by the producer in the global slot.
pub fn global_uart_overruns<const Q: usize>(global: &'static GlobalUartRx<Q>) -> u16 {
    critical_section::with(|cs| global.borrow_ref(cs).as_ref().map_or(0, |p| p.overruns))
}
