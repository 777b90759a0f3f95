/// Declares a static global `UART_RX` producer slot protected by a `critical_section` mutex.
///
/// Both the UART receive interrupt and `main` reach the slot through this
/// name; see [`setup_uart_rx!`] and [`uart_byte_received!`].
///
/// # Arguments
/// - `$q`: capacity of the [`UartRing`](crate::ring::UartRing) (defaults to
///   [`SERIAL_RX_BUFFER_LEN`](crate::consts::SERIAL_RX_BUFFER_LEN))
///
/// # Example
/// ```rust,ignore
/// init_uart_rx!(128);
/// ```
#[macro_export]
macro_rules! init_uart_rx {
    () => {
        pub static UART_RX: $crate::isr::GlobalUartRx = $crate::isr::global_uart_rx_init();
    };
    ( $q:tt ) => {
        pub static UART_RX: $crate::isr::GlobalUartRx<$q> = $crate::isr::global_uart_rx_init();
    };
}

/// Moves a producer into the global `UART_RX` slot.
///
/// # Arguments
/// - `$producer`: the `'static` producer half of the ring
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let (producer, consumer) = ring.split();
///     setup_uart_rx!(producer);
/// }
/// ```
///
/// # Notes
/// - Requires `init_uart_rx!` to have been used earlier.
#[macro_export]
macro_rules! setup_uart_rx {
    ( $producer:expr ) => {
        $crate::isr::global_uart_rx_setup(&UART_RX, $producer)
    };
}

/// Pushes a received byte into the global `UART_RX` slot.
///
/// Evaluates to `Result<(), LinkError>`; a full ring or a missing producer
/// drops the byte.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn USART1() {
///     let _ = uart_byte_received!(uart.read_byte());
/// }
/// ```
#[macro_export]
macro_rules! uart_byte_received {
    ( $byte:expr ) => {
        $crate::isr::global_uart_byte_received(&UART_RX, $byte)
    };
}

#[cfg(test)]
mod tests {
    use crate::error::LinkError;
    use crate::ring::UartRing;

    init_uart_rx!(4);

    #[test]
    fn test_macros_share_one_slot() {
        let ring: &'static mut UartRing<4> = Box::leak(Box::new(UartRing::new()));
        let (producer, mut consumer) = ring.split();

        assert_eq!(uart_byte_received!(0x7E), Err(LinkError::RxOverrun));
        setup_uart_rx!(producer);
        assert_eq!(uart_byte_received!(0x7E), Ok(()));
        assert_eq!(uart_byte_received!(0x04), Ok(()));
        assert_eq!(consumer.next_byte(), Some(0x7E));
        assert_eq!(consumer.next_byte(), Some(0x04));
        assert_eq!(consumer.next_byte(), None);
    }
}
