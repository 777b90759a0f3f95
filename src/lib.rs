//! # sniffer-link
//!
//! A portable, no_std receive-side engine for the serial link between an IEEE 802.15.4
//! sniffer and its capture host.
//!
//! The host talks to the sniffer over a UART using HDLC-style frames. This crate implements
//! the device end of that link:
//! - an interrupt-fed byte ring using `heapless` SPSC queues
//! - a byte-at-a-time framing state machine with CRC16 validation
//! - ACK/NACK sliding-window control over the outbound packet buffer
//! - RESET/STOP handling behind small `Radio`, `Indicators` and `Transmitter` traits
//! - interrupt-safe shared state with `critical-section`
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` and enables the `std` backends of `thiserror` and `critical-section` |
//! | `defmt-0-3` | Uses `defmt` logging |
//! | `log`       | Uses `log` logging |
//!
//! ## Wire format
//!
//! `0x7E, <escaped [type, len, payload.., crc_hi, crc_lo]>, 0x7E`
//!
//! | Type | Message | Payload |
//! |------|---------|---------|
//! | 1    | ACK     | index (u16 BE), sequence number (u16 BE) |
//! | 2    | NACK    | index (u16 BE), sequence number (u16 BE) |
//! | 3    | RESET   | channel (11..=26) |
//! | 4    | STOP    | none |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sniffer_link::{buffer::PacketBuffer, link::SerialLink, ring::UartRing};
//!
//! static PACKETS: PacketBuffer<1024> = PacketBuffer::new();
//! sniffer_link::init_uart_rx!();
//!
//! let (producer, mut consumer) = ring.split();
//! sniffer_link::setup_uart_rx!(producer);
//!
//! let mut link = SerialLink::new(&PACKETS, radio, leds, tx);
//! loop {
//!     let _ = link.receive(&mut consumer);
//!     while let Some(packet) = link.next_packet() {
//!         uart.write_all(&packet.data);
//!     }
//! }
//! ```
//!
//! And from the UART receive interrupt:
//!
//! ```rust,ignore
//! #[interrupt]
//! fn USART1() {
//!     let _ = sniffer_link::uart_byte_received!(uart.read_byte());
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - The radio path stores sniffed frames with [`buffer::PacketBuffer::store_packet`]
//!   from its own interrupt; the link only ever reads the radio index once per check
//! - Only one [`link::SerialLink`] should be active per packet buffer
//! - Every framing or window error is recovered by resending from the last
//!   acknowledged packet; nothing in this crate panics on bad input
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub use critical_section;
pub use heapless;

#[macro_use]
mod fmt;
#[macro_use]
mod macros;

pub mod buffer;
pub mod consts;
pub mod crc;
pub mod error;
pub mod frame;
pub mod hal;
pub mod isr;
pub mod link;
pub mod message;
pub mod ring;
pub mod window;
