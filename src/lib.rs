#![no_std]
//! # `ad9833` - Embedded driver for the AD9833 DDS waveform generator chip
//!
//! The AD9833 is a low-power programmable waveform generator sold by Analog Devices. Check the [datasheet](https://www.analog.com/media/en/technical-documentation/data-sheets/AD9833.pdf) for general information about it.
//!
//! This crate implements an interface for embedded devices to control such an AD9833 chip,
//! plus a small [`SignalConditioner`] that models the low-pass/DC-offset conditioning
//! applied to the chip's sampled analog output.
//!
//! The driver is generic over any SPI bus implementing
//! [`embedded_hal::blocking::spi::Write`], a chip-select (FSYNC) pin implementing
//! [`embedded_hal::digital::v2::OutputPin`], and a
//! [`embedded_hal::blocking::delay::DelayUs`] provider used during reset.
//!
//! ## Usage example
//!
//! This example uses the [`esp-idf-hal`](https://github.com/esp-rs/esp-idf-hal). The `ad9833`
//! library is not device specific though, so it should be easy to adapt the example to other
//! devices.
//!
//! ```ignore
//! // `spi` is a configured SPI master: mode 2, up to 8 MHz, MSB first.
//! // `fsync` is a push-pull output pin, `delay` a microsecond delay provider.
//! let mut dds = ad9833::Ad9833::new(spi, fsync, delay)
//!     .initialize()?;
//!
//! // Bring the output to a defined state, then generate a 1 kHz sine.
//! dds.reset()?;
//! dds.set_frequency(1_000.0, ad9833::Waveform::Sine)?;
//! ```
//!
//! ## Supported features
//!
//! - [x] Reset the device
//! - [x] Program frequency register 0 (two-write B28 mode)
//! - [x] Sine / triangle / square output
//! - [x] DAC power-down (sleep)
//! - [x] Output conditioning filter model
//! - [ ] Phase registers
//! - [ ] Frequency register 1 / FSELECT switching
//!
//! ## A note about the serial bus
//!
//! The AD9833 is write-only: it has no readback path and never acknowledges a
//! transfer. Each 16-bit word is framed by FSYNC (chip select) going low, clocked
//! MSB first, and latched when FSYNC returns high. The device wants SPI mode 2
//! (CPOL=1, CPHA=0) at up to 8 MHz; this crate does not configure the bus, it
//! expects the `SPI` peripheral handed to [`Ad9833::new`] to be set up that way.
//!
//! Because there is no acknowledgment channel, the only errors this driver can
//! surface are transport errors from the HAL ([`Error`]). All numeric inputs are
//! clamped to their documented ranges rather than rejected.

pub mod conditioner;
pub mod control;
pub mod dds;
pub mod util;

pub use conditioner::SignalConditioner;
pub use control::{ControlRegister, Waveform};
pub use dds::{mode, Ad9833, Error, MAX_FREQUENCY, MIN_FREQUENCY};
pub use util::REFERENCE_CLOCK_HZ;
