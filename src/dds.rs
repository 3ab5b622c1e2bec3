//! The AD9833 register protocol driver.

use core::marker::PhantomData;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Write;
use embedded_hal::digital::v2::OutputPin;

use crate::control::{ControlRegister, Waveform};
use crate::util;

/// Lowest programmable output frequency, in Hz.
pub const MIN_FREQUENCY: f32 = 0.01;

/// Highest programmable output frequency, in Hz: half the 25 MHz reference clock.
pub const MAX_FREQUENCY: f32 = 12_500_000.0;

/// Address word announcing a two-write load of frequency register 0.
const FREQ0_LOAD_COMMAND: u16 = 0x4000;

/// Datasheet minimum settling time after asserting RESET, in microseconds.
const RESET_SETTLE_US: u16 = 10;

/// Transport failure while talking to the device.
///
/// The AD9833 itself never reports errors (the protocol has no status
/// response); the only thing that can fail is the HAL transport underneath.
#[derive(Debug)]
pub enum Error<SpiE, PinE> {
    /// The SPI bus rejected a transfer.
    Spi(SpiE),
    /// The FSYNC line could not be driven.
    Pin(PinE),
}

/// Represents a connection to an AD9833 device.
///
/// See [crate level documentation](crate), or check the [`new`](Ad9833::new)
/// method for an entry point.
///
/// The driver owns the bus handle, the FSYNC pin and a delay provider, plus a
/// mirror of the chip's write-only control register. One instance is the sole
/// owner of that mirror: callers sharing a device across contexts must
/// serialize access around the whole operation, since the four-write frequency
/// sequence is not atomic on the wire.
pub struct Ad9833<Mode, SPI, FSYNC, DELAY> {
    spi: SPI,
    fsync: FSYNC,
    delay: DELAY,
    control: ControlRegister,
    marker: PhantomData<Mode>,
}

impl<SPI, FSYNC, DELAY, SpiE, PinE> Ad9833<mode::Init, SPI, FSYNC, DELAY>
where
    SPI: Write<u8, Error = SpiE>,
    FSYNC: OutputPin<Error = PinE>,
    DELAY: DelayUs<u16>,
{
    /// Construct a new Ad9833 instance, in initial mode.
    ///
    /// This call does not communicate with the device yet. You need to call
    /// [`initialize`](Ad9833::initialize) before you can program anything.
    ///
    /// The `spi` peripheral must already be configured for the device: SPI
    /// mode 2 (CPOL=1, CPHA=0), up to 8 MHz, MSB first. `fsync` is the
    /// chip-select line framing each 16-bit word; `delay` provides the
    /// blocking settling wait used by [`reset`](Ad9833::reset).
    pub fn new(spi: SPI, fsync: FSYNC, delay: DELAY) -> Self {
        Self {
            spi,
            fsync,
            delay,
            control: ControlRegister::default(),
            marker: PhantomData,
        }
    }

    /// Initialize the bus side of the device and zero the register mirror.
    ///
    /// Drives FSYNC to its idle-high level. No reset pulse is issued: the
    /// device stays in its power-on state, so the output is undefined until
    /// [`reset`](Ad9833::reset) and [`set_frequency`](Ad9833::set_frequency)
    /// are called.
    pub fn initialize(mut self) -> Result<Ad9833<mode::Ready, SPI, FSYNC, DELAY>, Error<SpiE, PinE>> {
        self.fsync.set_high().map_err(Error::Pin)?;

        Ok(Ad9833 {
            spi: self.spi,
            fsync: self.fsync,
            delay: self.delay,
            control: ControlRegister::default(),
            marker: PhantomData,
        })
    }
}

impl<SPI, FSYNC, DELAY, SpiE, PinE> Ad9833<mode::Ready, SPI, FSYNC, DELAY>
where
    SPI: Write<u8, Error = SpiE>,
    FSYNC: OutputPin<Error = PinE>,
    DELAY: DelayUs<u16>,
{
    /// Pulse the RESET bit, leaving the device in midscale hold.
    ///
    /// Sets RESET in the mirror, writes it, waits the datasheet minimum of
    /// 10 µs, then clears the bit and writes again. The output stays at
    /// midscale until the next [`set_frequency`](Ad9833::set_frequency).
    pub fn reset(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.control.set(ControlRegister::RESET);
        self.write_register(self.control.bits())?;
        self.delay.delay_us(RESET_SETTLE_US);
        self.control.clear(ControlRegister::RESET);
        self.write_register(self.control.bits())
    }

    /// Program the output frequency and waveform shape.
    ///
    /// `frequency` is clamped to [[`MIN_FREQUENCY`], [`MAX_FREQUENCY`]] Hz and
    /// converted to the 28-bit tuning word. Four framed writes go out in
    /// strict order: the FREQ0 load command, the LSB half-word, the MSB
    /// half-word, and finally the control register committing the waveform
    /// bits. B28 mode requires LSB before MSB; reordering any of the four
    /// glitches the output on real hardware.
    pub fn set_frequency(&mut self, frequency: f32, waveform: Waveform) -> Result<(), Error<SpiE, PinE>> {
        let frequency = frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
        let word = util::frequency_to_tuning_word(frequency);
        let (lsb, msb) = util::split_tuning_word(word);

        self.control.load_waveform(waveform);

        self.write_register(FREQ0_LOAD_COMMAND)?;
        self.write_register(lsb)?;
        self.write_register(msb)?;
        self.write_register(self.control.bits())
    }

    /// Switch the waveform shape without reprogramming the frequency.
    ///
    /// Writes only the control register; the tuning word loaded by the last
    /// [`set_frequency`](Ad9833::set_frequency) keeps running. Before any
    /// frequency has been programmed the output frequency is whatever the
    /// power-on register contents produce.
    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), Error<SpiE, PinE>> {
        self.control.load_waveform(waveform);
        self.write_register(self.control.bits())
    }

    /// Power the DAC down or back up.
    ///
    /// Touches only the SLEEP12 bit, so disabling sleep restores the control
    /// register to its pre-sleep value bit for bit.
    pub fn sleep(&mut self, enable: bool) -> Result<(), Error<SpiE, PinE>> {
        if enable {
            self.control.set(ControlRegister::SLEEP12);
        } else {
            self.control.clear(ControlRegister::SLEEP12);
        }
        self.write_register(self.control.bits())
    }

    /// Write a raw 16-bit word to the device.
    ///
    /// This is a low-level interface. See the `set_*` methods for a high-level
    /// wrapper.
    ///
    /// The word is framed by FSYNC: driven low, both bytes clocked out MSB
    /// first, then driven high to latch.
    pub fn write_register(&mut self, word: u16) -> Result<(), Error<SpiE, PinE>> {
        self.fsync.set_low().map_err(Error::Pin)?;
        self.spi.write(&word.to_be_bytes()).map_err(Error::Spi)?;
        self.fsync.set_high().map_err(Error::Pin)
    }

    /// Release the bus handle, FSYNC pin and delay provider.
    pub fn free(self) -> (SPI, FSYNC, DELAY) {
        (self.spi, self.fsync, self.delay)
    }
}

/// Marker types for different driver states.
///
/// These types are used for the `Mode` type parameter of [`Ad9833`].
pub mod mode {
    /// Initial state. No communication has happened.
    pub struct Init;
    /// Bus configured, register mirror zeroed. Operations can happen.
    pub struct Ready;
}
