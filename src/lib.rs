#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod cmd;
pub mod transport;
pub mod config;
pub mod link;
pub mod tx;

use core::marker::PhantomData;

use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_hal::digital::v2::{OutputPin, InputPin};
use embedded_hal_async::{digital::Wait, spi::SpiBus};

use cmd::cmd_common::{power_up_cmd, CMD_READ_CMD_BUFF, CMD_WRITE_TX_FIFO, CTS_READY};

trait Sealed{}
#[allow(private_bounds)]
/// Sealed trait to implement two flavors of the driver where
/// the CTS pin can be either a simple input or one implementing the Wait trait
pub trait CtsPin: Sealed {
    type Pin: InputPin;

    #[allow(async_fn_in_trait)]
    async fn wait_ready(pin: &mut Self::Pin, timeout: Duration) -> Result<(), Si4464Error>;
}
pub struct CtsBlocking<I> {
    _marker: PhantomData<I>
}
pub struct CtsAsync<I> {
    _marker: PhantomData<I>
}
impl<I> Sealed for CtsBlocking<I> {}
impl<I> Sealed for CtsAsync<I> {}

impl<I: InputPin> CtsPin for CtsBlocking<I> {
    type Pin = I;

    /// Poll CTS pin until it goes high
    async fn wait_ready(pin: &mut I, timeout: Duration) -> Result<(), Si4464Error> {
        let start = Instant::now();
        while pin.is_low().map_err(|_| Si4464Error::Pin)? {
            if start.elapsed() >= timeout {
                return Err(Si4464Error::CtsTimeout);
            }
        }
        Ok(())
    }
}

impl<I: InputPin + Wait> CtsPin for CtsAsync<I> {
    type Pin = I;

    /// Wait for the CTS pin to go high (if not already)
    async fn wait_ready(pin: &mut I, timeout: Duration) -> Result<(), Si4464Error> {
        if pin.is_low().map_err(|_| Si4464Error::Pin)? {
            match with_timeout(timeout, pin.wait_for_high()).await {
                Ok(_) => Ok(()),
                Err(_) => Err(Si4464Error::CtsTimeout),
            }
        } else {
            Ok(())
        }
    }
}

/// Largest command frame: SET_PROPERTY with 12 data bytes
const CMD_MAX_SIZE: usize = 16;

/// Si4464 Device
pub struct Si4464<O,SPI, M: CtsPin> {
    /// Shutdown pin (active high)
    sdn: O,
    /// CTS pin from the Si4464, high when the chip is ready for a command (GPIO1 POR default)
    cts: M::Pin,
    /// SPI device
    spi: SPI,
    /// NSS output pin
    nss: O,
}

/// Error using the Si4464
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Si4464Error {
    /// Unable to Set/Get a pin level
    Pin,
    /// Unable to use SPI
    Spi,
    /// Timeout while waiting for CTS
    CtsTimeout,
    /// Command with invalid size (>16B)
    InvalidSize,
    /// Part info does not match the expected IC type (wrong hardware, fatal)
    HardwareMismatch,
    /// Configuration table replay failed at the given entry index
    ConfigFailed(u16),
    /// Carrier frequency outside the synthesizer band
    FrequencyOutOfRange,
    /// Modulation byte not among the known modes
    InvalidModulation,
    /// Repeat count does not map to a framing mode
    InvalidFraming,
    /// Payload longer than the maximum packet length
    PayloadTooLarge,
    /// TX FIFO never reported enough free space
    FifoTimeout,
    /// Link operation before bring-up completed
    NotReady,
}

// Create driver with CTS pin not implementing wait
impl<I,O,SPI> Si4464<O,SPI, CtsBlocking<I>> where
    I: InputPin, O: OutputPin, SPI: SpiBus<u8>
{
    /// Create a Si4464 Device with blocking access on the CTS pin
    pub fn new_blocking(sdn: O, cts: I, spi: SPI, nss: O) -> Self {
        Self { sdn, cts, spi, nss }
    }

}

// Create driver with CTS pin implementing wait
impl<I,O,SPI> Si4464<O,SPI, CtsAsync<I>> where
    I: InputPin + Wait, O: OutputPin, SPI: SpiBus<u8>
{
    /// Create a Si4464 Device with async CTS pin
    pub fn new(sdn: O, cts: I, spi: SPI, nss: O) -> Self {
        Self { sdn, cts, spi, nss }
    }
}

impl<O,SPI, M> Si4464<O,SPI, M> where
    O: OutputPin, SPI: SpiBus<u8>, M: CtsPin
{

    /// Reset the chip: SDN pulse, POR delay, then POWER_UP with the crystal frequency
    pub async fn reset(&mut self) -> Result<(), Si4464Error> {
        self.sdn.set_high().map_err(|_| Si4464Error::Pin)?;
        Timer::after_millis(1).await;
        self.sdn.set_low().map_err(|_| Si4464Error::Pin)?;
        // POR takes up to 14ms before the first command is accepted
        Timer::after_millis(15).await;
        self.cmd_wr(&power_up_cmd()).await
    }

    /// Check if the chip is ready for a command (debug)
    pub fn is_ready(&self) -> bool {
        self.cts.is_high().unwrap_or(false)
    }

    /// Wait for the Si4464 to be ready for a command, i.e. CTS pin high
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<(), Si4464Error> {
        M::wait_ready(&mut self.cts, timeout).await
    }

    /// Write a command
    pub async fn cmd_wr(&mut self, req: &[u8]) -> Result<(), Si4464Error> {
        if req.len() > CMD_MAX_SIZE {
            return Err(Si4464Error::InvalidSize);
        }
        self.wait_ready(Duration::from_millis(100)).await?;
        self.nss.set_low().map_err(|_| Si4464Error::Pin)?;
        self.spi
            .write(req).await
            .map_err(|_| Si4464Error::Spi)?;
        self.nss.set_high().map_err(|_| Si4464Error::Pin)
    }

    /// Write a command and read its response
    /// Rsp must be n bytes where n is the number of expected bytes
    pub async fn cmd_rd(&mut self, req: &[u8], rsp: &mut [u8]) -> Result<(), Si4464Error> {
        self.cmd_wr(req).await?;
        // Command processing is signalled complete by CTS going back high
        self.wait_ready(Duration::from_millis(100)).await?;
        self.nss.set_low().map_err(|_| Si4464Error::Pin)?;
        let mut hdr = [CMD_READ_CMD_BUFF, 0];
        self.spi
            .transfer_in_place(&mut hdr).await
            .map_err(|_| Si4464Error::Spi)?;
        // Second header byte replays the CTS value on SPI
        if hdr[1] != CTS_READY {
            self.nss.set_high().map_err(|_| Si4464Error::Pin)?;
            return Err(Si4464Error::CtsTimeout);
        }
        self.spi
            .transfer_in_place(rsp).await
            .map_err(|_| Si4464Error::Spi)?;
        self.nss.set_high().map_err(|_| Si4464Error::Pin)
    }

    /// Stream a payload chunk into the TX FIFO
    /// FIFO access does not gate on CTS
    pub async fn fifo_wr(&mut self, data: &[u8]) -> Result<(), Si4464Error> {
        self.nss.set_low().map_err(|_| Si4464Error::Pin)?;
        self.spi
            .write(&[CMD_WRITE_TX_FIFO]).await
            .map_err(|_| Si4464Error::Spi)?;
        self.spi
            .write(data).await
            .map_err(|_| Si4464Error::Spi)?;
        self.nss.set_high().map_err(|_| Si4464Error::Pin)
    }

}
