//! # Link controller
//!
//! Owns the radio lifecycle and the operational parameters. The controller
//! drives the chip through `Unreset -> Configuring -> Verified -> Ready`
//! and converts engineering units (MHz, bits per second) into the chip's
//! fixed-point register encodings.
//!
//! ## Available Methods
//!
//! ### Lifecycle
//! - [`init`](Link::init) - Full bring-up: reset, configuration replay, part verification
//! - [`reset`](Link::reset) - Hardware reset and boot
//! - [`configure`](Link::configure) - Replay the injected vendor table
//! - [`verify`](Link::verify) - Check the attached part against the expected IC
//!
//! ### Operational parameters (post-verify only)
//! - [`set_frequency`](Link::set_frequency) - Select the channel index (stored, not written)
//! - [`apply_frequency`](Link::apply_frequency) - Program the synthesizer for a carrier in MHz
//! - [`set_data_rate`](Link::set_data_rate) - Program the data rate from live modem configuration
//! - [`set_modulation`](Link::set_modulation) - Select modulation type and source
//! - [`set_power`](Link::set_power) - Set the PA output level
//! - [`adjust_crystal`](Link::adjust_crystal) - Bias the crystal trim

use crate::config::{load_config, ConfigEntry};
use crate::constants::*;
use crate::cmd::cmd_prop::TxNcoModeRsp;
use crate::transport::Transport;
use crate::Si4464Error;

/// Fixed-point scale of the synthesizer fraction (2^19)
const SYNTH_FRAC_SCALE: f64 = (1u32 << 19) as f64;

/// Operational radio parameters, mutated only through the controller setters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioState {
    /// Frequency channel index on the 50kHz grid
    pub channel: u8,
    /// Data rate in bits per second
    pub data_rate: u16,
}

impl Default for RadioState {
    fn default() -> Self {
        Self { channel: 0, data_rate: DEFAULT_DATA_RATE }
    }
}

/// Two-band synthesizer calibration for one radio part.
/// The integer divide value switches at the midpoint of the covered range
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SynthBand {
    /// Reference divisor in MHz (crystal divided by the output divider)
    pub ref_divisor_mhz: f64,
    /// Carrier at or above this uses the upper integer value
    pub midpoint_mhz: f64,
    /// Integer divide value below the midpoint
    pub low_inte: u8,
    /// Integer divide value at and above the midpoint
    pub high_inte: u8,
    /// Lowest accepted carrier
    pub min_mhz: f64,
    /// Highest accepted carrier
    pub max_mhz: f64,
}

impl SynthBand {
    /// Calibration for the 400-406 MHz meteorological band with a 26 MHz
    /// crystal (reference 6.5 MHz)
    pub const fn met_400() -> Self {
        Self {
            ref_divisor_mhz: 6.5,
            midpoint_mhz: 403.0,
            low_inte: 61,
            high_inte: 62,
            min_mhz: 400.0,
            max_mhz: 406.0,
        }
    }
}

impl Default for SynthBand {
    fn default() -> Self {
        Self::met_400()
    }
}

/// Bring-up progress of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Chip not reset since power-on
    Unreset,
    /// Vendor table replayed, part not yet verified
    Configuring,
    /// Part identity checked, operational
    Verified,
    /// Bring-up complete
    Ready,
}

/// Modulation type and source written to MODEM_MOD_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modulation {
    /// 2GFSK, modulated from the packet handler
    Fsk2Packet = 0b0000_0011,
    /// Unmodulated carrier keyed by the PN9 generator
    CwPn9 = 0b0001_0000,
    /// 2GFSK, modulated by the PN9 generator
    Fsk2Pn9 = 0b0001_0011,
    /// Plain 2FSK from the packet handler
    Fsk2LegacyPacket = 0b0000_0010,
}

impl TryFrom<u8> for Modulation {
    type Error = Si4464Error;

    fn try_from(value: u8) -> Result<Self, Si4464Error> {
        match value {
            0b0000_0011 => Ok(Modulation::Fsk2Packet),
            0b0001_0000 => Ok(Modulation::CwPn9),
            0b0001_0011 => Ok(Modulation::Fsk2Pn9),
            0b0000_0010 => Ok(Modulation::Fsk2LegacyPacket),
            _ => Err(Si4464Error::InvalidModulation),
        }
    }
}

/// Link controller: owns the transport, the radio state and the injected
/// configuration table. One instance per physical radio, single owner
pub struct Link<T: Transport> {
    transport: T,
    table: &'static [ConfigEntry<'static>],
    band: SynthBand,
    state: LinkState,
    radio: RadioState,
}

impl<T: Transport> Link<T> {

    /// Create a controller over a transport with an injected vendor table
    pub fn new(transport: T, table: &'static [ConfigEntry<'static>]) -> Self {
        Self {
            transport,
            table,
            band: SynthBand::default(),
            state: LinkState::Unreset,
            radio: RadioState::default(),
        }
    }

    /// Use a different synthesizer calibration than the 400MHz default
    pub fn with_band(mut self, band: SynthBand) -> Self {
        self.band = band;
        self
    }

    /// Current bring-up state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Current operational parameters
    pub fn radio(&self) -> &RadioState {
        &self.radio
    }

    /// Give back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Setters and transmission are valid once the part has been verified
    pub(crate) fn ensure_ready(&self) -> Result<(), Si4464Error> {
        match self.state {
            LinkState::Verified | LinkState::Ready => Ok(()),
            _ => Err(Si4464Error::NotReady),
        }
    }

    /// Hardware reset. A transport failure here is fatal and escalated as-is
    pub async fn reset(&mut self) -> Result<(), Si4464Error> {
        self.state = LinkState::Unreset;
        self.transport.reset().await
    }

    /// Replay the vendor configuration table
    pub async fn configure(&mut self) -> Result<(), Si4464Error> {
        load_config(&mut self.transport, self.table).await?;
        self.state = LinkState::Configuring;
        Ok(())
    }

    /// Compare the attached part against the expected IC type.
    /// A mismatch means wrong hardware: fatal, not recoverable in-driver
    pub async fn verify(&mut self) -> Result<(), Si4464Error> {
        let info = self.transport.part_info().await?;
        if info.part != PART_NUMBER {
            return Err(Si4464Error::HardwareMismatch);
        }
        self.state = LinkState::Verified;
        Ok(())
    }

    /// Full bring-up: reset, configure, verify
    pub async fn init(&mut self) -> Result<(), Si4464Error> {
        self.reset().await?;
        self.configure().await?;
        self.verify().await?;
        self.state = LinkState::Ready;
        Ok(())
    }

    /// Select the channel index. Out-of-range requests saturate to
    /// [`CHANNEL_LIMIT_UPPER`], they are never rejected. The synthesizer is
    /// untouched until [`apply_frequency`](Link::apply_frequency)
    pub fn set_frequency(&mut self, channel: u8) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        self.radio.channel = channel.min(CHANNEL_LIMIT_UPPER);
        Ok(())
    }

    /// Carrier frequency of a channel index in MHz
    pub fn channel_mhz(&self, channel: u8) -> f64 {
        CHANNEL_BASE_MHZ + (CHANNEL_STEP_KHZ * channel as u32) as f64 / 1000.0
    }

    /// Program the synthesizer for an absolute carrier frequency.
    /// Unlike the channel index, an out-of-band carrier is rejected, and
    /// nothing is written to the device
    pub async fn apply_frequency(&mut self, freq_mhz: f64, adj: i16) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        if freq_mhz < self.band.min_mhz || freq_mhz > self.band.max_mhz {
            return Err(Si4464Error::FrequencyOutOfRange);
        }
        let inte = if freq_mhz < self.band.midpoint_mhz {
            self.band.low_inte
        } else {
            self.band.high_inte
        };
        // Fraction is non-negative for any in-band carrier, so +0.5 and
        // truncation rounds half-up
        let frac = freq_mhz / self.band.ref_divisor_mhz - inte as f64;
        let word = (frac * SYNTH_FRAC_SCALE + 0.5) as u32;
        let word = (word as i32 + adj as i32) as u32;
        let data = [
            inte - 1,
            ((word >> 16) & 0x0F) as u8,
            ((word >> 8) & 0xFF) as u8,
            (word & 0xFF) as u8,
        ];
        self.transport
            .set_properties(GRP_FREQ_CONTROL, FREQ_CONTROL_INTE, &data).await
    }

    /// Program the synthesizer for the stored channel index
    pub async fn apply_channel(&mut self, adj: i16) -> Result<(), Si4464Error> {
        let freq_mhz = self.channel_mhz(self.radio.channel);
        self.apply_frequency(freq_mhz, adj).await
    }

    /// Program the data rate. The oversampling ratio and NCO modulus are
    /// read back from the device on every call: the configuration table may
    /// have changed them, a local cache would go stale
    pub async fn set_data_rate(&mut self, bps: u16) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        let mut rsp = TxNcoModeRsp::new();
        self.transport
            .get_properties(GRP_MODEM, MODEM_TX_NCO_MODE, rsp.as_mut()).await?;
        // Divide first: nco_mode and the crystal frequency are both 26-bit
        // scale, the product would overflow u32
        let mut reg = rsp.nco_mode() / XO_FREQ;
        reg *= bps as u32 * rsp.txosr().ratio();
        let data = [
            ((reg >> 16) & 0xFF) as u8,
            ((reg >> 8) & 0xFF) as u8,
            (reg & 0xFF) as u8,
        ];
        self.transport
            .set_properties(GRP_MODEM, MODEM_DATA_RATE, &data).await?;
        self.radio.data_rate = bps;
        Ok(())
    }

    /// Select modulation type and source
    pub async fn set_modulation(&mut self, modulation: Modulation) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        self.transport
            .set_properties(GRP_MODEM, MODEM_MOD_TYPE, &[modulation as u8]).await
    }

    /// Select modulation from a raw MODEM_MOD_TYPE byte. Unknown encodings
    /// are rejected before any transport call
    pub async fn set_modulation_raw(&mut self, value: u8) -> Result<(), Si4464Error> {
        let modulation = Modulation::try_from(value)?;
        self.set_modulation(modulation).await
    }

    /// Set the PA output level. Range checking is left to the hardware
    pub async fn set_power(&mut self, level: u8) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        self.transport
            .set_properties(GRP_PA, PA_PWR_LVL, &[level]).await
    }

    /// Bias the crystal trim register by `adj` around its base value.
    /// Positive adjustment decreases the effective frequency
    pub async fn adjust_crystal(&mut self, adj: i8) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        let trim = (XO_TUNE_BASE as i16 + adj as i16) as u8;
        self.transport
            .set_properties(GRP_GLOBAL, GLOBAL_XO_TUNE, &[trim]).await
    }

}
