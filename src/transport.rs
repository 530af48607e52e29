//! # Register/property transport seam
//!
//! The link layer talks to the radio through the [`Transport`] trait rather
//! than through [`Si4464`](crate::Si4464) directly, so the command/response
//! exchange can be swapped for a stub when driving the logic under test.
//!
//! The capability set mirrors what the Si4464 command table offers the
//! link layer: reset, part identification, property access, TX FIFO
//! streaming and transmission start.

use embedded_hal::digital::v2::OutputPin;
use embedded_hal_async::spi::SpiBus;

use crate::cmd::cmd_common::{fifo_info_cmd, part_info_req, start_tx_cmd, FifoInfoRsp, PartInfoRsp};
use crate::cmd::cmd_prop::{get_property_req, set_property_cmd};
use crate::constants::PROP_MAX_DATA;
use crate::{CtsPin, Si4464, Si4464Error};

/// Part identification reported by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartInfo {
    /// Chip mask revision
    pub chip_rev: u8,
    /// Part number
    pub part: u16,
    /// ROM ID
    pub rom_id: u8,
}

/// Synchronous request/response channel to the radio
/// One transaction at a time, no retry at this level
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Hardware reset followed by boot
    async fn reset(&mut self) -> Result<(), Si4464Error>;

    /// Read the part identification
    async fn part_info(&mut self) -> Result<PartInfo, Si4464Error>;

    /// Read `buf.len()` properties of `group` starting at `start`
    async fn get_properties(&mut self, group: u8, start: u8, buf: &mut [u8]) -> Result<(), Si4464Error>;

    /// Write consecutive properties of `group` starting at `start`
    async fn set_properties(&mut self, group: u8, start: u8, data: &[u8]) -> Result<(), Si4464Error>;

    /// Stream bytes into the TX FIFO
    async fn write_tx_fifo(&mut self, data: &[u8]) -> Result<(), Si4464Error>;

    /// Free space in the TX FIFO in bytes
    async fn tx_fifo_space(&mut self) -> Result<u8, Si4464Error>;

    /// Start transmission on a channel with the given condition and length field
    async fn start_tx(&mut self, channel: u8, condition: u8, length: u16) -> Result<(), Si4464Error>;
}

impl<O,SPI, M> Transport for Si4464<O,SPI, M> where
    O: OutputPin, SPI: SpiBus<u8>, M: CtsPin
{
    async fn reset(&mut self) -> Result<(), Si4464Error> {
        Si4464::reset(self).await
    }

    async fn part_info(&mut self) -> Result<PartInfo, Si4464Error> {
        let req = part_info_req();
        let mut rsp = PartInfoRsp::new();
        self.cmd_rd(&req, rsp.as_mut()).await?;
        Ok(PartInfo {
            chip_rev: rsp.chip_rev(),
            part: rsp.part(),
            rom_id: rsp.rom_id(),
        })
    }

    async fn get_properties(&mut self, group: u8, start: u8, buf: &mut [u8]) -> Result<(), Si4464Error> {
        if buf.len() > 16 {
            return Err(Si4464Error::InvalidSize);
        }
        let req = get_property_req(group, start, buf.len() as u8);
        self.cmd_rd(&req, buf).await
    }

    async fn set_properties(&mut self, group: u8, start: u8, data: &[u8]) -> Result<(), Si4464Error> {
        if data.len() > PROP_MAX_DATA {
            return Err(Si4464Error::InvalidSize);
        }
        let req = set_property_cmd(group, start, data);
        self.cmd_wr(&req[..4 + data.len()]).await
    }

    async fn write_tx_fifo(&mut self, data: &[u8]) -> Result<(), Si4464Error> {
        self.fifo_wr(data).await
    }

    async fn tx_fifo_space(&mut self) -> Result<u8, Si4464Error> {
        let req = fifo_info_cmd(false, false);
        let mut rsp = FifoInfoRsp::new();
        self.cmd_rd(&req, rsp.as_mut()).await?;
        Ok(rsp.tx_space())
    }

    async fn start_tx(&mut self, channel: u8, condition: u8, length: u16) -> Result<(), Si4464Error> {
        self.cmd_wr(&start_tx_cmd(channel, condition, length)).await
    }
}

#[cfg(test)]
pub mod stub {
    //! Recording transport stub for unit tests

    use super::*;

    /// One recorded property-set transaction
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PropWrite {
        pub group: u8,
        pub start: u8,
        pub data: Vec<u8>,
    }

    /// Transport stub recording every transaction
    pub struct StubTransport {
        /// Part number returned by part_info()
        pub part: u16,
        /// Bytes returned by get_properties(), copied into the caller's buffer
        pub prop_data: Vec<u8>,
        /// Free-space values returned in sequence; the last one repeats
        pub space_seq: Vec<u8>,
        space_cursor: usize,
        /// Fail the nth set_properties call (0-based)
        pub fail_set_at: Option<usize>,
        /// Recorded transactions
        pub resets: usize,
        pub prop_writes: Vec<PropWrite>,
        pub fifo_writes: Vec<Vec<u8>>,
        pub space_polls: usize,
        pub starts: Vec<(u8, u8, u16)>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self {
                part: 0x4464,
                prop_data: Vec::new(),
                space_seq: vec![0x3B],
                space_cursor: 0,
                fail_set_at: None,
                resets: 0,
                prop_writes: Vec::new(),
                fifo_writes: Vec::new(),
                space_polls: 0,
                starts: Vec::new(),
            }
        }

        /// Total payload bytes streamed into the FIFO, in order
        pub fn fifo_bytes(&self) -> Vec<u8> {
            self.fifo_writes.iter().flatten().copied().collect()
        }
    }

    impl Default for StubTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for StubTransport {
        async fn reset(&mut self) -> Result<(), Si4464Error> {
            self.resets += 1;
            Ok(())
        }

        async fn part_info(&mut self) -> Result<PartInfo, Si4464Error> {
            Ok(PartInfo { chip_rev: 0x11, part: self.part, rom_id: 0x3F })
        }

        async fn get_properties(&mut self, _group: u8, _start: u8, buf: &mut [u8]) -> Result<(), Si4464Error> {
            let n = buf.len().min(self.prop_data.len());
            buf[..n].copy_from_slice(&self.prop_data[..n]);
            Ok(())
        }

        async fn set_properties(&mut self, group: u8, start: u8, data: &[u8]) -> Result<(), Si4464Error> {
            if self.fail_set_at == Some(self.prop_writes.len()) {
                return Err(Si4464Error::Spi);
            }
            self.prop_writes.push(PropWrite { group, start, data: data.to_vec() });
            Ok(())
        }

        async fn write_tx_fifo(&mut self, data: &[u8]) -> Result<(), Si4464Error> {
            self.fifo_writes.push(data.to_vec());
            Ok(())
        }

        async fn tx_fifo_space(&mut self) -> Result<u8, Si4464Error> {
            self.space_polls += 1;
            let space = self.space_seq[self.space_cursor.min(self.space_seq.len() - 1)];
            self.space_cursor += 1;
            Ok(space)
        }

        async fn start_tx(&mut self, channel: u8, condition: u8, length: u16) -> Result<(), Si4464Error> {
            self.starts.push((channel, condition, length));
            Ok(())
        }
    }
}
