// Boot, info, FIFO and TX commands API

use crate::constants::XO_FREQ;

/// No operation
pub const CMD_NOP : u8 = 0x00;
/// Read part identification
pub const CMD_PART_INFO : u8 = 0x01;
/// Boot the chip after POR
pub const CMD_POWER_UP : u8 = 0x02;
/// Query FIFO fill levels, optionally resetting them
pub const CMD_FIFO_INFO : u8 = 0x15;
/// Start transmission
pub const CMD_START_TX : u8 = 0x31;
/// Read back a command response
pub const CMD_READ_CMD_BUFF : u8 = 0x44;
/// Stream bytes into the TX FIFO
pub const CMD_WRITE_TX_FIFO : u8 = 0x66;

/// CTS value replayed on SPI once a command completed
pub const CTS_READY : u8 = 0xFF;

/// Boot in normal (non-patched) EZRadioPro mode from the crystal oscillator
pub fn power_up_cmd() -> [u8; 7] {
    let mut cmd = [0u8; 7];
    cmd[0] = CMD_POWER_UP;
    cmd[1] |= 0x01; // BOOT_OPT: PRO functional mode, no patch
    cmd[2] |= 0x00; // XTAL_OPT: crystal, not external drive
    cmd[3] |= ((XO_FREQ >> 24) & 0xFF) as u8;
    cmd[4] |= ((XO_FREQ >> 16) & 0xFF) as u8;
    cmd[5] |= ((XO_FREQ >> 8) & 0xFF) as u8;
    cmd[6] |= (XO_FREQ & 0xFF) as u8;
    cmd
}

/// Read the part identification
pub fn part_info_req() -> [u8; 1] {
    [CMD_PART_INFO]
}

/// Query the FIFO levels. The reset flags clear the TX/RX FIFO as a side effect
pub fn fifo_info_cmd(reset_tx: bool, reset_rx: bool) -> [u8; 2] {
    let mut cmd = [0u8; 2];
    cmd[0] = CMD_FIFO_INFO;
    if reset_tx { cmd[1] |= 0x01; }
    if reset_rx { cmd[1] |= 0x02; }
    cmd
}

/// Start transmission on a channel. Length is the 13-bit TX field, condition
/// packs the ready-state and retransmit bits
pub fn start_tx_cmd(channel: u8, condition: u8, length: u16) -> [u8; 5] {
    let mut cmd = [0u8; 5];
    cmd[0] = CMD_START_TX;
    cmd[1] |= channel;
    cmd[2] |= condition;
    cmd[3] |= ((length >> 8) & 0x1F) as u8;
    cmd[4] |= (length & 0xFF) as u8;
    cmd
}

// Response structs

/// Response for PartInfo command
#[derive(Default)]
pub struct PartInfoRsp([u8; 8]);

impl PartInfoRsp {
    /// Create a new response buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Chip mask revision
    pub fn chip_rev(&self) -> u8 {
        self.0[0]
    }

    /// Part number (0x4464 for the Si4464)
    pub fn part(&self) -> u16 {
        (self.0[2] as u16) |
        ((self.0[1] as u16) << 8)
    }

    /// Part build
    pub fn pbuild(&self) -> u8 {
        self.0[3]
    }

    /// Die ID
    pub fn id(&self) -> u16 {
        (self.0[5] as u16) |
        ((self.0[4] as u16) << 8)
    }

    /// Customer ID
    pub fn customer(&self) -> u8 {
        self.0[6]
    }

    /// ROM ID
    pub fn rom_id(&self) -> u8 {
        self.0[7]
    }
}

impl AsMut<[u8]> for PartInfoRsp {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// Response for FifoInfo command
#[derive(Default)]
pub struct FifoInfoRsp([u8; 2]);

impl FifoInfoRsp {
    /// Create a new response buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes pending in the RX FIFO
    pub fn rx_count(&self) -> u8 {
        self.0[0]
    }

    /// Free space in the TX FIFO in bytes
    pub fn tx_space(&self) -> u8 {
        self.0[1]
    }
}

impl AsMut<[u8]> for FifoInfoRsp {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_up_encodes_xo_freq() {
        let cmd = power_up_cmd();
        assert_eq!(cmd[0], CMD_POWER_UP);
        assert_eq!(cmd[1], 0x01);
        // 26 MHz crystal
        assert_eq!(&cmd[3..], &[0x01, 0x8C, 0xBA, 0x80]);
    }

    #[test]
    fn start_tx_splits_length() {
        let cmd = start_tx_cmd(0x07, 0x00, 0x1B85);
        assert_eq!(cmd, [CMD_START_TX, 0x07, 0x00, 0x1B, 0x85]);
    }

    #[test]
    fn start_tx_masks_length_to_13_bits() {
        let cmd = start_tx_cmd(0, 0, 0xFFFF);
        assert_eq!(cmd[3], 0x1F);
        assert_eq!(cmd[4], 0xFF);
    }

    #[test]
    fn fifo_info_reset_flags() {
        assert_eq!(fifo_info_cmd(false, false), [CMD_FIFO_INFO, 0x00]);
        assert_eq!(fifo_info_cmd(true, false), [CMD_FIFO_INFO, 0x01]);
        assert_eq!(fifo_info_cmd(false, true), [CMD_FIFO_INFO, 0x02]);
    }

    #[test]
    fn part_info_fields() {
        let mut rsp = PartInfoRsp::new();
        rsp.as_mut().copy_from_slice(&[0x11, 0x44, 0x64, 0x22, 0x0F, 0x33, 0x00, 0x3F]);
        assert_eq!(rsp.chip_rev(), 0x11);
        assert_eq!(rsp.part(), 0x4464);
        assert_eq!(rsp.pbuild(), 0x22);
        assert_eq!(rsp.id(), 0x0F33);
        assert_eq!(rsp.rom_id(), 0x3F);
    }
}
