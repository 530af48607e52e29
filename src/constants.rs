/// Part number reported by PART_INFO for the expected IC
pub const PART_NUMBER : u16 = 0x4464;

/// Crystal reference frequency in Hz
pub const XO_FREQ : u32 = 26_000_000;
/// Base value of the crystal trim register (GLOBAL_XO_TUNE)
pub const XO_TUNE_BASE : u8 = 0x40;

/// Property group for global chip settings
pub const GRP_GLOBAL : u8 = 0x00;
/// Property group for interrupt control
pub const GRP_INT_CTL : u8 = 0x01;
/// Property group for the modem
pub const GRP_MODEM : u8 = 0x20;
/// Property group for the power amplifier
pub const GRP_PA : u8 = 0x22;
/// Property group for the frequency synthesizer control
pub const GRP_FREQ_CONTROL : u8 = 0x40;

/// GLOBAL: crystal oscillator trim
pub const GLOBAL_XO_TUNE : u8 = 0x00;
/// GLOBAL: low battery and WUT configuration
pub const GLOBAL_CONFIG : u8 = 0x03;
/// INT_CTL: interrupt enable
pub const INT_CTL_ENABLE : u8 = 0x00;
/// MODEM: modulation type and source
pub const MODEM_MOD_TYPE : u8 = 0x00;
/// MODEM: data rate, 3 bytes
pub const MODEM_DATA_RATE : u8 = 0x03;
/// MODEM: TX NCO mode and oversampling ratio, 4 bytes
pub const MODEM_TX_NCO_MODE : u8 = 0x06;
/// MODEM: frequency deviation, 3 bytes
pub const MODEM_FREQ_DEV : u8 = 0x0A;
/// PA: output power level
pub const PA_PWR_LVL : u8 = 0x01;
/// FREQ_CONTROL: synthesizer integer divide number
pub const FREQ_CONTROL_INTE : u8 = 0x00;
/// FREQ_CONTROL: synthesizer fractional divide number, 3 bytes after INTE
pub const FREQ_CONTROL_FRAC : u8 = 0x01;

/// Maximum data bytes in a single SET_PROPERTY transaction
pub const PROP_MAX_DATA : usize = 12;

/// Usable TX FIFO depth in bytes (64B FIFO less the almost-empty margin)
pub const TX_FIFO_SIZE : usize = 0x3B;
/// Refill chunk: one frame buffer worth of payload
pub const FIFO_REFILL_CHUNK : usize = 35;
/// Free-space polls before a refill is declared stuck
pub const FIFO_POLL_LIMIT : u32 = 50_000;
/// Largest payload encodable in the 13-bit START_TX length field
pub const MAX_PACKET_LEN : usize = 0x1FFF;

/// Carrier grid: base frequency in MHz
pub const CHANNEL_BASE_MHZ : f64 = 400.0;
/// Carrier grid: channel step in kHz
pub const CHANNEL_STEP_KHZ : u32 = 50;
/// Highest channel index, saturating (400MHz + 50kHz * 120 = 406MHz)
pub const CHANNEL_LIMIT_UPPER : u8 = 120;

/// Data rate assumed before any explicit set_data_rate call, in bps
pub const DEFAULT_DATA_RATE : u16 = 4800;
