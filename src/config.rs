//! # Configuration loader
//!
//! Brings the chip from its boot defaults into the vendor baseline by
//! replaying an ordered table of property-set transactions. The table is
//! generated by the vendor configuration tool and treated as opaque here:
//! only the replay order matters (clock settings are listed before the
//! modem settings that depend on them).

use crate::constants::PROP_MAX_DATA;
use crate::transport::Transport;
use crate::Si4464Error;

/// One property-set transaction of the vendor table
#[derive(Debug, Clone, Copy)]
pub struct ConfigEntry<'a> {
    pub group: u8,
    pub start: u8,
    pub data: &'a [u8],
}

/// Replay `table` in order, failing fast with the index of the first entry
/// the transport rejected. Idempotent against a powered device.
pub async fn load_config<T: Transport>(transport: &mut T, table: &[ConfigEntry<'_>]) -> Result<(), Si4464Error> {
    for (index, entry) in table.iter().enumerate() {
        if entry.data.len() > PROP_MAX_DATA {
            return Err(Si4464Error::ConfigFailed(index as u16));
        }
        transport
            .set_properties(entry.group, entry.start, entry.data).await
            .map_err(|_| Si4464Error::ConfigFailed(index as u16))?;
    }
    Ok(())
}

/// Baseline TX configuration for the Si4464 in the 400MHz band,
/// 2GFSK at 4800bps. Derived from the vendor configuration tool output
pub const TX_4464_CONFIG: &[ConfigEntry<'static>] = &[
    // GLOBAL_XO_TUNE: center the crystal trim
    ConfigEntry { group: 0x00, start: 0x00, data: &[0x40] },
    // GLOBAL_CONFIG: high performance sequencer, fast FIFO
    ConfigEntry { group: 0x00, start: 0x03, data: &[0x60] },
    // INT_CTL_ENABLE: all interrupts off, the driver polls
    ConfigEntry { group: 0x01, start: 0x00, data: &[0x00] },
    // FRR_CTL: fast response registers disabled
    ConfigEntry { group: 0x02, start: 0x00, data: &[0x00, 0x00, 0x00, 0x00] },
    // PREAMBLE: 8 bytes of 0101, standard threshold
    ConfigEntry { group: 0x10, start: 0x00, data: &[0x08, 0x14, 0x00, 0x0F, 0x31, 0x00, 0x00, 0x00, 0x00] },
    // SYNC: two byte sync word 0x2DD4
    ConfigEntry { group: 0x11, start: 0x00, data: &[0x01, 0x2D, 0xD4, 0x00, 0x00] },
    // PKT_CRC_CONFIG: no CRC, handled by the payload format
    ConfigEntry { group: 0x12, start: 0x00, data: &[0x00] },
    // PKT_LEN: fixed length, field 1 only
    ConfigEntry { group: 0x12, start: 0x08, data: &[0x00, 0x00, 0x00] },
    // PKT_FIELD_1: frame buffer length, no whitening
    ConfigEntry { group: 0x12, start: 0x0D, data: &[0x00, 0x35, 0x00, 0x00] },
    // MODEM_MOD_TYPE / MAP / DSM: 2GFSK from the packet handler
    ConfigEntry { group: 0x20, start: 0x00, data: &[0x03, 0x00, 0x07] },
    // MODEM_DATA_RATE: 4800bps at 10x oversampling
    ConfigEntry { group: 0x20, start: 0x03, data: &[0x00, 0xBB, 0x80] },
    // MODEM_TX_NCO_MODE: TXOSR 10x, NCO modulus at the crystal frequency
    ConfigEntry { group: 0x20, start: 0x06, data: &[0x01, 0x8C, 0xBA, 0x80] },
    // MODEM_FREQ_DEV: ~2.4kHz deviation
    ConfigEntry { group: 0x20, start: 0x0A, data: &[0x00, 0x00, 0x85] },
    // PA: class E match, moderate level, nominal bias
    ConfigEntry { group: 0x22, start: 0x00, data: &[0x08, 0x10, 0x00, 0x3D] },
    // FREQ_CONTROL: inte/frac preset for the middle of the band
    ConfigEntry { group: 0x40, start: 0x00, data: &[0x3C, 0x0C, 0x4E, 0xFF] },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::StubTransport;
    use futures::executor::block_on;

    #[test]
    fn replays_table_in_order() {
        let mut transport = StubTransport::new();
        block_on(load_config(&mut transport, TX_4464_CONFIG)).unwrap();

        assert_eq!(transport.prop_writes.len(), TX_4464_CONFIG.len());
        for (written, entry) in transport.prop_writes.iter().zip(TX_4464_CONFIG) {
            assert_eq!(written.group, entry.group);
            assert_eq!(written.start, entry.start);
            assert_eq!(written.data.as_slice(), entry.data);
        }
    }

    #[test]
    fn surfaces_failing_entry_index() {
        let mut transport = StubTransport::new();
        transport.fail_set_at = Some(3);
        let err = block_on(load_config(&mut transport, TX_4464_CONFIG)).unwrap_err();

        assert_eq!(err, Si4464Error::ConfigFailed(3));
        // Fail fast: nothing after the failing entry was replayed
        assert_eq!(transport.prop_writes.len(), 3);
    }

    #[test]
    fn rejects_oversized_entry_without_transport_call() {
        let table = [ConfigEntry { group: 0x20, start: 0x00, data: &[0u8; 13] }];
        let mut transport = StubTransport::new();
        let err = block_on(load_config(&mut transport, &table)).unwrap_err();

        assert_eq!(err, Si4464Error::ConfigFailed(0));
        assert!(transport.prop_writes.is_empty());
    }

    #[test]
    fn replay_is_idempotent() {
        let mut transport = StubTransport::new();
        block_on(load_config(&mut transport, TX_4464_CONFIG)).unwrap();
        block_on(load_config(&mut transport, TX_4464_CONFIG)).unwrap();
        assert_eq!(transport.prop_writes.len(), 2 * TX_4464_CONFIG.len());
    }
}
