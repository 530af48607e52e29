//! # FIFO transmit engine
//!
//! Streams a frame payload into the fixed-size hardware TX FIFO under
//! flow control. The payload is chunked: an initial fill up to the FIFO
//! size, then refills gated on the free space the chip reports, then the
//! start-transmit command. The free-space poll is bounded, a FIFO that
//! never drains surfaces [`FifoTimeout`](crate::Si4464Error::FifoTimeout)
//! instead of hanging the caller.

use crate::constants::{FIFO_POLL_LIMIT, FIFO_REFILL_CHUNK, MAX_PACKET_LEN, TX_FIFO_SIZE};
use crate::link::Link;
use crate::transport::Transport;
use crate::Si4464Error;

/// Framing of the start-transmit command. The three length encodings are
/// fixed per mode and selected by the caller's repeat count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxFraming {
    /// One fixed-length frame (repeat count 1)
    SingleFrame,
    /// Extended burst of frames (repeat count 200)
    ExtendedBurst,
    /// Free-running transmission, length taken from the packet handler
    /// (repeat count 1000)
    FreeRunning,
}

impl TxFraming {
    /// Map a repeat count to its framing mode
    pub fn from_repeat(repeat: u16) -> Result<Self, Si4464Error> {
        match repeat {
            1 => Ok(TxFraming::SingleFrame),
            200 => Ok(TxFraming::ExtendedBurst),
            1000 => Ok(TxFraming::FreeRunning),
            _ => Err(Si4464Error::InvalidFraming),
        }
    }

    /// Value of the 13-bit START_TX length field for this mode
    pub fn length_field(&self) -> u16 {
        match self {
            TxFraming::SingleFrame => 0x0035,
            TxFraming::ExtendedBurst => 0x1B85,
            TxFraming::FreeRunning => 0x0000,
        }
    }
}

impl<T: Transport> Link<T> {

    /// Transmit a payload, selecting the framing mode from `repeat`
    pub async fn transmit(&mut self, payload: &[u8], repeat: u16) -> Result<(), Si4464Error> {
        let framing = TxFraming::from_repeat(repeat)?;
        self.transmit_framed(payload, framing).await
    }

    /// Transmit a payload with an explicit framing mode.
    /// The payload is borrowed for the duration of the call only
    pub async fn transmit_framed(&mut self, payload: &[u8], framing: TxFraming) -> Result<(), Si4464Error> {
        self.ensure_ready()?;
        if payload.is_empty() {
            return Ok(());
        }
        if payload.len() > MAX_PACKET_LEN {
            return Err(Si4464Error::PayloadTooLarge);
        }
        let channel = self.radio().channel;

        // Initial fill, bounded by the FIFO size
        let first = payload.len().min(TX_FIFO_SIZE);
        self.transport_mut().write_tx_fifo(&payload[..first]).await?;

        // Refill loop: free space is read back on every iteration, never
        // cached, and a write happens only once a full chunk fits
        let mut sent = first;
        let mut polls = 0u32;
        while sent < payload.len() {
            let space = self.transport_mut().tx_fifo_space().await? as usize;
            if space >= FIFO_REFILL_CHUNK {
                let end = (sent + FIFO_REFILL_CHUNK).min(payload.len());
                self.transport_mut().write_tx_fifo(&payload[sent..end]).await?;
                sent = end;
                continue;
            }
            polls += 1;
            if polls >= FIFO_POLL_LIMIT {
                return Err(Si4464Error::FifoTimeout);
            }
        }

        self.transport_mut().start_tx(channel, 0x00, framing.length_field()).await
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TX_4464_CONFIG;
    use crate::transport::stub::StubTransport;
    use futures::executor::block_on;

    fn ready_link() -> Link<StubTransport> {
        let mut link = Link::new(StubTransport::new(), TX_4464_CONFIG);
        block_on(async {
            link.configure().await.unwrap();
            link.verify().await.unwrap();
        });
        link.transport_mut().prop_writes.clear();
        link
    }

    #[test]
    fn zero_length_payload_is_a_noop() {
        let mut link = ready_link();
        block_on(link.transmit(&[], 1)).unwrap();
        assert!(link.transport_mut().fifo_writes.is_empty());
        assert!(link.transport_mut().starts.is_empty());
    }

    #[test]
    fn short_payload_needs_no_polling() {
        let mut link = ready_link();
        let payload = [0xA5u8; 20];
        block_on(link.transmit(&payload, 1)).unwrap();
        assert_eq!(link.transport_mut().fifo_writes.len(), 1);
        assert_eq!(link.transport_mut().space_polls, 0);
        assert_eq!(link.transport_mut().starts.len(), 1);
    }

    #[test]
    fn long_payload_is_chunked_in_order() {
        let mut link = ready_link();
        let payload: Vec<u8> = (0..150u8).collect();
        block_on(link.transmit(&payload, 1)).unwrap();

        let writes = link.transport_mut().fifo_writes.clone();
        assert!(writes.len() > 1);
        assert_eq!(writes[0].len(), TX_FIFO_SIZE);
        for chunk in &writes[1..] {
            assert!(chunk.len() <= FIFO_REFILL_CHUNK);
        }
        // Every byte arrives exactly once, in payload order
        assert_eq!(link.transport_mut().fifo_bytes(), payload);
    }

    #[test]
    fn refill_waits_for_a_full_chunk_of_space() {
        let mut link = ready_link();
        link.transport_mut().space_seq = vec![10, 20, 34, 35];
        let payload = [0x5Au8; TX_FIFO_SIZE + 35];
        block_on(link.transmit(&payload, 1)).unwrap();

        // Three insufficient reads before the one that admits the chunk
        assert_eq!(link.transport_mut().space_polls, 4);
        assert_eq!(link.transport_mut().fifo_writes.len(), 2);
        assert_eq!(link.transport_mut().fifo_writes[1].len(), 35);
    }

    #[test]
    fn stuck_fifo_surfaces_timeout() {
        let mut link = ready_link();
        link.transport_mut().space_seq = vec![0];
        let payload = [0u8; 100];
        let err = block_on(link.transmit(&payload, 1)).unwrap_err();

        assert_eq!(err, Si4464Error::FifoTimeout);
        // Only the initial fill happened, transmission never started
        assert_eq!(link.transport_mut().fifo_writes.len(), 1);
        assert!(link.transport_mut().starts.is_empty());
    }

    #[test]
    fn framing_modes_encode_their_lengths() {
        let cases = [(1u16, 0x0035u16), (200, 0x1B85), (1000, 0x0000)];
        for (repeat, length) in cases {
            let mut link = ready_link();
            link.set_frequency(7).unwrap();
            block_on(link.transmit(&[0x42; 10], repeat)).unwrap();
            assert_eq!(link.transport_mut().starts.as_slice(), &[(7, 0x00, length)]);
        }
    }

    #[test]
    fn unknown_repeat_count_is_rejected_without_io() {
        let mut link = ready_link();
        let err = block_on(link.transmit(&[0x42; 10], 2)).unwrap_err();
        assert_eq!(err, Si4464Error::InvalidFraming);
        assert!(link.transport_mut().fifo_writes.is_empty());
        assert!(link.transport_mut().starts.is_empty());
    }

    #[test]
    fn oversized_payload_is_rejected_without_io() {
        let mut link = ready_link();
        let payload = vec![0u8; MAX_PACKET_LEN + 1];
        let err = block_on(link.transmit(&payload, 1)).unwrap_err();
        assert_eq!(err, Si4464Error::PayloadTooLarge);
        assert!(link.transport_mut().fifo_writes.is_empty());
    }

    #[test]
    fn transmit_requires_verification() {
        let mut link = Link::new(StubTransport::new(), TX_4464_CONFIG);
        let err = block_on(link.transmit(&[1, 2, 3], 1)).unwrap_err();
        assert_eq!(err, Si4464Error::NotReady);
    }
}
