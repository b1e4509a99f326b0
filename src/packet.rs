//! Packet data path
//!
//! Receive and transmit are polled: the IRQ flags are sampled at the
//! configured interval until the expected event shows up or the attempt
//! budget runs out. After every exchange the chip is back in continuous
//! receive with all interrupt flags cleared.
//!
//! # Receive
//! 1. Enter RxContinuous if the chip is not already listening
//! 2. Poll for RxDone, RxTimeout or PayloadCrcError
//! 3. Classify: nothing or a timeout is [`Error::NoData`], a CRC error is
//!    [`Error::MalformedPayload`] and wins over RxDone
//! 4. Copy the packet out of the FIFO, truncated to the caller's buffer
//!
//! # Transmit
//! 1. Load the payload at the TX base and program its length
//! 2. Enter Tx and poll for TxDone, one attempt per payload byte and preamble
//!    symbol plus three
//! 3. A transmission that never completes reports zero bytes sent

use crate::codec::{packet_rssi_dbm, rssi_dbm, snr_db};
use crate::registers::{
    FifoAddrPtr, FifoRxBaseAddr, FifoRxCurrentAddr, FifoTxBaseAddr, IrqFlags, PayloadLength,
    PktRssiValue, PktSnrValue, PreambleLength, RssiValue, RxNbBytes, MAX_PAYLOAD_LENGTH,
};
use crate::{Error, OperatingMode, Radio};

const RX_EVENTS: IrqFlags = IrqFlags::RX_TIMEOUT
    .union(IrqFlags::RX_DONE)
    .union(IrqFlags::PAYLOAD_CRC_ERROR);

/// Number of TxDone polls granted to a transmission
pub fn tx_poll_budget(payload_len: usize, preamble_length: u16) -> u32 {
    payload_len as u32 + u32::from(preamble_length) + 3
}

/// Maps the observed receive flags to an outcome.
///
/// `crc_error` comes from a second read of the flags after the wait, so a
/// CRC failure raised together with RxDone is still reported.
fn classify_rx(observed: IrqFlags, crc_error: bool) -> Result<(), Error> {
    if crc_error {
        Err(Error::MalformedPayload)
    } else if observed.is_empty() || observed.contains(IrqFlags::RX_TIMEOUT) {
        Err(Error::NoData)
    } else {
        Ok(())
    }
}

/// Combines an operation result with the cleanup that must follow it.
/// The operation's own error takes precedence.
fn settle<T>(result: Result<T, Error>, cleanup: Result<(), Error>) -> Result<T, Error> {
    let value = result?;
    cleanup?;
    Ok(value)
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: embedded_hal::delay::DelayNs,
{
    /// Receives one packet into `buf`.
    ///
    /// # Returns
    /// Number of bytes copied, at most `buf.len()`
    ///
    /// # Errors
    /// * `Error::NoData` - no packet within the poll budget, or RX timeout
    /// * `Error::MalformedPayload` - payload CRC check failed
    /// * `Error::Transport` - SPI communication failed
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let result = self.receive_packet(buf);
        let cleared = self.clear_all_irq();

        #[cfg(feature = "defmt")]
        match &result {
            Ok(len) => defmt::debug!("received {} bytes", len),
            Err(err) => defmt::trace!("receive: {}", err),
        }

        settle(result, cleared)
    }

    fn receive_packet(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.mode()? != OperatingMode::RxContinuous {
            self.set_mode(OperatingMode::Standby)?;
            self.device.write_register(FifoRxBaseAddr {
                addr: self.config.rx_base_addr,
            })?;
            self.clear_all_irq()?;
            self.set_mode(OperatingMode::RxContinuous)?;
        }

        let mut observed = IrqFlags::empty();
        for _ in 0..self.config.rx_poll_attempts {
            observed = self.irq_flag(RX_EVENTS)?;
            if !observed.is_empty() {
                break;
            }
            self.delay.delay_ms(self.config.poll_interval_ms);
        }

        let crc_error = !self.irq_flag(IrqFlags::PAYLOAD_CRC_ERROR)?.is_empty();
        classify_rx(observed, crc_error)?;

        let start: FifoRxCurrentAddr = self.device.read_register()?;
        let count: RxNbBytes = self.device.read_register()?;
        self.device.write_register(FifoAddrPtr { addr: start.addr })?;

        let len = usize::from(count.count).min(buf.len());
        Ok(self.device.read_fifo(&mut buf[..len])?)
    }

    /// Transmits `payload`, truncated to 255 bytes.
    ///
    /// # Returns
    /// Number of bytes sent; 0 for an empty payload or when TxDone never
    /// showed up within the poll budget
    ///
    /// # Errors
    /// * `Error::Transport` - SPI communication failed
    pub fn send(&mut self, payload: &[u8]) -> Result<usize, Error> {
        let result = match self.send_packet(payload) {
            Err(Error::Timeout) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TxDone not raised, dropping packet");

                Ok(0)
            }
            other => other,
        };

        let restored = self
            .set_mode(OperatingMode::Standby)
            .and_then(|()| self.set_mode(OperatingMode::RxContinuous));

        settle(result, restored)
    }

    fn send_packet(&mut self, payload: &[u8]) -> Result<usize, Error> {
        self.set_mode(OperatingMode::Standby)?;
        if payload.is_empty() {
            return Ok(0);
        }

        let base = self.config.tx_base_addr;
        self.device.write_register(FifoTxBaseAddr { addr: base })?;
        self.device.write_register(FifoAddrPtr { addr: base })?;

        let len = payload.len().min(MAX_PAYLOAD_LENGTH);
        let written = self.device.write_fifo(&payload[..len])?;
        self.device.write_register(PayloadLength {
            length: written as u8,
        })?;
        self.clear_irq(IrqFlags::TX_DONE)?;

        let preamble: PreambleLength = self.device.read_register()?;
        self.set_mode(OperatingMode::Tx)?;
        self.wait_tx_done(tx_poll_budget(written, preamble.length))?;

        #[cfg(feature = "defmt")]
        defmt::debug!("sent {} bytes", written);

        Ok(written)
    }

    fn wait_tx_done(&mut self, budget: u32) -> Result<(), Error> {
        for remaining in (1..=budget).rev() {
            if !self.irq_flag(IrqFlags::TX_DONE)?.is_empty() {
                return Ok(());
            }
            if remaining > 1 {
                self.delay.delay_ms(self.config.poll_interval_ms);
            }
        }
        Err(Error::Timeout)
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// SNR of the last packet in dB
    pub fn packet_snr(&mut self) -> Result<i32, Error> {
        let snr: PktSnrValue = self.device.read_register()?;
        Ok(snr_db(snr.value))
    }

    /// Current RSSI in dBm
    pub fn rssi(&mut self) -> Result<i32, Error> {
        let low_frequency = self.mode_status()?.low_frequency;
        let rssi: RssiValue = self.device.read_register()?;
        Ok(rssi_dbm(rssi.value, low_frequency))
    }

    /// RSSI of the last packet in dBm
    pub fn packet_rssi(&mut self) -> Result<i32, Error> {
        let low_frequency = self.mode_status()?.low_frequency;
        let rssi: PktRssiValue = self.device.read_register()?;
        let snr: PktSnrValue = self.device.read_register()?;
        Ok(packet_rssi_dbm(rssi.value, snr.value, low_frequency))
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Async version of [`receive`](Radio::receive).
    pub async fn receive_async(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let result = self.receive_packet_async(buf).await;
        let cleared = self.clear_all_irq_async().await;

        #[cfg(feature = "defmt")]
        match &result {
            Ok(len) => defmt::debug!("received {} bytes", len),
            Err(err) => defmt::trace!("receive: {}", err),
        }

        settle(result, cleared)
    }

    async fn receive_packet_async(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.mode_async().await? != OperatingMode::RxContinuous {
            self.set_mode_async(OperatingMode::Standby).await?;
            self.device
                .write_register_async(FifoRxBaseAddr {
                    addr: self.config.rx_base_addr,
                })
                .await?;
            self.clear_all_irq_async().await?;
            self.set_mode_async(OperatingMode::RxContinuous).await?;
        }

        let mut observed = IrqFlags::empty();
        for _ in 0..self.config.rx_poll_attempts {
            observed = self.irq_flag_async(RX_EVENTS).await?;
            if !observed.is_empty() {
                break;
            }
            self.delay.delay_ms(self.config.poll_interval_ms).await;
        }

        let crc_error = !self
            .irq_flag_async(IrqFlags::PAYLOAD_CRC_ERROR)
            .await?
            .is_empty();
        classify_rx(observed, crc_error)?;

        let start: FifoRxCurrentAddr = self.device.read_register_async().await?;
        let count: RxNbBytes = self.device.read_register_async().await?;
        self.device
            .write_register_async(FifoAddrPtr { addr: start.addr })
            .await?;

        let len = usize::from(count.count).min(buf.len());
        Ok(self.device.read_fifo_async(&mut buf[..len]).await?)
    }

    /// Async version of [`send`](Radio::send).
    pub async fn send_async(&mut self, payload: &[u8]) -> Result<usize, Error> {
        let result = match self.send_packet_async(payload).await {
            Err(Error::Timeout) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TxDone not raised, dropping packet");

                Ok(0)
            }
            other => other,
        };

        let restored = match self.set_mode_async(OperatingMode::Standby).await {
            Ok(()) => self.set_mode_async(OperatingMode::RxContinuous).await,
            Err(err) => Err(err),
        };

        settle(result, restored)
    }

    async fn send_packet_async(&mut self, payload: &[u8]) -> Result<usize, Error> {
        self.set_mode_async(OperatingMode::Standby).await?;
        if payload.is_empty() {
            return Ok(0);
        }

        let base = self.config.tx_base_addr;
        self.device
            .write_register_async(FifoTxBaseAddr { addr: base })
            .await?;
        self.device
            .write_register_async(FifoAddrPtr { addr: base })
            .await?;

        let len = payload.len().min(MAX_PAYLOAD_LENGTH);
        let written = self.device.write_fifo_async(&payload[..len]).await?;
        self.device
            .write_register_async(PayloadLength {
                length: written as u8,
            })
            .await?;
        self.clear_irq_async(IrqFlags::TX_DONE).await?;

        let preamble: PreambleLength = self.device.read_register_async().await?;
        self.set_mode_async(OperatingMode::Tx).await?;

        let budget = tx_poll_budget(written, preamble.length);
        for remaining in (1..=budget).rev() {
            if !self.irq_flag_async(IrqFlags::TX_DONE).await?.is_empty() {
                #[cfg(feature = "defmt")]
                defmt::debug!("sent {} bytes", written);

                return Ok(written);
            }
            if remaining > 1 {
                self.delay.delay_ms(self.config.poll_interval_ms).await;
            }
        }

        Err(Error::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::mock::{self, *};
    use crate::Config;

    fn attach() -> (Rc<RefCell<ChipState>>, MockDelay, Radio<MockSpi, MockDelay>) {
        let (chip, spi, delay) = mock::chip();
        let radio = Radio::new(spi, delay.clone(), Config::default()).unwrap();
        (chip, delay, radio)
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(classify_rx(IrqFlags::empty(), false), Err(Error::NoData));
        assert_eq!(classify_rx(IrqFlags::RX_TIMEOUT, false), Err(Error::NoData));
        assert_eq!(classify_rx(IrqFlags::RX_DONE, false), Ok(()));
        assert_eq!(
            classify_rx(IrqFlags::RX_DONE | IrqFlags::PAYLOAD_CRC_ERROR, true),
            Err(Error::MalformedPayload)
        );
        assert_eq!(
            classify_rx(IrqFlags::RX_TIMEOUT | IrqFlags::PAYLOAD_CRC_ERROR, true),
            Err(Error::MalformedPayload)
        );
    }

    #[test]
    fn tx_budget_counts_payload_and_preamble() {
        assert_eq!(tx_poll_budget(10, 8), 21);
        assert_eq!(tx_poll_budget(255, 0xFFFF), 255 + 0xFFFF + 3);
    }

    #[test]
    fn receive_copies_pending_packet() {
        let (chip, delay, mut radio) = attach();
        chip.borrow_mut()
            .schedule_packet(0, IrqFlags::RX_DONE | IrqFlags::VALID_HEADER, b"0123456789");

        let mut buf = [0u8; 20];
        assert_eq!(radio.receive(&mut buf), Ok(10));
        assert_eq!(&buf[..10], b"0123456789");
        assert_eq!(buf[10..], [0u8; 10]);
        assert!(delay.waits().is_empty());
        assert_eq!(chip.borrow().register(REG_IRQ_FLAGS), 0x00);
    }

    #[test]
    fn receive_truncates_to_buffer() {
        let (chip, _delay, mut radio) = attach();
        chip.borrow_mut()
            .schedule_packet(0, IrqFlags::RX_DONE, b"0123456789");

        let mut buf = [0u8; 5];
        assert_eq!(radio.receive(&mut buf), Ok(5));
        assert_eq!(&buf, b"01234");
    }

    #[test]
    fn receive_waits_between_polls() {
        let (chip, delay, mut radio) = attach();
        chip.borrow_mut().schedule_packet(3, IrqFlags::RX_DONE, b"ab");

        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Ok(2));
        assert_eq!(delay.waits(), [20, 20, 20]);
    }

    #[test]
    fn receive_without_packet_reports_no_data() {
        let (chip, delay, mut radio) = attach();

        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Err(Error::NoData));
        assert_eq!(delay.waits().len(), 250);
        assert_eq!(chip.borrow().writes.last(), Some(&(REG_IRQ_FLAGS, 0xFF)));
    }

    #[test]
    fn receive_timeout_flag_reports_no_data() {
        let (chip, _delay, mut radio) = attach();
        chip.borrow_mut().schedule_packet(0, IrqFlags::RX_TIMEOUT, b"");

        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Err(Error::NoData));
        assert_eq!(chip.borrow().register(REG_IRQ_FLAGS), 0x00);
    }

    #[test]
    fn crc_error_without_rx_done_is_malformed() {
        let (chip, _delay, mut radio) = attach();
        chip.borrow_mut()
            .schedule_packet(0, IrqFlags::PAYLOAD_CRC_ERROR, b"bad");

        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Err(Error::MalformedPayload));
        assert_eq!(buf, [0u8; 8]);
        assert_eq!(chip.borrow().register(REG_IRQ_FLAGS), 0x00);
        assert_eq!(radio.mode(), Ok(OperatingMode::RxContinuous));
    }

    #[test]
    fn crc_error_wins_over_rx_done() {
        let (chip, _delay, mut radio) = attach();
        chip.borrow_mut().schedule_packet(
            0,
            IrqFlags::RX_DONE | IrqFlags::PAYLOAD_CRC_ERROR,
            b"bad",
        );

        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Err(Error::MalformedPayload));
        assert_eq!(buf, [0u8; 8]);
        assert_eq!(chip.borrow().register(REG_IRQ_FLAGS), 0x00);
    }

    #[test]
    fn receive_restarts_listening_from_standby() {
        let (chip, _delay, mut radio) = attach();
        radio.set_mode(OperatingMode::Standby).unwrap();
        chip.borrow_mut().set_register(REG_FIFO_RX_BASE, 0x40);
        chip.borrow_mut().op_mode_writes.clear();
        chip.borrow_mut().schedule_packet(0, IrqFlags::RX_DONE, b"x");

        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Ok(1));
        assert_eq!(chip.borrow().register(REG_FIFO_RX_BASE), 0x00);
        assert_eq!(chip.borrow().op_mode_writes, [0x89, 0x8D]);
    }

    #[test]
    fn send_loads_fifo_and_returns_to_rx() {
        let (chip, delay, mut radio) = attach();

        assert_eq!(radio.send(b"ping"), Ok(4));

        let chip = chip.borrow();
        assert_eq!(chip.tx_payload(), b"ping");
        assert_eq!(chip.register(REG_FIFO_TX_BASE), 0x80);
        assert_eq!(chip.register(REG_PAYLOAD_LENGTH), 4);
        assert_eq!(chip.mode(), 5);
        assert!(chip.op_mode_writes.contains(&0x8B));
        assert!(delay.waits().is_empty());
    }

    #[test]
    fn send_truncates_to_fifo_capacity() {
        let (chip, _delay, mut radio) = attach();
        let payload = [0xA5u8; 300];

        assert_eq!(radio.send(&payload), Ok(255));
        assert_eq!(chip.borrow().register(REG_PAYLOAD_LENGTH), 255);
    }

    #[test]
    fn send_waits_for_tx_done() {
        let (chip, delay, mut radio) = attach();
        chip.borrow_mut().tx_done_after = Some(2);

        assert_eq!(radio.send(b"abc"), Ok(3));
        assert_eq!(delay.waits(), [20, 20]);
    }

    #[test]
    fn send_timeout_reports_zero_bytes() {
        let (chip, delay, mut radio) = attach();
        chip.borrow_mut().tx_done_after = None;

        assert_eq!(radio.send(b"abc"), Ok(0));
        // preamble 8 + payload 3 + 3 polls, no wait after the last one
        assert_eq!(delay.waits().len(), 13);
        assert_eq!(chip.borrow().mode(), 5);
    }

    #[test]
    fn send_empty_payload_never_transmits() {
        let (chip, _delay, mut radio) = attach();
        chip.borrow_mut().op_mode_writes.clear();

        assert_eq!(radio.send(&[]), Ok(0));
        assert!(!chip.borrow().op_mode_writes.contains(&0x8B));
        assert_eq!(chip.borrow().mode(), 5);
    }

    #[test]
    fn bus_failure_propagates() {
        let (chip, _delay, mut radio) = attach();
        chip.borrow_mut().fail_transfers = true;

        let mut buf = [0u8; 4];
        assert!(matches!(radio.receive(&mut buf), Err(Error::Transport(_))));
        assert!(matches!(radio.send(b"x"), Err(Error::Transport(_))));
    }

    #[test]
    fn signal_quality_follows_port() {
        let (chip, _delay, mut radio) = attach();
        {
            let mut chip = chip.borrow_mut();
            chip.set_register(REG_PKT_SNR, (-20i8) as u8);
            chip.set_register(REG_PKT_RSSI, 100);
            chip.set_register(REG_RSSI, 90);
        }

        assert_eq!(radio.packet_snr().unwrap(), -5);
        assert_eq!(radio.rssi().unwrap(), -74);
        assert_eq!(radio.packet_rssi().unwrap(), -69);

        let op_mode = chip.borrow().register(REG_OP_MODE);
        chip.borrow_mut().set_register(REG_OP_MODE, op_mode & !0x08);
        assert_eq!(radio.rssi().unwrap(), -67);
    }

    #[test]
    fn async_exchange() {
        let (chip, delay, mut radio) = attach();
        chip.borrow_mut().schedule_packet(1, IrqFlags::RX_DONE, b"pong");

        let mut buf = [0u8; 8];
        assert_eq!(block_on(radio.receive_async(&mut buf)), Ok(4));
        assert_eq!(&buf[..4], b"pong");
        assert_eq!(delay.waits(), [20]);

        assert_eq!(block_on(radio.send_async(b"ping")), Ok(4));
        assert_eq!(chip.borrow().tx_payload(), b"ping");
        assert_eq!(chip.borrow().mode(), 5);

        chip.borrow_mut().tx_done_after = None;
        assert_eq!(block_on(radio.send_async(b"lost")), Ok(0));
    }
}
