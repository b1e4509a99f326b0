//! Simulated SX127x used by the unit tests.
//!
//! The chip keeps its register file and FIFO in a shared [`ChipState`] so a
//! test can script radio events and inspect the result after handing the SPI
//! half to a [`Radio`](crate::Radio). Both the blocking and the async
//! embedded-hal traits are implemented.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::spi::{ErrorKind, ErrorType, Operation};

use crate::registers::IrqFlags;

pub const REG_FIFO: u8 = 0x00;
pub const REG_OP_MODE: u8 = 0x01;
pub const REG_FRF_MSB: u8 = 0x06;
pub const REG_PA_CONFIG: u8 = 0x09;
pub const REG_LNA: u8 = 0x0C;
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
pub const REG_FIFO_TX_BASE: u8 = 0x0E;
pub const REG_FIFO_RX_BASE: u8 = 0x0F;
pub const REG_FIFO_RX_CURRENT: u8 = 0x10;
pub const REG_IRQ_FLAGS: u8 = 0x12;
pub const REG_RX_NB_BYTES: u8 = 0x13;
pub const REG_PKT_SNR: u8 = 0x19;
pub const REG_PKT_RSSI: u8 = 0x1A;
pub const REG_RSSI: u8 = 0x1B;
pub const REG_MODEM_CONFIG1: u8 = 0x1D;
pub const REG_MODEM_CONFIG2: u8 = 0x1E;
pub const REG_SYMB_TIMEOUT_LSB: u8 = 0x1F;
pub const REG_PREAMBLE_MSB: u8 = 0x20;
pub const REG_PREAMBLE_LSB: u8 = 0x21;
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
pub const REG_MAX_PAYLOAD_LENGTH: u8 = 0x23;
pub const REG_MODEM_CONFIG3: u8 = 0x26;
pub const REG_VERSION: u8 = 0x42;

const READ_ONLY: [u8; 6] = [
    REG_FIFO_RX_CURRENT,
    REG_RX_NB_BYTES,
    REG_PKT_SNR,
    REG_PKT_RSSI,
    REG_RSSI,
    REG_VERSION,
];

const MODE_SLEEP: u8 = 0;
const MODE_STANDBY: u8 = 1;
const MODE_TX: u8 = 3;

/// A packet the chip will "receive" once the IRQ register has been polled
struct PendingPacket {
    polls_left: u32,
    flags: IrqFlags,
    payload: Vec<u8>,
}

pub struct ChipState {
    pub registers: [u8; 0x80],
    pub fifo: [u8; 256],
    /// Every value written to RegOpMode, in order
    pub op_mode_writes: Vec<u8>,
    /// Every (register, value) byte written to the chip, in order
    pub writes: Vec<(u8, u8)>,
    /// Polls after entering TX before TxDone is raised, `None` never completes
    pub tx_done_after: Option<u32>,
    tx_polls_left: Option<u32>,
    pending_packet: Option<PendingPacket>,
    pub fail_transfers: bool,
}

impl ChipState {
    fn new() -> Self {
        let mut registers = [0u8; 0x80];
        registers[usize::from(REG_OP_MODE)] = 0x09;
        registers[usize::from(REG_FRF_MSB)] = 0x6C;
        registers[usize::from(REG_FRF_MSB + 1)] = 0x80;
        registers[usize::from(REG_PA_CONFIG)] = 0x4F;
        registers[usize::from(REG_LNA)] = 0x20;
        registers[usize::from(REG_FIFO_TX_BASE)] = 0x80;
        registers[usize::from(REG_MODEM_CONFIG1)] = 0x72;
        registers[usize::from(REG_MODEM_CONFIG2)] = 0x70;
        registers[usize::from(REG_SYMB_TIMEOUT_LSB)] = 0x64;
        registers[usize::from(REG_PREAMBLE_LSB)] = 0x08;
        registers[usize::from(REG_PAYLOAD_LENGTH)] = 0x01;
        registers[usize::from(REG_MAX_PAYLOAD_LENGTH)] = 0xFF;
        registers[usize::from(REG_VERSION)] = 0x12;

        Self {
            registers,
            fifo: [0; 256],
            op_mode_writes: Vec::new(),
            writes: Vec::new(),
            tx_done_after: Some(0),
            tx_polls_left: None,
            pending_packet: None,
            fail_transfers: false,
        }
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[usize::from(address)]
    }

    pub fn set_register(&mut self, address: u8, value: u8) {
        self.registers[usize::from(address)] = value;
    }

    pub fn mode(&self) -> u8 {
        self.register(REG_OP_MODE) & 0x07
    }

    /// Raises `flags` and stores `payload` at the RX base after `polls` IRQ reads
    pub fn schedule_packet(&mut self, polls: u32, flags: IrqFlags, payload: &[u8]) {
        self.pending_packet = Some(PendingPacket {
            polls_left: polls,
            flags,
            payload: payload.to_vec(),
        });
    }

    /// Payload bytes written for transmission, read back from the TX base
    pub fn tx_payload(&self) -> Vec<u8> {
        let base = usize::from(self.register(REG_FIFO_TX_BASE));
        let len = usize::from(self.register(REG_PAYLOAD_LENGTH));
        (0..len).map(|i| self.fifo[(base + i) % 256]).collect()
    }

    fn deliver_packet(&mut self, packet: PendingPacket) {
        let base = self.register(REG_FIFO_RX_BASE);
        for (i, byte) in packet.payload.iter().enumerate() {
            self.fifo[(usize::from(base) + i) % 256] = *byte;
        }
        self.set_register(REG_FIFO_RX_CURRENT, base);
        self.set_register(REG_RX_NB_BYTES, packet.payload.len() as u8);
        self.registers[usize::from(REG_IRQ_FLAGS)] |= packet.flags.bits();
    }

    fn poll_events(&mut self) {
        if let Some(mut packet) = self.pending_packet.take() {
            if packet.polls_left == 0 {
                self.deliver_packet(packet);
            } else {
                packet.polls_left -= 1;
                self.pending_packet = Some(packet);
            }
        }

        match self.tx_polls_left {
            Some(0) => {
                self.tx_polls_left = None;
                self.registers[usize::from(REG_IRQ_FLAGS)] |= IrqFlags::TX_DONE.bits();
                let op_mode = self.register(REG_OP_MODE);
                self.set_register(REG_OP_MODE, (op_mode & !0x07) | MODE_STANDBY);
            }
            Some(polls) => self.tx_polls_left = Some(polls - 1),
            None => {}
        }
    }

    fn read_byte(&mut self, address: u8) -> u8 {
        match address {
            REG_FIFO => {
                let ptr = self.register(REG_FIFO_ADDR_PTR);
                self.set_register(REG_FIFO_ADDR_PTR, ptr.wrapping_add(1));
                self.fifo[usize::from(ptr)]
            }
            REG_IRQ_FLAGS => {
                self.poll_events();
                self.register(REG_IRQ_FLAGS)
            }
            _ => self.register(address),
        }
    }

    fn write_byte(&mut self, address: u8, value: u8) {
        self.writes.push((address, value));

        match address {
            REG_FIFO => {
                let ptr = self.register(REG_FIFO_ADDR_PTR);
                self.fifo[usize::from(ptr)] = value;
                self.set_register(REG_FIFO_ADDR_PTR, ptr.wrapping_add(1));
            }
            REG_IRQ_FLAGS => self.registers[usize::from(REG_IRQ_FLAGS)] &= !value,
            REG_OP_MODE => {
                self.op_mode_writes.push(value);
                let current = self.register(REG_OP_MODE);
                // LongRangeMode only latches in sleep
                let value = if current & 0x07 == MODE_SLEEP {
                    value
                } else {
                    (value & 0x7F) | (current & 0x80)
                };
                self.set_register(REG_OP_MODE, value);
                self.tx_polls_left = match value & 0x07 {
                    MODE_TX => self.tx_done_after,
                    _ => None,
                };
            }
            _ if READ_ONLY.contains(&address) => {}
            _ => self.set_register(address, value),
        }
    }

    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
        if self.fail_transfers {
            return Err(ErrorKind::Other);
        }

        let mut header: Option<u8> = None;
        for operation in operations.iter_mut() {
            match (header, operation) {
                (None, Operation::Write(bytes)) => {
                    let (first, data) = bytes.split_first().ok_or(ErrorKind::Other)?;
                    header = Some(*first);
                    self.write_data(*first, data);
                }
                (Some(address), Operation::Write(bytes)) => self.write_data(address, bytes),
                (Some(address), Operation::Read(bytes)) => self.read_data(address, bytes),
                _ => return Err(ErrorKind::Other),
            }
        }

        Ok(())
    }

    fn write_data(&mut self, header: u8, data: &[u8]) {
        assert!(
            data.is_empty() || header & 0x80 != 0,
            "data written on a read access"
        );
        let mut address = header & 0x7F;
        for byte in data {
            self.write_byte(address, *byte);
            if address != REG_FIFO {
                address += 1;
            }
        }
    }

    fn read_data(&mut self, header: u8, data: &mut [u8]) {
        assert_eq!(header & 0x80, 0, "read on a write access");
        let mut address = header;
        for byte in data.iter_mut() {
            *byte = self.read_byte(address);
            if address != REG_FIFO {
                address += 1;
            }
        }
    }
}

/// SPI half of the simulated chip
pub struct MockSpi {
    state: Rc<RefCell<ChipState>>,
}

impl ErrorType for MockSpi {
    type Error = ErrorKind;
}

impl embedded_hal::spi::SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.state.borrow_mut().transaction(operations)
    }
}

impl embedded_hal_async::spi::SpiDevice for MockSpi {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        self.state.borrow_mut().transaction(operations)
    }
}

/// Delay that only records the requested waits
#[derive(Clone, Default)]
pub struct MockDelay {
    elapsed_ms: Rc<RefCell<Vec<u32>>>,
}

impl MockDelay {
    /// Every millisecond wait requested, in order
    pub fn waits(&self) -> Vec<u32> {
        self.elapsed_ms.borrow().clone()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms.borrow_mut().push(ms);
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms.borrow_mut().push(ms);
    }
}

/// Creates a simulated chip in its reset state
pub fn chip() -> (Rc<RefCell<ChipState>>, MockSpi, MockDelay) {
    let state = Rc::new(RefCell::new(ChipState::new()));
    let spi = MockSpi {
        state: state.clone(),
    };
    (state, spi, MockDelay::default())
}
