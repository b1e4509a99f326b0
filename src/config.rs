//! Platform configuration for a radio instance
//!
//! The crystal frequency is a board property (the reference design uses a
//! 32 MHz crystal, some modules ship a TCXO at a different rate), so it is
//! supplied here instead of being fixed in the frequency codec.

/// Reference crystal frequency used when the platform does not override it
pub const DEFAULT_CRYSTAL_HZ: u32 = 32_000_000;

/// Interval between two IRQ flag polls
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 20;

/// Number of flag polls performed by a receive before reporting no data
pub const DEFAULT_RX_POLL_ATTEMPTS: u32 = 250;

/// FIFO base address used for received packets
pub const DEFAULT_RX_BASE_ADDR: u8 = 0x00;

/// FIFO base address used for packets to transmit
pub const DEFAULT_TX_BASE_ADDR: u8 = 0x80;

/// Radio configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Crystal oscillator frequency in Hz
    pub crystal_hz: u32,
    /// Flag polling cadence in milliseconds
    pub poll_interval_ms: u32,
    /// Upper bound on receive flag polls
    pub rx_poll_attempts: u32,
    /// FIFO RX base address
    pub rx_base_addr: u8,
    /// FIFO TX base address
    pub tx_base_addr: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crystal_hz: DEFAULT_CRYSTAL_HZ,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            rx_poll_attempts: DEFAULT_RX_POLL_ATTEMPTS,
            rx_base_addr: DEFAULT_RX_BASE_ADDR,
            tx_base_addr: DEFAULT_TX_BASE_ADDR,
        }
    }
}

impl Config {
    /// Overrides the crystal frequency
    pub const fn with_crystal_hz(mut self, crystal_hz: u32) -> Self {
        self.crystal_hz = crystal_hz;
        self
    }

    /// Overrides the flag polling cadence
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Overrides the number of receive flag polls
    pub const fn with_rx_poll_attempts(mut self, attempts: u32) -> Self {
        self.rx_poll_attempts = attempts;
        self
    }
}
