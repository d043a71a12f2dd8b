//! Controller configuration.
use crate::control::Role;
use crate::registers::irq;

/// Where the B-device connection input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BConnPolicy {
    /// Assume that a B-device connects as soon as the host stack was started.
    ///
    /// This is how the K1x vendor driver behaves, the `AWaitBcon` timer never expires in practice.
    #[default]
    Assume,
    /// Use the connection state that the host stack reports through
    /// [`Notifier::host_connected`](crate::notifier::Notifier::host_connected).
    Report,
}

/// Configuration of the OTG controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// How long an A-device waits for a B-device to connect.
    pub a_wait_bcon_timeout_ms: u64,
    /// Grace period before the first evaluation, to let the hardware settle.
    pub startup_delay_ms: u64,
    /// Gate the clocks while idle as B-device.
    pub clock_gating: bool,
    /// Initial role override.
    pub role: Role,
    /// Source of the B-device connection input.
    pub b_conn: BConnPolicy,
    /// OTGSC interrupts that request an evaluation, see [`irq`].
    pub irq_enable: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            a_wait_bcon_timeout_ms: 2000,
            startup_delay_ms: 2000,
            clock_gating: true,
            role: Role::Otg,
            b_conn: BConnPolicy::Assume,
            irq_enable: irq::A_SESSION_VALID | irq::A_VBUS_VALID,
        }
    }
}

impl Config {
    /// Set the `AWaitBcon` timeout.
    pub fn with_a_wait_bcon_timeout_ms(mut self, milliseconds: u64) -> Self {
        self.a_wait_bcon_timeout_ms = milliseconds;
        self
    }

    /// Set the grace period before the first evaluation.
    pub fn with_startup_delay_ms(mut self, milliseconds: u64) -> Self {
        self.startup_delay_ms = milliseconds;
        self
    }

    /// Enable or disable clock gating.
    pub fn with_clock_gating(mut self, clock_gating: bool) -> Self {
        self.clock_gating = clock_gating;
        self
    }

    /// Set the initial role override.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the source of the B-device connection input.
    pub fn with_b_conn(mut self, b_conn: BConnPolicy) -> Self {
        self.b_conn = b_conn;
        self
    }

    /// Set the interrupts that request an evaluation.
    pub fn with_irq_enable(mut self, irq_enable: u8) -> Self {
        self.irq_enable = irq_enable;
        self
    }
}
