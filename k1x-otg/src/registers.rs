//! Register views of the EHCI-style controller block.
//!
//! Only the registers that the OTG logic touches are described here.
use proc_bitfield::bitfield;

/// Offset of OTGSC within the operational register block.
pub const OTGSC_OFFSET: usize = 0x64;

/// Interrupt bits, as found in [`Otgsc::interrupt_status`] and [`Otgsc::interrupt_enable`].
pub mod irq {
    /// USB ID changed.
    pub const ID: u8 = 1 << 0;
    /// A-VBUS valid changed.
    pub const A_VBUS_VALID: u8 = 1 << 1;
    /// A-session valid changed.
    pub const A_SESSION_VALID: u8 = 1 << 2;
    /// B-session valid changed.
    pub const B_SESSION_VALID: u8 = 1 << 3;
    /// B-session end changed.
    pub const B_SESSION_END: u8 = 1 << 4;
    /// 1 ms timer tick.
    pub const MS_TIMER: u8 = 1 << 5;
    /// Data pulse detected.
    pub const DATA_PULSE: u8 = 1 << 6;
}

bitfield! {
    /// Capability length and interface version register, at the start of the capability block.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct CapLength(pub u32): Debug, FromStorage, IntoStorage {
        /// Length of the capability block, in bytes.
        pub length: u8 @ 0..=7,
        /// BCD encoded interface version.
        pub hci_version: u16 @ 16..=31,
    }
}

impl CapLength {
    /// Offset of the operational registers from the capability base.
    pub fn operational_offset(&self) -> usize {
        self.length() as usize
    }

    /// Offset of OTGSC from the capability base.
    pub fn otgsc_offset(&self) -> usize {
        self.operational_offset() + OTGSC_OFFSET
    }
}

bitfield! {
    /// OTG status and control register.
    ///
    /// Interrupt status bits are write-one-to-clear.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Otgsc(pub u32): Debug, FromStorage, IntoStorage {
        /// Discharge VBUS.
        pub vbus_discharge: bool @ 0,
        /// Charge VBUS.
        pub vbus_charge: bool @ 1,
        /// Enable the OTG termination pull-down.
        pub otg_termination: bool @ 3,
        /// Data pulsing (SRP).
        pub data_pulsing: bool @ 4,
        /// Enable the ID pull-up.
        pub id_pullup: bool @ 5,
        /// USB ID (0 -> A-device, 1 -> B-device).
        pub id: bool @ 8,
        /// VBUS is above the A-VBUS valid threshold.
        pub a_vbus_valid: bool @ 9,
        /// VBUS is above the A-session valid threshold.
        pub a_session_valid: bool @ 10,
        /// VBUS is above the B-session valid threshold.
        pub b_session_valid: bool @ 11,
        /// VBUS is below the B-session end threshold.
        pub b_session_end: bool @ 12,
        /// 1 ms timer toggle.
        pub ms_toggle: bool @ 13,
        /// Data bus pulsing detected.
        pub data_bus_pulsing: bool @ 14,
        /// Pending interrupts, see [`irq`].
        pub interrupt_status: u8 @ 16..=22,
        /// Enabled interrupts, see [`irq`].
        pub interrupt_enable: u8 @ 24..=30,
    }
}
