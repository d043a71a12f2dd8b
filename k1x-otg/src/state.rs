//! OTG states and the inputs that drive them.
use core::fmt;

/// OTG states, following the role negotiation diagram of the USB OTG supplement.
///
/// The `B*` states belong to the peripheral role, the `A*` states to the host role.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OtgState {
    /// Initial state, before the first evaluation.
    #[default]
    Undefined = 0,
    BIdle,
    BSrpInit,
    BPeripheral,
    BWaitAcon,
    BHost,
    AIdle,
    AWaitVrise,
    AWaitBcon,
    AHost,
    ASuspend,
    APeripheral,
    AWaitVfall,
    /// VBUS collapsed while acting as host. Only left by removing the cable.
    AVbusErr,
}

impl OtgState {
    /// The number of states.
    pub const COUNT: usize = 14;

    /// All states, in declaration order.
    pub const ALL: [OtgState; Self::COUNT] = [
        OtgState::Undefined,
        OtgState::BIdle,
        OtgState::BSrpInit,
        OtgState::BPeripheral,
        OtgState::BWaitAcon,
        OtgState::BHost,
        OtgState::AIdle,
        OtgState::AWaitVrise,
        OtgState::AWaitBcon,
        OtgState::AHost,
        OtgState::ASuspend,
        OtgState::APeripheral,
        OtgState::AWaitVfall,
        OtgState::AVbusErr,
    ];

    /// The name that Linux uses for this state.
    pub const fn name(self) -> &'static str {
        match self {
            OtgState::Undefined => "undefined",
            OtgState::BIdle => "b_idle",
            OtgState::BSrpInit => "b_srp_init",
            OtgState::BPeripheral => "b_peripheral",
            OtgState::BWaitAcon => "b_wait_acon",
            OtgState::BHost => "b_host",
            OtgState::AIdle => "a_idle",
            OtgState::AWaitVrise => "a_wait_vrise",
            OtgState::AWaitBcon => "a_wait_bcon",
            OtgState::AHost => "a_host",
            OtgState::ASuspend => "a_suspend",
            OtgState::APeripheral => "a_peripheral",
            OtgState::AWaitVfall => "a_wait_vfall",
            OtgState::AVbusErr => "a_vbus_err",
        }
    }

    /// Whether the state belongs to the A-device (host) role.
    pub const fn is_a_device(self) -> bool {
        matches!(
            self,
            OtgState::AIdle
                | OtgState::AWaitVrise
                | OtgState::AWaitBcon
                | OtgState::AHost
                | OtgState::ASuspend
                | OtgState::APeripheral
                | OtgState::AWaitVfall
                | OtgState::AVbusErr
        )
    }

    /// Whether the state belongs to the B-device (peripheral) role.
    pub const fn is_b_device(self) -> bool {
        matches!(
            self,
            OtgState::BIdle | OtgState::BSrpInit | OtgState::BPeripheral | OtgState::BWaitAcon | OtgState::BHost
        )
    }
}

impl From<OtgState> for u8 {
    fn from(state: OtgState) -> u8 {
        state as u8
    }
}

impl TryFrom<u8> for OtgState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OtgState::ALL.get(value as usize).copied().ok_or(value)
    }
}

impl fmt::Display for OtgState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs of the state machine.
///
/// A fresh snapshot is taken at the start of every evaluation pass. During the pass, only
/// `b_conn` (entering `AWaitBcon` or `AWaitVfall`) and the timeout flag (leaving `AWaitBcon`)
/// are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OtgInputs {
    /// Cable role. `false` is the A-device (host), `true` the B-device (peripheral).
    pub id: bool,
    /// VBUS session present, seen as B-device.
    pub b_session_valid: bool,
    /// VBUS present, seen as A-device.
    pub a_vbus_valid: bool,
    /// A B-device is connected while acting as host.
    pub b_conn: bool,
    /// User request to use the bus.
    pub a_bus_req: bool,
    /// User request to drop the bus.
    pub a_bus_drop: bool,
    /// User request to clear a VBUS error.
    pub a_clr_err: bool,
    /// The B-device did not connect in time.
    pub a_wait_bcon_timeout: bool,
}

#[cfg(test)]
mod tests {
    use super::OtgState;

    #[test]
    fn test_state_encoding() {
        for state in OtgState::ALL {
            assert_eq!(OtgState::try_from(u8::from(state)), Ok(state));
        }

        assert_eq!(OtgState::try_from(14), Err(14));
    }

    #[test]
    fn test_roles() {
        assert!(!OtgState::Undefined.is_a_device());
        assert!(!OtgState::Undefined.is_b_device());

        for state in OtgState::ALL.into_iter().skip(1) {
            assert!(state.is_a_device() ^ state.is_b_device(), "{state}");
            assert_eq!(state.is_a_device(), state.name().starts_with("a_"));
        }
    }
}
