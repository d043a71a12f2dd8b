//! The user control surface: bus requests and the role override.
//!
//! Values are informational. They are written from user space, read by the input sampler,
//! and every write requests an evaluation.
use core::str::FromStr;

use crate::Error;

/// Role override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Follow ID pin and VBUS.
    #[default]
    Otg,
    /// Force host mode: `id = 0`, `a_vbus_valid = 1`.
    Host,
    /// Force client mode: `id = 1`, `b_session_valid = 1`.
    Client,
}

impl Role {
    /// Name, as shown on the control surface.
    pub const fn name(self) -> &'static str {
        match self {
            Role::Otg => "otg",
            Role::Host => "host",
            Role::Client => "client",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Role::Otg, Role::Host, Role::Client]
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s))
            .ok_or(Error::InvalidValue(Attribute::Mode.name()))
    }
}

/// Attributes of the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    /// A-device bus request.
    ABusReq,
    /// A-device bus drop.
    ABusDrop,
    /// A-device VBUS error clear.
    AClrErr,
    /// Role override.
    Mode,
    /// Current state (read-only).
    State,
}

impl Attribute {
    const ALL: [Attribute; 5] = [
        Attribute::ABusReq,
        Attribute::ABusDrop,
        Attribute::AClrErr,
        Attribute::Mode,
        Attribute::State,
    ];

    /// Name of the attribute.
    pub const fn name(self) -> &'static str {
        match self {
            Attribute::ABusReq => "a_bus_req",
            Attribute::ABusDrop => "a_bus_drop",
            Attribute::AClrErr => "a_clr_err",
            Attribute::Mode => "mode",
            Attribute::State => "state",
        }
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.name() == s)
            .ok_or(Error::UnknownAttribute)
    }
}

/// Parse a boolean attribute value (`0` or `1`).
pub(crate) fn parse_bool(attribute: Attribute, value: &str) -> Result<bool, Error> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::InvalidValue(attribute.name())),
    }
}

pub(crate) const fn show_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Values written through the control surface and by the host stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Control {
    /// A-device bus request.
    pub a_bus_req: bool,
    /// A-device bus drop.
    pub a_bus_drop: bool,
    /// A-device VBUS error clear.
    pub a_clr_err: bool,
    /// Role override.
    pub role: Role,
    /// The host stack reported a connected downstream device.
    pub host_connected: bool,
}

impl Control {
    pub(crate) const fn new() -> Self {
        Self {
            a_bus_req: false,
            a_bus_drop: false,
            a_clr_err: false,
            role: Role::Otg,
            host_connected: false,
        }
    }
}
