//! K1x USB OTG collaborator traits.
//!
//! Provides the traits through which the OTG role controller talks to the USB controller hardware,
//! the host-controller stack, and the gadget stack.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
use core::future::Future;

/// Errors reported by the OTG controller hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The cable-state source (extcon device) could not be looked up or read.
    CableUnavailable,

    /// A clock could not be enabled.
    Clock,

    /// The VBUS supply (GPIO or regulator) could not be switched.
    Vbus,

    /// The controller did not leave reset in time.
    ResetTimeout,
}

/// Errors reported by the host or gadget stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoleError {
    /// The stack has not been bound to this controller yet.
    NotBound,

    /// The stack refused to start.
    Failed,
}

/// Cable detection that the platform wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// VBUS session detection through the "USB" cable.
    pub vbus_detect: bool,
    /// ID pin detection through the "USB-HOST" cable.
    pub id_detect: bool,
}

/// Driver trait, through which the OTG controller samples inputs and drives the hardware.
///
/// All methods are called from the single worker context.
pub trait Driver {
    /// The detection capabilities advertised by the platform.
    fn capabilities(&self) -> Capabilities;

    /// Whether the "USB" cable reports a valid VBUS session.
    fn vbus_session(&mut self) -> Result<bool, DriverError>;

    /// Whether the "USB-HOST" cable is attached (ID pin grounded).
    fn host_cable(&mut self) -> Result<bool, DriverError>;

    /// Read the raw OTG status and control register (OTGSC).
    fn read_otgsc(&mut self) -> u32;

    /// Ungate the controller and PHY clocks.
    fn enable_clocks(&mut self) -> Result<(), DriverError>;

    /// Gate the controller and PHY clocks.
    fn disable_clocks(&mut self);

    /// Reset the controller and wait for completion.
    fn reset_controller(&mut self) -> impl Future<Output = Result<(), DriverError>>;

    /// Switch the VBUS supply.
    fn set_vbus(&mut self, on: bool) -> impl Future<Output = Result<(), DriverError>>;

    /// Hold or release a wakeup source, so that the system does not suspend while supplying VBUS.
    fn hold_wakeup(&mut self, _hold: bool) {}
}

/// The USB host-controller stack.
pub trait Host {
    /// Add the host controller, enumerating downstream devices.
    fn start(&mut self) -> impl Future<Output = Result<(), RoleError>>;

    /// Remove the host controller.
    fn stop(&mut self) -> impl Future<Output = ()>;
}

/// The USB gadget (peripheral) stack.
pub trait Gadget {
    /// Connect the gadget to the bus.
    fn connect(&mut self) -> impl Future<Output = Result<(), RoleError>>;

    /// Disconnect the gadget from the bus.
    fn disconnect(&mut self) -> impl Future<Output = ()>;
}

/// The view of the controller that the interrupt handler gets.
///
/// Implementations must be cheap and must not block.
pub trait Interrupts {
    /// Ungate the clocks, so that registers can be accessed.
    fn enable_clocks(&mut self);

    /// Read OTGSC and write the value back, clearing the pending (write-one-to-clear) interrupt bits.
    fn read_and_clear_otgsc(&mut self) -> u32;
}
