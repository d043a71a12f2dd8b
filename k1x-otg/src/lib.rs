//! USB On-The-Go role controller for the SpacemiT K1x.
//!
//! Decides whether the port acts as A-device (VBUS source, USB host) or B-device (USB peripheral),
//! based on ID pin and VBUS state, and starts or stops the host and gadget stacks accordingly.
//!
//! Interrupts, cable notifications and the control surface only ever request an evaluation
//! through a [`notifier::Notifier`]. A single [`controller::Otg`] worker owns the state and
//! evaluates it, one pass at a time.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod control;
pub mod controller;
pub mod notifier;
pub mod registers;
pub mod state;
pub mod timers;
pub mod work;

#[cfg(test)]
pub mod dummy;

pub use k1x_otg_traits::{Capabilities, Driver, DriverError, Gadget, Host, Interrupts, RoleError};

/// Errors of the OTG controller.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Neither VBUS nor ID detection is wired up.
    #[error("neither VBUS nor ID detection is available")]
    NoCableDetection,
    /// OTG mode needs the ID pin, but the platform does not detect it.
    #[error("ID detection is not available in OTG mode")]
    NoIdDetection,
    /// Reading the cable state failed.
    #[error("cable state unavailable: {0:?}")]
    Sample(DriverError),
    /// A control attribute name is unknown.
    #[error("unknown attribute")]
    UnknownAttribute,
    /// A value could not be parsed for the given attribute.
    #[error("invalid value for `{0}`")]
    InvalidValue(&'static str),
    /// The attribute cannot be written.
    #[error("attribute `{0}` is read-only")]
    ReadOnly(&'static str),
}
