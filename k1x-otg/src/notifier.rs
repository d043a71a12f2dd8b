//! The front end that interrupts, cable notifications and user space talk to.
//!
//! Everything in here is cheap and non-blocking, so that it may be called from interrupt context.
//! None of it touches the state machine: it only updates shared inputs and requests an evaluation
//! from the worker.
use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use k1x_otg_traits::Interrupts;

use crate::Error;
use crate::control::{self, Attribute, Control, Role};
use crate::registers::{Otgsc, irq};
use crate::state::OtgState;
use crate::work::{Reason, Request, WorkQueue};

/// A cable state change, as reported by the extcon notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CableEvent {
    /// The "USB" cable changed. `true` while a VBUS session is present.
    Vbus(bool),
    /// The "USB-HOST" cable changed. `true` while attached, i.e. the ID pin is grounded.
    Id(bool),
}

/// The most recently pushed cable states.
///
/// `None` until the first event of that cable, the driver is asked instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cables {
    /// The "USB" cable reports a VBUS session.
    pub vbus_session: Option<bool>,
    /// The "USB-HOST" cable is attached.
    pub host_cable: Option<bool>,
}

impl Cables {
    const fn new() -> Self {
        Self {
            vbus_session: None,
            host_cable: None,
        }
    }
}

/// Whether an interrupt was raised by this controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// No enabled OTG interrupt was pending.
    None,
    /// The interrupt was handled, and an evaluation was requested.
    Handled,
}

/// Shared between the worker and all event sources.
pub struct Notifier<M: RawMutex> {
    work: WorkQueue<M>,
    control: Mutex<M, Cell<Control>>,
    cables: Mutex<M, Cell<Cables>>,
    irq_enable: AtomicU8,
    state: AtomicU8,
}

impl<M: RawMutex> Notifier<M> {
    /// Create a new notifier.
    pub const fn new() -> Self {
        Self {
            work: WorkQueue::new(),
            control: Mutex::new(Cell::new(Control::new())),
            cables: Mutex::new(Cell::new(Cables::new())),
            irq_enable: AtomicU8::new(irq::A_SESSION_VALID | irq::A_VBUS_VALID),
            state: AtomicU8::new(OtgState::Undefined as u8),
        }
    }

    pub(crate) fn configure(&self, role: Role, irq_enable: u8) {
        self.update_control(|control| control.role = role);
        self.irq_enable.store(irq_enable, Ordering::Relaxed);
    }

    pub(crate) async fn wait(&self) -> Request {
        self.work.wait().await
    }

    pub(crate) fn publish_state(&self, state: OtgState) {
        self.state.store(state.into(), Ordering::Relaxed);
    }

    fn update_control(&self, f: impl FnOnce(&mut Control)) {
        self.control.lock(|cell| {
            let mut control = cell.get();
            f(&mut control);
            cell.set(control);
        });
    }

    fn write_control(&self, f: impl FnOnce(&mut Control)) {
        self.update_control(f);
        self.request_evaluation(0, Reason::Control);
    }

    /// Request an evaluation after `delay_ms`.
    ///
    /// Merged into an already pending request, if any.
    pub fn request_evaluation(&self, delay_ms: u64, reason: Reason) {
        if !self.work.request(delay_ms, reason) {
            trace!("Evaluation already pending, merged {:?}", reason);
        }
    }

    /// Interrupt handler.
    ///
    /// Clears the pending OTGSC interrupts, and requests an immediate evaluation if one of the
    /// enabled interrupts was pending.
    pub fn interrupt<I: Interrupts>(&self, interrupts: &mut I) -> IrqReturn {
        interrupts.enable_clocks();

        let otgsc = Otgsc(interrupts.read_and_clear_otgsc());
        if otgsc.interrupt_status() & self.irq_enable.load(Ordering::Relaxed) == 0 {
            return IrqReturn::None;
        }

        trace!("OTG interrupt {:?}", otgsc);
        self.request_evaluation(0, Reason::Interrupt);
        IrqReturn::Handled
    }

    /// Extcon notifier callback.
    ///
    /// Records the new cable state, and ungates the clocks for the evaluation that it requests.
    pub fn cable_changed<I: Interrupts>(&self, interrupts: &mut I, event: CableEvent) {
        debug!("Cable event {:?}", event);
        interrupts.enable_clocks();

        self.cables.lock(|cell| {
            let mut cables = cell.get();
            match event {
                CableEvent::Vbus(present) => cables.vbus_session = Some(present),
                CableEvent::Id(attached) => cables.host_cable = Some(attached),
            }
            cell.set(cables);
        });

        self.request_evaluation(0, Reason::Cable);
    }

    /// The cable states pushed so far.
    pub fn cables(&self) -> Cables {
        self.cables.lock(|cell| cell.get())
    }

    /// Notification from the host stack, that a downstream device (dis)connected.
    ///
    /// Only used with [`BConnPolicy::Report`](crate::config::BConnPolicy::Report).
    pub fn host_connected(&self, connected: bool) {
        self.update_control(|control| control.host_connected = connected);
        self.request_evaluation(0, Reason::HostConnect);
    }

    pub(crate) fn clear_host_connected(&self) {
        self.update_control(|control| control.host_connected = false);
    }

    /// Set the A-device bus request.
    pub fn set_a_bus_req(&self, value: bool) {
        self.write_control(|control| control.a_bus_req = value);
    }

    /// Set the A-device bus drop.
    pub fn set_a_bus_drop(&self, value: bool) {
        self.write_control(|control| control.a_bus_drop = value);
    }

    /// Set the A-device VBUS error clear.
    pub fn set_a_clr_err(&self, value: bool) {
        self.write_control(|control| control.a_clr_err = value);
    }

    /// Override the role, or follow the cable again with [`Role::Otg`].
    pub fn set_role(&self, role: Role) {
        info!("Role override: {}", role.name());
        self.write_control(|control| control.role = role);
    }

    /// The current control values.
    pub fn control(&self) -> Control {
        self.control.lock(|cell| cell.get())
    }

    /// The most recently published state.
    ///
    /// Advisory only, it may be outdated as soon as it is read.
    pub fn state(&self) -> OtgState {
        OtgState::try_from(self.state.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Write an attribute, in sysfs style.
    pub fn store(&self, attribute: Attribute, value: &str) -> Result<(), Error> {
        match attribute {
            Attribute::ABusReq => self.set_a_bus_req(control::parse_bool(attribute, value)?),
            Attribute::ABusDrop => self.set_a_bus_drop(control::parse_bool(attribute, value)?),
            Attribute::AClrErr => self.set_a_clr_err(control::parse_bool(attribute, value)?),
            Attribute::Mode => self.set_role(value.parse()?),
            Attribute::State => return Err(Error::ReadOnly(attribute.name())),
        }

        Ok(())
    }

    /// Read an attribute, in sysfs style.
    pub fn show(&self, attribute: Attribute) -> &'static str {
        let control = self.control();

        match attribute {
            Attribute::ABusReq => control::show_bool(control.a_bus_req),
            Attribute::ABusDrop => control::show_bool(control.a_bus_drop),
            Attribute::AClrErr => control::show_bool(control.a_clr_err),
            Attribute::Mode => control.role.name(),
            Attribute::State => self.state().name(),
        }
    }
}

impl<M: RawMutex> Default for Notifier<M> {
    fn default() -> Self {
        Self::new()
    }
}
