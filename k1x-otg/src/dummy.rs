//! Implements dummy collaborators and a timer for testing.
use std::future::pending;
use std::vec::Vec;

use embassy_futures::yield_now;
use k1x_otg_traits::{Capabilities, Driver, DriverError, Gadget, Host, Interrupts, RoleError};

use crate::timers::Timer;

/// A dummy timer for testing.
pub struct DummyTimer {}

impl Timer for DummyTimer {
    async fn after_millis(_milliseconds: u64) {
        // Never time out
        pending().await
    }

    fn now_millis() -> u64 {
        0
    }
}

/// Calls that reached the dummy driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    EnableClocks,
    DisableClocks,
    Reset,
    Vbus(bool),
}

/// A dummy driver, with cable state that tests can set.
pub struct DummyDriver {
    pub capabilities: Capabilities,
    /// The "USB-HOST" cable (ID grounded).
    pub host_cable: Result<bool, DriverError>,
    /// The "USB" cable (VBUS session).
    pub vbus_session: Result<bool, DriverError>,
    pub otgsc: u32,
    pub fail_vbus: bool,
    pub wakeup_held: bool,
    pub clocks_on: bool,
    /// Number of OTGSC reads, one per sampled evaluation pass.
    pub samples: usize,
    /// OTGSC reads while the clocks were gated.
    pub gated_reads: usize,
    pub calls: Vec<DriverCall>,
}

impl DummyDriver {
    /// Create a new dummy driver with both detection capabilities and no cable attached.
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities {
                vbus_detect: true,
                id_detect: true,
            },
            host_cable: Ok(false),
            vbus_session: Ok(false),
            otgsc: 0,
            fail_vbus: false,
            wakeup_held: false,
            // Clocks are running after probe.
            clocks_on: true,
            samples: 0,
            gated_reads: 0,
            calls: Vec::new(),
        }
    }

    /// Attach a host cable (ID grounded), as A-device.
    pub fn attach_host_cable(&mut self, a_vbus_valid: bool) {
        self.host_cable = Ok(true);
        self.vbus_session = Ok(false);
        self.set_a_vbus_valid(a_vbus_valid);
    }

    /// Attach to a host, as B-device.
    pub fn attach_to_host(&mut self) {
        self.host_cable = Ok(false);
        self.vbus_session = Ok(true);
    }

    /// Remove any cable.
    pub fn detach(&mut self) {
        self.host_cable = Ok(false);
        self.vbus_session = Ok(false);
    }

    /// Set the A-VBUS valid status bit.
    pub fn set_a_vbus_valid(&mut self, valid: bool) {
        if valid {
            self.otgsc |= 1 << 9;
        } else {
            self.otgsc &= !(1 << 9);
        }
    }

    /// Count the calls that match `call`.
    pub fn count(&self, call: DriverCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl Driver for DummyDriver {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn vbus_session(&mut self) -> Result<bool, DriverError> {
        self.vbus_session
    }

    fn host_cable(&mut self) -> Result<bool, DriverError> {
        self.host_cable
    }

    fn read_otgsc(&mut self) -> u32 {
        self.samples += 1;
        if !self.clocks_on {
            self.gated_reads += 1;
        }
        self.otgsc
    }

    fn enable_clocks(&mut self) -> Result<(), DriverError> {
        self.calls.push(DriverCall::EnableClocks);
        self.clocks_on = true;
        Ok(())
    }

    fn disable_clocks(&mut self) {
        self.calls.push(DriverCall::DisableClocks);
        self.clocks_on = false;
    }

    async fn reset_controller(&mut self) -> Result<(), DriverError> {
        self.calls.push(DriverCall::Reset);
        Ok(())
    }

    async fn set_vbus(&mut self, on: bool) -> Result<(), DriverError> {
        self.calls.push(DriverCall::Vbus(on));

        if self.fail_vbus { Err(DriverError::Vbus) } else { Ok(()) }
    }

    fn hold_wakeup(&mut self, hold: bool) {
        self.wakeup_held = hold;
    }
}

impl Interrupts for DummyDriver {
    fn enable_clocks(&mut self) {
        self.calls.push(DriverCall::EnableClocks);
        self.clocks_on = true;
    }

    fn read_and_clear_otgsc(&mut self) -> u32 {
        let otgsc = self.otgsc;
        self.otgsc &= !(0x7f << 16);
        otgsc
    }
}

/// Start (`true`) and stop (`false`) calls of a role stack.
pub type RoleCalls = Vec<bool>;

/// A dummy host stack.
pub struct DummyHost {
    pub fail: bool,
    pub calls: RoleCalls,
}

impl DummyHost {
    /// Create a new dummy host stack.
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: Vec::new(),
        }
    }
}

impl Host for DummyHost {
    async fn start(&mut self) -> Result<(), RoleError> {
        self.calls.push(true);

        if self.fail { Err(RoleError::Failed) } else { Ok(()) }
    }

    async fn stop(&mut self) {
        self.calls.push(false);
    }
}

/// A dummy gadget stack.
pub struct DummyGadget {
    /// Yield once while connecting, leaving the evaluation in flight.
    pub yield_on_connect: bool,
    pub calls: RoleCalls,
}

impl DummyGadget {
    /// Create a new dummy gadget stack.
    pub fn new() -> Self {
        Self {
            yield_on_connect: false,
            calls: Vec::new(),
        }
    }
}

impl Gadget for DummyGadget {
    async fn connect(&mut self) -> Result<(), RoleError> {
        self.calls.push(true);

        if self.yield_on_connect {
            yield_now().await;
        }

        Ok(())
    }

    async fn disconnect(&mut self) {
        self.calls.push(false);
    }
}

/// The interrupt view of a dummy controller.
pub struct DummyInterrupts {
    pub clocks_enabled: bool,
    pub otgsc: u32,
}

impl DummyInterrupts {
    /// Create a new dummy, with `otgsc` as register content.
    pub fn new(otgsc: u32) -> Self {
        Self {
            clocks_enabled: false,
            otgsc,
        }
    }
}

impl Interrupts for DummyInterrupts {
    fn enable_clocks(&mut self) {
        self.clocks_enabled = true;
    }

    fn read_and_clear_otgsc(&mut self) -> u32 {
        let otgsc = self.otgsc;
        // Write-one-to-clear of the interrupt status bits.
        self.otgsc &= !(0x7f << 16);
        otgsc
    }
}

/// Whether no stack was started or stopped twice in a row.
pub fn alternates(calls: &[bool]) -> bool {
    calls.windows(2).all(|pair| pair[0] != pair[1])
}

std::thread_local! {
    // Taken on first use, so that it follows a paused test clock.
    static EPOCH: tokio::time::Instant = tokio::time::Instant::now();
}

/// A timer that is backed by the tokio runtime.
pub struct TokioTimer {}

impl Timer for TokioTimer {
    async fn after_millis(milliseconds: u64) {
        tokio::time::sleep(std::time::Duration::from_millis(milliseconds)).await
    }

    fn now_millis() -> u64 {
        EPOCH.with(|epoch| epoch.elapsed().as_millis() as u64)
    }
}
