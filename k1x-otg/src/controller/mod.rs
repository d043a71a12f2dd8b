//! The OTG controller: input sampling, the evaluation loop, and the actions of each transition.
use core::marker::PhantomData;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use k1x_otg_traits::{Driver, Gadget, Host};

use crate::Error;
use crate::config::{BConnPolicy, Config};
use crate::control::Role;
use crate::notifier::Notifier;
use crate::registers::Otgsc;
use crate::state::{OtgInputs, OtgState};
use crate::timers::{OtgTimer, Timer, TimerType};
use crate::work::Reason;

pub mod state_machine;


/// Upper bound of transitions in a single evaluation pass.
pub const MAX_TRANSITIONS: usize = 2 * OtgState::COUNT;

/// Upper bound of recorded actions in a single evaluation pass.
pub const MAX_ACTIONS: usize = 4 * MAX_TRANSITIONS;

/// A state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    /// The state that was left.
    pub from: OtgState,
    /// The state that was entered.
    pub to: OtgState,
}

/// A side effect of a transition.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    EnableClocks,
    DisableClocks,
    ResetController,
    /// Switch VBUS on (`true`) or off.
    Vbus(bool),
    StartHost,
    StopHost,
    ConnectGadget,
    DisconnectGadget,
    ArmTimer(TimerType),
    CancelTimer(TimerType),
}

/// Report of a single evaluation pass.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pass {
    /// Transitions in the order they were taken.
    pub transitions: heapless::Vec<Transition, MAX_TRANSITIONS>,
    /// Actions in the order they were performed. Failed actions are included.
    pub actions: heapless::Vec<Action, MAX_ACTIONS>,
}

impl Pass {
    fn record(&mut self, action: Action) {
        if self.actions.push(action).is_err() {
            warn!("Action log full, dropped {:?}", action);
        }
    }

    /// The state that the pass ended in, if any transition was taken.
    pub fn final_state(&self) -> Option<OtgState> {
        self.transitions.last().map(|transition| transition.to)
    }

    /// How often `action` was performed.
    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|a| **a == action).count()
    }

    /// Whether the pass went through `state`.
    pub fn visited(&self, state: OtgState) -> bool {
        self.transitions.iter().any(|transition| transition.to == state)
    }
}

/// The OTG role controller.
///
/// This is the only writer of the state. Run it with [`Otg::run`] on a dedicated task.
pub struct Otg<'a, M: RawMutex, DRIVER: Driver, HOST: Host, GADGET: Gadget, TIMER: Timer> {
    notifier: &'a Notifier<M>,
    driver: DRIVER,
    host: HOST,
    gadget: GADGET,
    config: Config,
    state: OtgState,
    inputs: OtgInputs,
    timer: OtgTimer,
    /// Whether this port currently defaults to the A-device role.
    default_a: bool,

    _timer: PhantomData<TIMER>,
}

impl<'a, M: RawMutex, DRIVER: Driver, HOST: Host, GADGET: Gadget, TIMER: Timer>
    Otg<'a, M, DRIVER, HOST, GADGET, TIMER>
{
    /// Create a new controller.
    ///
    /// Fails, if the platform cannot detect the cable state that the configured role needs.
    pub fn new(
        notifier: &'a Notifier<M>,
        driver: DRIVER,
        host: HOST,
        gadget: GADGET,
        config: Config,
    ) -> Result<Self, Error> {
        let capabilities = driver.capabilities();

        if config.role == Role::Otg {
            if !capabilities.vbus_detect && !capabilities.id_detect {
                error!("Neither VBUS nor ID detection available");
                return Err(Error::NoCableDetection);
            }

            if !capabilities.id_detect {
                error!("ID detection not available in OTG mode");
                return Err(Error::NoIdDetection);
            }
        }

        if !capabilities.vbus_detect {
            warn!("VBUS detection not available, session is treated as invalid");
        }

        notifier.configure(config.role, config.irq_enable);
        notifier.publish_state(OtgState::Undefined);

        Ok(Self {
            notifier,
            driver,
            host,
            gadget,
            config,
            state: OtgState::Undefined,
            inputs: OtgInputs::default(),
            timer: OtgTimer::new(TimerType::AWaitBcon),
            default_a: false,
            _timer: PhantomData,
        })
    }

    /// The current state.
    pub fn state(&self) -> OtgState {
        self.state
    }

    /// The input snapshot of the last pass.
    pub fn inputs(&self) -> &OtgInputs {
        &self.inputs
    }

    /// Whether the port currently defaults to the A-device role.
    pub fn default_a(&self) -> bool {
        self.default_a
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Take a fresh input snapshot.
    ///
    /// Cable states that were pushed through the notifier take precedence over reading them from
    /// the driver. Keeps the inputs that only the worker writes: the timeout flag, and `b_conn` when
    /// it is assumed rather than reported.
    fn sample(&mut self) -> Result<(), Error> {
        let capabilities = self.driver.capabilities();
        let control = self.notifier.control();
        let cables = self.notifier.cables();
        let otgsc = Otgsc(self.driver.read_otgsc());

        let id = match control.role {
            Role::Host => false,
            Role::Client => true,
            Role::Otg if capabilities.id_detect => match cables.host_cable {
                Some(attached) => !attached,
                None => !self.driver.host_cable().map_err(Error::Sample)?,
            },
            Role::Otg => return Err(Error::NoIdDetection),
        };

        let b_session_valid = match control.role {
            Role::Client => true,
            _ if capabilities.vbus_detect => match cables.vbus_session {
                Some(present) => present,
                None => self.driver.vbus_session().map_err(Error::Sample)?,
            },
            _ => false,
        };

        let b_conn = match self.config.b_conn {
            BConnPolicy::Assume => self.inputs.b_conn,
            BConnPolicy::Report => control.host_connected,
        };

        self.inputs = OtgInputs {
            id,
            b_session_valid,
            a_vbus_valid: control.role == Role::Host || otgsc.a_vbus_valid(),
            b_conn,
            a_bus_req: control.a_bus_req,
            a_bus_drop: control.a_bus_drop,
            a_clr_err: control.a_clr_err,
            a_wait_bcon_timeout: self.inputs.a_wait_bcon_timeout,
        };

        trace!("Inputs: {:?}", self.inputs);
        Ok(())
    }

    /// Handle an expiry of `timer_type`.
    ///
    /// The expiry only becomes an input, the next pass acts on it.
    fn handle_timeout(&mut self, timer_type: TimerType) {
        if self.state != timer_type.owner() || !self.timer.expire() {
            debug!("Ignoring stale {} timeout in {}", timer_type, self.state);
            return;
        }

        info!("No B-device connected within {} ms", timer_type.duration_ms(&self.config));
        self.inputs.a_wait_bcon_timeout = true;
    }

    /// Run a single evaluation pass.
    ///
    /// Samples the inputs once, then follows transitions until the state is stable.
    async fn run_step(&mut self) -> Result<Pass, Error> {
        self.sample()?;

        let mut pass = Pass::default();
        loop {
            let next = state_machine::next_state(self.state, &self.inputs);
            if next == self.state {
                break;
            }

            if pass.transitions.is_full() {
                warn!("State machine did not settle, stopping in {}", self.state);
                break;
            }

            self.transition(next, &mut pass).await;
        }

        self.notifier.publish_state(self.state);
        Ok(pass)
    }

    /// Perform the actions of a transition, then adopt the next state.
    ///
    /// Failed actions are logged, the transition is never rolled back.
    async fn transition(&mut self, next: OtgState, pass: &mut Pass) {
        let previous = self.state;
        info!("{} -> {}", previous, next);
        let _ = pass.transitions.push(Transition {
            from: previous,
            to: next,
        });

        if previous == OtgState::AWaitBcon {
            self.timer.cancel();
            self.inputs.a_wait_bcon_timeout = false;
            pass.record(Action::CancelTimer(TimerType::AWaitBcon));
        }

        match next {
            OtgState::BIdle => {
                self.default_a = false;

                if matches!(previous, OtgState::BPeripheral | OtgState::Undefined) {
                    self.gadget.disconnect().await;
                    pass.record(Action::DisconnectGadget);
                    self.enable_clocks(pass);
                    self.reset_controller(pass).await;

                    if self.config.clock_gating {
                        self.driver.disable_clocks();
                        pass.record(Action::DisableClocks);
                    }
                }
            }
            OtgState::BPeripheral => {
                self.enable_clocks(pass);

                if let Err(error) = self.gadget.connect().await {
                    error!("Failed to connect gadget: {:?}", error);
                }
                pass.record(Action::ConnectGadget);
            }
            OtgState::AIdle => {
                self.default_a = true;
                self.enable_clocks(pass);

                if previous == OtgState::AWaitVfall {
                    self.host.stop().await;
                    pass.record(Action::StopHost);

                    if self.config.b_conn == BConnPolicy::Report {
                        self.notifier.clear_host_connected();
                    }
                }

                self.reset_controller(pass).await;
            }
            OtgState::AWaitVrise => self.set_vbus(true, pass).await,
            OtgState::AWaitBcon => {
                if previous != OtgState::AHost {
                    if let Err(error) = self.host.start().await {
                        error!("Failed to start host: {:?}", error);
                    }
                    pass.record(Action::StartHost);
                }

                match self.timer.arm::<TIMER>(TimerType::AWaitBcon.duration_ms(&self.config)) {
                    Ok(()) => pass.record(Action::ArmTimer(TimerType::AWaitBcon)),
                    Err(error) => error!("{:?}", error),
                }

                // The host stack does not report connections, assume that one happens right away.
                if self.config.b_conn == BConnPolicy::Assume {
                    self.inputs.b_conn = true;
                }
            }
            OtgState::AWaitVfall => {
                self.inputs.b_conn = false;
                self.set_vbus(false, pass).await;
            }
            _ => (),
        }

        self.state = next;
    }

    fn enable_clocks(&mut self, pass: &mut Pass) {
        if let Err(error) = self.driver.enable_clocks() {
            error!("Failed to enable clocks: {:?}", error);
        }
        pass.record(Action::EnableClocks);
    }

    /// Reset the controller. The clocks must be enabled, registers are not accessible while gated.
    async fn reset_controller(&mut self, pass: &mut Pass) {
        if let Err(error) = self.driver.reset_controller().await {
            error!("Failed to reset controller: {:?}", error);
        }
        pass.record(Action::ResetController);
    }

    async fn set_vbus(&mut self, on: bool, pass: &mut Pass) {
        if let Err(error) = self.driver.set_vbus(on).await {
            error!("Failed to switch VBUS {}: {:?}", if on { "on" } else { "off" }, error);
        }
        self.driver.hold_wakeup(on);
        pass.record(Action::Vbus(on));
    }

    /// Run the controller continuously.
    ///
    /// Waits out the startup delay, then evaluates whenever an evaluation is requested or the
    /// timer expires. Evaluation errors are logged, and the loop continues.
    pub async fn run(&mut self) {
        self.notifier
            .request_evaluation(self.config.startup_delay_ms, Reason::Startup);

        loop {
            let event = select(self.notifier.wait(), self.timer.wait::<TIMER>()).await;

            match event {
                Either::First(request) => {
                    trace!("Evaluation requested: {:?}", request);

                    if request.delay_ms > 0 {
                        TIMER::after_millis(request.delay_ms).await;
                    }
                }
                Either::Second(timer_type) => self.handle_timeout(timer_type),
            }

            match self.run_step().await {
                Ok(pass) => trace!("Pass: {:?}", pass),
                Err(error) => error!("Evaluation failed in {}: {:?}", self.state, error),
            }
        }
    }
}
