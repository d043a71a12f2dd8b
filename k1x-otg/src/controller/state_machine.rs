//! The transition function.
//!
//! Pure: it only looks at the current state and the input snapshot. Conditions of a state are
//! checked in order, the first one that holds selects the next state.
use crate::state::{OtgInputs, OtgState};

/// Compute the next state. Returns `state` itself, if no transition applies.
pub fn next_state(state: OtgState, inputs: &OtgInputs) -> OtgState {
    match state {
        OtgState::Undefined => OtgState::BIdle,
        OtgState::BIdle => {
            if !inputs.id {
                OtgState::AIdle
            } else if inputs.b_session_valid {
                OtgState::BPeripheral
            } else {
                state
            }
        }
        OtgState::BPeripheral => {
            if !inputs.b_session_valid || !inputs.id {
                OtgState::BIdle
            } else {
                state
            }
        }
        OtgState::AIdle => {
            if inputs.id {
                OtgState::BIdle
            } else {
                OtgState::AWaitVrise
            }
        }
        OtgState::AWaitVrise => {
            if inputs.a_vbus_valid {
                OtgState::AWaitBcon
            } else {
                state
            }
        }
        OtgState::AWaitBcon => {
            if inputs.id || inputs.a_wait_bcon_timeout {
                OtgState::AWaitVfall
            } else if inputs.b_conn {
                OtgState::AHost
            } else {
                state
            }
        }
        OtgState::AHost => {
            if inputs.id || !inputs.b_conn {
                OtgState::AWaitBcon
            } else if !inputs.a_vbus_valid {
                OtgState::AVbusErr
            } else {
                state
            }
        }
        OtgState::AWaitVfall => {
            if inputs.id || !inputs.b_conn {
                OtgState::AIdle
            } else {
                state
            }
        }
        OtgState::AVbusErr => {
            if inputs.id {
                OtgState::AWaitVfall
            } else {
                state
            }
        }
        // Session request, HNP and suspend are not driven by this controller.
        OtgState::BSrpInit
        | OtgState::BWaitAcon
        | OtgState::BHost
        | OtgState::ASuspend
        | OtgState::APeripheral => state,
    }
}

#[cfg(test)]
mod tests {
    use super::next_state;
    use crate::state::{OtgInputs, OtgState};

    type Condition = fn(&OtgInputs) -> bool;

    /// The transition table, row by row.
    const TABLE: &[(OtgState, Condition, OtgState)] = &[
        (OtgState::Undefined, |_| true, OtgState::BIdle),
        (OtgState::BIdle, |i| !i.id, OtgState::AIdle),
        (OtgState::BIdle, |i| i.id && i.b_session_valid, OtgState::BPeripheral),
        (OtgState::BPeripheral, |i| !i.b_session_valid || !i.id, OtgState::BIdle),
        (OtgState::AIdle, |i| i.id, OtgState::BIdle),
        (OtgState::AIdle, |i| !i.id, OtgState::AWaitVrise),
        (OtgState::AWaitVrise, |i| i.a_vbus_valid, OtgState::AWaitBcon),
        (OtgState::AWaitBcon, |i| i.id || i.a_wait_bcon_timeout, OtgState::AWaitVfall),
        (OtgState::AWaitBcon, |i| i.b_conn, OtgState::AHost),
        (OtgState::AHost, |i| i.id || !i.b_conn, OtgState::AWaitBcon),
        (OtgState::AHost, |i| !i.a_vbus_valid, OtgState::AVbusErr),
        (OtgState::AWaitVfall, |i| i.id || !i.b_conn, OtgState::AIdle),
        (OtgState::AVbusErr, |i| i.id, OtgState::AWaitVfall),
    ];

    /// All combinations of the inputs that the table looks at, with the user requests varied alongside.
    fn input_vectors() -> impl Iterator<Item = OtgInputs> {
        (0u8..64).map(|bits| OtgInputs {
            id: bits & 1 != 0,
            b_session_valid: bits & 2 != 0,
            a_vbus_valid: bits & 4 != 0,
            b_conn: bits & 8 != 0,
            a_wait_bcon_timeout: bits & 16 != 0,
            a_bus_req: bits & 32 != 0,
            a_bus_drop: bits & 32 == 0,
            a_clr_err: bits & 3 == 3,
        })
    }

    #[test]
    fn test_table_conformance() {
        for state in OtgState::ALL {
            for inputs in input_vectors() {
                let expected = TABLE
                    .iter()
                    .find(|(from, condition, _)| *from == state && condition(&inputs))
                    .map_or(state, |(_, _, to)| *to);

                assert_eq!(next_state(state, &inputs), expected, "{state} with {inputs:?}");
            }
        }
    }

    #[test]
    fn test_user_requests_are_ignored() {
        let inputs = OtgInputs {
            id: true,
            ..Default::default()
        };
        let requests = OtgInputs {
            a_bus_req: true,
            a_bus_drop: true,
            a_clr_err: true,
            ..inputs
        };

        for state in OtgState::ALL {
            assert_eq!(next_state(state, &inputs), next_state(state, &requests));
        }
    }

    #[test]
    fn test_unmanaged_states_stay() {
        for state in [
            OtgState::BSrpInit,
            OtgState::BWaitAcon,
            OtgState::BHost,
            OtgState::ASuspend,
            OtgState::APeripheral,
        ] {
            for inputs in input_vectors() {
                assert_eq!(next_state(state, &inputs), state);
            }
        }
    }

    #[test]
    fn test_vbus_error_needs_cable_removal() {
        let inputs = OtgInputs {
            a_vbus_valid: true,
            b_conn: true,
            a_clr_err: true,
            ..Default::default()
        };

        assert_eq!(next_state(OtgState::AVbusErr, &inputs), OtgState::AVbusErr);
        assert_eq!(
            next_state(OtgState::AVbusErr, &OtgInputs { id: true, ..inputs }),
            OtgState::AWaitVfall
        );
    }
}
