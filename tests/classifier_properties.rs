use std::io;

use proptest::prelude::*;
use plugin_exec::cancel::CancelState;
use plugin_exec::errors::ExecError;
use plugin_exec::exec::{
    ExitInput, GuardOutcome, STOPPED_PREEMPTIVELY_EXIT_CODE, WaitOutcome, classify,
};

// Outcomes are rebuilt from a tag because io::Error is not Clone.
fn guard(tag: u8) -> GuardOutcome {
    match tag % 5 {
        0 => GuardOutcome::Idle,
        1 => GuardOutcome::RaceLost,
        2 => GuardOutcome::Killed { interrupted: false },
        3 => GuardOutcome::Killed { interrupted: true },
        _ => GuardOutcome::KillFailed(io::Error::from(io::ErrorKind::PermissionDenied)),
    }
}

fn flag_strategy() -> impl Strategy<Value = CancelState> {
    prop_oneof![
        Just(CancelState::Running),
        Just(CancelState::Canceled),
        Just(CancelState::ShutDown),
    ]
}

fn terminated_count(errors: &[ExecError]) -> usize {
    errors
        .iter()
        .filter(|e| matches!(e, ExecError::Terminated(_)))
        .count()
}

proptest! {
    #[test]
    fn natural_exit_without_guards_keeps_code(code in 1..=125i32, flag in flag_strategy()) {
        let res = classify(ExitInput {
            wait: WaitOutcome::Exited { success: false, code: Some(code) },
            cancel: GuardOutcome::Idle,
            timeout: GuardOutcome::Idle,
            flag,
        });
        prop_assert_eq!(res.exit_code, code);
        prop_assert!(res.errors.is_empty());
    }

    #[test]
    fn clean_exit_without_a_landed_kill_stays_zero(
        cancel in prop_oneof![Just(0u8), Just(1u8), Just(4u8)],
        timeout in prop_oneof![Just(0u8), Just(1u8), Just(4u8)],
        flag in flag_strategy(),
    ) {
        let res = classify(ExitInput {
            wait: WaitOutcome::Exited { success: true, code: Some(0) },
            cancel: guard(cancel),
            timeout: guard(timeout),
            flag,
        });
        prop_assert_eq!(res.exit_code, 0);
        prop_assert_eq!(terminated_count(&res.errors), 0);
    }

    #[test]
    fn landed_kill_is_the_sentinel_whatever_the_leader_status(
        code in prop_oneof![Just(None), (0..=125i32).prop_map(Some)],
        cancel in 0..5u8,
        timeout in 0..5u8,
    ) {
        let (cancel, timeout) = (guard(cancel), guard(timeout));
        prop_assume!(cancel.killed() || timeout.killed());

        let res = classify(ExitInput {
            wait: WaitOutcome::Exited { success: code == Some(0), code },
            cancel,
            timeout,
            flag: CancelState::Running,
        });
        prop_assert_eq!(res.exit_code, STOPPED_PREEMPTIVELY_EXIT_CODE);
        prop_assert_eq!(terminated_count(&res.errors), 1);
    }

    #[test]
    fn signal_kill_after_a_guard_fired_is_the_sentinel(
        cancel in 0..5u8,
        timeout in 0..5u8,
        flag in flag_strategy(),
    ) {
        let (cancel, timeout) = (guard(cancel), guard(timeout));
        prop_assume!(cancel.fired() || timeout.fired());

        let res = classify(ExitInput {
            wait: WaitOutcome::Exited { success: false, code: None },
            cancel,
            timeout,
            flag,
        });
        prop_assert_eq!(res.exit_code, STOPPED_PREEMPTIVELY_EXIT_CODE);
        prop_assert_eq!(terminated_count(&res.errors), 1);
    }

    #[test]
    fn natural_nonzero_exit_wins_when_no_kill_landed(
        code in 1..=125i32,
        cancel in prop_oneof![Just(0u8), Just(1u8), Just(4u8)],
        timeout in prop_oneof![Just(0u8), Just(1u8), Just(4u8)],
    ) {
        // Idle, RaceLost and KillFailed never reached a live process.
        let res = classify(ExitInput {
            wait: WaitOutcome::Exited { success: false, code: Some(code) },
            cancel: guard(cancel),
            timeout: guard(timeout),
            flag: CancelState::Canceled,
        });
        prop_assert_eq!(res.exit_code, code);
        prop_assert_eq!(terminated_count(&res.errors), 0);
    }

    #[test]
    fn kill_failures_are_each_reported(cancel in 0..5u8, timeout in 0..5u8, code in 1..=125i32) {
        let expected = usize::from(cancel == 4) + usize::from(timeout == 4);
        let res = classify(ExitInput {
            wait: WaitOutcome::Exited { success: false, code: Some(code) },
            cancel: guard(cancel),
            timeout: guard(timeout),
            flag: CancelState::Running,
        });
        let kill_errors = res
            .errors
            .iter()
            .filter(|e| matches!(e, ExecError::Kill { .. }))
            .count();
        prop_assert_eq!(kill_errors, expected);
    }
}
