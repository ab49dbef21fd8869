//! Property tests over the transition table and polling math.

use proptest::prelude::*;
use steward::{OrchestratorConfig, TaskPriority, TaskRecord, TaskState};

const ALL_STATES: [TaskState; 8] = [
    TaskState::Undefined,
    TaskState::Defined,
    TaskState::Delegated,
    TaskState::Accepted,
    TaskState::InProgress,
    TaskState::Completed,
    TaskState::Error,
    TaskState::Escalated,
];

fn any_state() -> impl Strategy<Value = TaskState> {
    prop::sample::select(ALL_STATES.to_vec())
}

proptest! {
    #[test]
    fn transition_check_agrees_with_table(from in any_state(), to in any_state()) {
        let allowed = from.valid_transitions().contains(&to);
        prop_assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions(to in any_state()) {
        for terminal in [TaskState::Completed, TaskState::Error, TaskState::Escalated] {
            prop_assert!(!terminal.can_transition_to(to));
        }
    }

    #[test]
    fn no_transition_is_a_self_loop(state in any_state()) {
        prop_assert!(!state.can_transition_to(state));
    }

    #[test]
    fn rejected_transitions_leave_record_unchanged(from in any_state(), to in any_state()) {
        let mut record = TaskRecord::new("T1", "agent", "/tmp/t.md", TaskPriority::Medium);
        record.state = from;
        record.check_attempts = 4;

        let result = record.transition_to(to);
        if from.valid_transitions().contains(&to) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(record.state, to);
            // Forward movement resets the polling window.
            prop_assert_eq!(record.check_attempts, 0);
            prop_assert!(record.next_check_at.is_none());
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(record.state, from);
            prop_assert_eq!(record.check_attempts, 4);
        }
    }

    #[test]
    fn state_names_round_trip(state in any_state()) {
        prop_assert_eq!(TaskState::from_str(state.as_str()), Some(state));
    }

    #[test]
    fn wait_is_monotone_and_capped(
        initial in 1u64..3600,
        factor in 1.0f64..4.0,
        max in 1u64..86_400,
        attempts in 0u32..64,
    ) {
        let config = OrchestratorConfig {
            initial_check_wait_secs: initial,
            backoff_factor: factor,
            max_check_wait_secs: max,
            ..OrchestratorConfig::default()
        };

        let wait = steward::services::polling::compute_wait_secs(&config, attempts);
        prop_assert!(wait <= max);

        let next = steward::services::polling::compute_wait_secs(&config, attempts + 1);
        prop_assert!(next >= wait);
    }
}
