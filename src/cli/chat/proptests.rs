//! Property-based tests for the conversation store
//!
//! Arbitrary interleavings of submit, settle and draft edits must keep the
//! transcript append-only and the in-flight flag in step with it.

use proptest::prelude::*;

use super::conversation_state::{ConversationState, Message, Sender};
use crate::response_gateway::{ExchangeOutcome, FailureKind};

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Settle(ExchangeOutcome),
    Draft(String),
}

fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::HttpStatus),
        Just(FailureKind::Network),
        Just(FailureKind::MalformedPayload),
    ]
}

fn arb_outcome() -> impl Strategy<Value = ExchangeOutcome> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(ExchangeOutcome::Success),
        (arb_failure_kind(), "[a-zA-Z ]{0,20}")
            .prop_map(|(kind, detail)| ExchangeOutcome::failure(kind, detail)),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[ a-z]{0,12}".prop_map(Op::Submit),
        arb_outcome().prop_map(Op::Settle),
        "[ a-z]{0,12}".prop_map(Op::Draft),
    ]
}

proptest! {
    #[test]
    fn transcript_is_append_only(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut state = ConversationState::new("hey");

        for op in ops {
            let before: Vec<Message> = state.messages().to_vec();
            let was_pending = state.is_pending();
            let draft_before = state.draft().to_string();

            match op {
                Op::Submit(text) => {
                    let accepted = state.submit(&text);
                    if was_pending || text.trim().is_empty() {
                        prop_assert!(accepted.is_none());
                        prop_assert_eq!(state.messages(), before.as_slice());
                        prop_assert_eq!(state.is_pending(), was_pending);
                        prop_assert_eq!(state.draft(), draft_before.as_str());
                    } else {
                        prop_assert_eq!(accepted.as_deref(), Some(text.trim()));
                        prop_assert_eq!(state.messages().len(), before.len() + 1);
                        let last = state.messages().last().unwrap();
                        prop_assert_eq!(last.sender(), Sender::User);
                        prop_assert_eq!(last.text(), text.trim());
                        prop_assert!(state.is_pending());
                        prop_assert_eq!(state.draft(), "");
                    }
                }
                Op::Settle(outcome) => {
                    let reply = state.settle(outcome);
                    prop_assert_eq!(reply.sender(), Sender::Agent);
                    prop_assert!(!reply.text().trim().is_empty());
                    prop_assert_eq!(state.messages().len(), before.len() + 1);
                    prop_assert!(!state.is_pending());
                }
                Op::Draft(text) => {
                    state.update_draft(text.clone());
                    prop_assert_eq!(state.draft(), text.as_str());
                    prop_assert_eq!(state.messages(), before.as_slice());
                    prop_assert_eq!(state.is_pending(), was_pending);
                }
            }

            prop_assert_eq!(&state.messages()[..before.len()], before.as_slice());
        }

        prop_assert_eq!(state.messages()[0].text(), "hey");
    }

    #[test]
    fn every_accepted_submit_gets_exactly_one_reply(
        turns in prop::collection::vec(("[a-z]{1,10}", arb_outcome()), 1..15)
    ) {
        let mut state = ConversationState::new("hey");

        for (text, outcome) in &turns {
            prop_assert!(state.submit(text).is_some());
            prop_assert!(state.submit("again").is_none());
            state.settle(outcome.clone());
        }

        let messages = state.messages();
        prop_assert_eq!(messages.len(), 1 + 2 * turns.len());
        for pair in messages[1..].chunks(2) {
            prop_assert_eq!(pair[0].sender(), Sender::User);
            prop_assert_eq!(pair[1].sender(), Sender::Agent);
        }
    }
}
