//! Unit-of-work reset after commit, backout and end of conversation.

use std::sync::Arc;

use aci_core::{Broker, SessionConfig, Transport};
use aci_harness::SimKernel;
use aci_proto::{AciOption, UowStatus, control_block::CONV_NEW};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Send,
    SendCommit,
    SendEoc,
    Commit,
    Backout,
    CommitEndConversation,
}

impl Op {
    const fn resets_uow(self) -> bool {
        !matches!(self, Self::Send)
    }

    const fn ends_conversation(self) -> bool {
        matches!(self, Self::SendEoc | Self::CommitEndConversation)
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Send),
        Just(Op::SendCommit),
        Just(Op::SendEoc),
        Just(Op::Commit),
        Just(Op::Backout),
        Just(Op::CommitEndConversation),
    ]
}

/// Options are sticky, so plain sends clear the previous one first.
fn apply(broker: &mut Broker, op: Op) -> aci_core::Result<()> {
    if broker.conv_id().is_empty() {
        broker.control_block_mut().set_option(None)?;
        broker.send(Some(CONV_NEW), None)?;
    }
    match op {
        Op::Send => {
            broker.control_block_mut().set_option(None)?;
            broker.send(None, None)
        },
        Op::SendCommit => broker.send(None, Some(AciOption::Commit)),
        Op::SendEoc => broker.send(None, Some(AciOption::Eoc)),
        Op::Commit => broker.commit(),
        Op::Backout => broker.backout(),
        Op::CommitEndConversation => broker.commit_end_conversation(),
    }
}

proptest! {
    #[test]
    fn terminal_operations_reset_the_uow(ops in prop::collection::vec(op(), 1..20)) {
        let kernel = Arc::new(SimKernel::new());
        let transport: Arc<dyn Transport> = kernel.clone();
        let config = SessionConfig { api_version: 10, ..SessionConfig::default() };
        let mut broker = Broker::new(&config, transport).unwrap();
        broker.set_service("ACLASS", "ASERVER", "ASERVICE").unwrap();

        for op in ops {
            let conv_before = broker.conv_id();
            apply(&mut broker, op).unwrap();

            if op.resets_uow() {
                prop_assert_eq!(broker.uow_id(), "");
                prop_assert_eq!(broker.uow_status(), UowStatus::RecvNone);
            } else {
                prop_assert!(!broker.uow_id().is_empty());
            }
            if op.ends_conversation() {
                prop_assert_eq!(broker.conv_id(), "");
            } else if !conv_before.is_empty() {
                prop_assert_eq!(broker.conv_id(), conv_before);
            }
        }
        prop_assert!(kernel.open_conversations().len() <= 1);
    }
}
