//! Oracle helpers.
//!
//! Each helper checks one property of the final [`World`] and explains the
//! mismatch when it fails. Compose them with [`all_of`].

use aci_proto::Function;

use crate::scenario::{OracleFn, World};

/// Every oracle must pass; the first failure is reported.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world: &World| oracles.iter().try_for_each(|oracle| oracle(world)))
}

/// The script returned without error.
pub fn succeeded() -> OracleFn {
    Box::new(|world: &World| match world.failure() {
        None => Ok(()),
        Some(err) => Err(format!("script failed: {err}")),
    })
}

/// The script failed with an error whose message contains `needle`.
pub fn failed_with(needle: &'static str) -> OracleFn {
    Box::new(move |world: &World| match world.failure() {
        Some(err) if err.to_string().contains(needle) => Ok(()),
        Some(err) => Err(format!("expected failure containing {needle:?}, got {err}")),
        None => Err(format!("expected failure containing {needle:?}, script succeeded")),
    })
}

/// Exactly `expected` records were read.
pub fn records_read(expected: usize) -> OracleFn {
    Box::new(move |world: &World| {
        let read = world.records().len();
        if read == expected { Ok(()) } else { Err(format!("read {read} records, expected {expected}")) }
    })
}

/// Exactly `expected` RECEIVE calls reached the kernel.
pub fn follow_up_receives(expected: usize) -> OracleFn {
    calls(Function::Receive, expected)
}

/// Exactly `expected` calls of `function` reached the kernel.
pub fn calls(function: Function, expected: usize) -> OracleFn {
    Box::new(move |world: &World| {
        let seen = world.kernel().count(function);
        if seen == expected { Ok(()) } else { Err(format!("{seen} {function} calls, expected {expected}")) }
    })
}

/// Exactly `expected` conversations were ended.
pub fn conversations_ended(expected: usize) -> OracleFn {
    Box::new(move |world: &World| {
        let ended = world.kernel().ended_conversations().len();
        if ended == expected { Ok(()) } else { Err(format!("{ended} conversations ended, expected {expected}")) }
    })
}

/// No conversation is left open in the kernel.
pub fn no_open_conversations() -> OracleFn {
    Box::new(|world: &World| {
        let open = world.kernel().open_conversations();
        if open.is_empty() { Ok(()) } else { Err(format!("conversations left open: {open:?}")) }
    })
}

/// The session logged off cleanly.
pub fn logged_off() -> OracleFn {
    Box::new(|world: &World| {
        if let Some(err) = world.close_failure() {
            return Err(format!("logoff failed: {err}"));
        }
        if world.kernel().is_logged_on() { Err("session still logged on".to_owned()) } else { Ok(()) }
    })
}
