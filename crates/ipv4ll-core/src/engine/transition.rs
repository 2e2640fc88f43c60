//! ACD event transition table
//!
//! ```text
//! ACD event   IPv4LL outcome      engine action
//! ---------   ----------------    -------------
//! Ready       Ready(address)      Remain
//! Defended    Defended(frame)     Remain
//! Conflict    Conflict(frame)     Reselect
//! Used        -                   Reselect
//! Down        Down                Halt
//! ```
//!
//! A failed `Reselect` is itself a transition: the outcome becomes `Down` and
//! the action `Halt` (see [`Transition::give_up`]).

use super::Ipv4llEvent;
use crate::traits::AcdEvent;
use std::net::Ipv4Addr;

/// What the engine does with its ACD run after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep the current run
    Remain,
    /// Stop the run, draw a new candidate and restart
    Reselect,
    /// End the run
    Halt,
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Event for the host, if any
    pub outcome: Option<Ipv4llEvent>,
    /// Follow-up on the ACD run
    pub action: Action,
}

impl Transition {
    /// Look up the row for `event` while `candidate` is being probed
    pub fn for_event(event: &AcdEvent, candidate: Ipv4Addr) -> Self {
        match *event {
            AcdEvent::Ready => Self {
                outcome: Some(Ipv4llEvent::Ready { address: candidate }),
                action: Action::Remain,
            },
            AcdEvent::Defended(frame) => Self {
                outcome: Some(Ipv4llEvent::Defended { frame }),
                action: Action::Remain,
            },
            AcdEvent::Conflict(frame) => Self {
                outcome: Some(Ipv4llEvent::Conflict { frame }),
                action: Action::Reselect,
            },
            AcdEvent::Used(_) => Self {
                outcome: None,
                action: Action::Reselect,
            },
            AcdEvent::Down => Self::give_up(),
        }
    }

    /// Row taken when the link is gone or a restart failed
    pub fn give_up() -> Self {
        Self {
            outcome: Some(Ipv4llEvent::Down),
            action: Action::Halt,
        }
    }
}
