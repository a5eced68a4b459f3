//! The session lifecycle state machine (§4.2).
//!
//! ```text
//! initializing --hello--> idle
//! idle --user_message--> busy
//! busy --model_finish--> idle
//! busy --cancel--> cancelling
//! cancelling --model_abort--> idle
//! idle|busy|cancelling --close--> closed
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Idle,
    Busy,
    Cancelling,
    Closed,
}

/// An event that may drive a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Hello,
    UserMessage,
    ModelFinish,
    Cancel,
    ModelAbort,
    Close,
}

impl LifecycleState {
    /// Apply `event`, returning the next state, or `None` if the event is
    /// not a valid transition from the current state.
    ///
    /// An idle `cancel` is explicitly a no-op per §4.2, not a rejected
    /// transition: callers should check `is_idle()` rather than treat a
    /// `None` here as an error in that case.
    pub const fn transition(self, event: LifecycleEvent) -> Option<Self> {
        use LifecycleEvent as E;
        use LifecycleState as S;
        match (self, event) {
            (S::Initializing, E::Hello) => Some(S::Idle),
            (S::Idle, E::UserMessage) => Some(S::Busy),
            (S::Busy, E::ModelFinish) => Some(S::Idle),
            (S::Busy, E::Cancel) => Some(S::Cancelling),
            (S::Cancelling, E::ModelAbort) => Some(S::Idle),
            (S::Idle | S::Busy | S::Cancelling, E::Close) => Some(S::Closed),
            _ => None,
        }
    }

    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Busy)
    }

    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_cancel_is_not_a_transition() {
        assert_eq!(LifecycleState::Idle.transition(LifecycleEvent::Cancel), None);
    }

    #[test]
    fn full_turn_cycle() {
        let s = LifecycleState::Initializing;
        let s = s.transition(LifecycleEvent::Hello).unwrap();
        assert!(s.is_idle());
        let s = s.transition(LifecycleEvent::UserMessage).unwrap();
        assert!(s.is_busy());
        let s = s.transition(LifecycleEvent::Cancel).unwrap();
        assert_eq!(s, LifecycleState::Cancelling);
        let s = s.transition(LifecycleEvent::ModelAbort).unwrap();
        assert!(s.is_idle());
    }

    #[test]
    fn close_reachable_from_any_open_state() {
        for state in [
            LifecycleState::Idle,
            LifecycleState::Busy,
            LifecycleState::Cancelling,
        ] {
            assert_eq!(state.transition(LifecycleEvent::Close), Some(LifecycleState::Closed));
        }
    }
}
