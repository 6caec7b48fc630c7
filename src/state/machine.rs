use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionState, StateTransition};

const HISTORY_LIMIT: usize = 64;

#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    transition_history: Vec<StateTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn can_transition(&self, event: &SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: &SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (&self.state, event) {
            (SessionState::Hidden, Trigger(path)) => Some(SessionState::Loading(path.clone())),
            (SessionState::Loading(current) | SessionState::Shown(current), Trigger(path)) => {
                if current == path {
                    Some(SessionState::Hidden)
                } else {
                    Some(SessionState::Loading(path.clone()))
                }
            }
            (SessionState::Loading(current), ContentAttached(path)) if current == path => {
                Some(SessionState::Shown(path.clone()))
            }
            (SessionState::Shown(current), Refresh) => Some(SessionState::Loading(current.clone())),
            (SessionState::Loading(_) | SessionState::Shown(_), Dismiss) => {
                Some(SessionState::Hidden)
            }
            (_, SurfaceFailed) => Some(SessionState::Hidden),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<&SessionState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let Some(next) = self.next_state(&event) else {
            let from = self.state.clone();
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            return Err(StateError::InvalidStateTransition { from, event });
        };

        let from = std::mem::replace(&mut self.state, next.clone());
        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.remove(0);
        }
        self.transition_history
            .push(StateTransition::new(Some(from), event, next));

        Ok(&self.state)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn trigger_from_hidden_starts_loading() {
        let mut machine = SessionMachine::new();
        let state = machine
            .transition(SessionEvent::Trigger(p("a.txt")))
            .expect("hidden -> loading");
        assert_eq!(state, &SessionState::Loading(p("a.txt")));
    }

    #[test]
    fn same_path_trigger_toggles_off_from_loading_and_shown() {
        let mut machine = SessionMachine::new();
        machine.transition(SessionEvent::Trigger(p("a"))).expect("load");
        machine.transition(SessionEvent::Trigger(p("a"))).expect("toggle off");
        assert_eq!(machine.state(), &SessionState::Hidden);

        machine.transition(SessionEvent::Trigger(p("a"))).expect("load");
        machine
            .transition(SessionEvent::ContentAttached(p("a")))
            .expect("shown");
        machine.transition(SessionEvent::Trigger(p("a"))).expect("toggle off");
        assert_eq!(machine.state(), &SessionState::Hidden);
    }

    #[test]
    fn different_path_retargets_without_hiding() {
        let mut machine = SessionMachine::new();
        machine.transition(SessionEvent::Trigger(p("a"))).expect("load");
        machine
            .transition(SessionEvent::ContentAttached(p("a")))
            .expect("shown");
        machine.transition(SessionEvent::Trigger(p("b"))).expect("retarget");
        assert_eq!(machine.state(), &SessionState::Loading(p("b")));
    }

    #[test]
    fn stale_attachment_is_rejected_without_mutating_history() {
        let mut machine = SessionMachine::new();
        machine.transition(SessionEvent::Trigger(p("a"))).expect("load a");
        machine.transition(SessionEvent::Trigger(p("b"))).expect("load b");
        let recorded = machine.history().len();

        let err = machine
            .transition(SessionEvent::ContentAttached(p("a")))
            .expect_err("a is stale");
        assert!(matches!(err, StateError::InvalidStateTransition { .. }));
        assert_eq!(machine.state(), &SessionState::Loading(p("b")));
        assert_eq!(machine.history().len(), recorded);
    }

    #[test]
    fn dismiss_and_refresh_follow_the_table() {
        let mut machine = SessionMachine::new();
        assert!(!machine.can_transition(&SessionEvent::Dismiss));
        assert!(!machine.can_transition(&SessionEvent::Refresh));

        machine.transition(SessionEvent::Trigger(p("a"))).expect("load");
        assert!(!machine.can_transition(&SessionEvent::Refresh));
        machine
            .transition(SessionEvent::ContentAttached(p("a")))
            .expect("shown");
        machine.transition(SessionEvent::Refresh).expect("refresh");
        assert_eq!(machine.state(), &SessionState::Loading(p("a")));

        machine.transition(SessionEvent::Dismiss).expect("dismiss");
        assert_eq!(machine.state(), &SessionState::Hidden);
    }

    #[test]
    fn surface_failure_always_hides() {
        let mut machine = SessionMachine::new();
        machine.transition(SessionEvent::SurfaceFailed).expect("hidden stays hidden");
        machine.transition(SessionEvent::Trigger(p("a"))).expect("load");
        machine.transition(SessionEvent::SurfaceFailed).expect("forced hide");
        assert_eq!(machine.state(), &SessionState::Hidden);
    }

    #[test]
    fn history_records_ordered_entries_and_stays_bounded() {
        let mut machine = SessionMachine::new();
        machine.transition(SessionEvent::Trigger(p("a"))).expect("load");
        machine
            .transition(SessionEvent::ContentAttached(p("a")))
            .expect("shown");
        assert_eq!(
            machine.history(),
            &[
                StateTransition::new(
                    Some(SessionState::Hidden),
                    SessionEvent::Trigger(p("a")),
                    SessionState::Loading(p("a"))
                ),
                StateTransition::new(
                    Some(SessionState::Loading(p("a"))),
                    SessionEvent::ContentAttached(p("a")),
                    SessionState::Shown(p("a"))
                ),
            ]
        );

        for _ in 0..HISTORY_LIMIT {
            machine.transition(SessionEvent::SurfaceFailed).expect("hide");
        }
        assert_eq!(machine.history().len(), HISTORY_LIMIT);
        assert_eq!(machine.to_string(), "SessionState::Hidden");
    }
}
