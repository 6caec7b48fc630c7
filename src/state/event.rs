use std::path::PathBuf;

use super::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Hotkey trigger resolved to a selected path.
    Trigger(PathBuf),
    /// Content for the path was attached to the surface.
    ContentAttached(PathBuf),
    Refresh,
    Dismiss,
    SurfaceFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<SessionState>,
    pub event: SessionEvent,
    pub to: SessionState,
}

impl StateTransition {
    pub fn new(from: Option<SessionState>, event: SessionEvent, to: SessionState) -> Self {
        Self { from, event, to }
    }
}
