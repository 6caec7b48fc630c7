//! System-wide trigger key interception.
//!
//! The platform calls the installed filter synchronously for every key event
//! in the session, so the listener only classifies the event and pushes a
//! [`TriggerEvent`] onto a channel. Everything else happens on the
//! application's own threads.

use std::sync::mpsc::Sender;
use std::time::Instant;

use thiserror::Error;

mod key;
#[cfg(windows)]
mod win32;

pub use key::TriggerKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub at: Instant,
}

impl TriggerEvent {
    pub fn now() -> Self {
        Self { at: Instant::now() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub code: u32,
    pub transition: KeyTransition,
}

impl RawKeyEvent {
    pub const fn down(code: u32) -> Self {
        Self {
            code,
            transition: KeyTransition::Down,
        }
    }

    pub const fn up(code: u32) -> Self {
        Self {
            code,
            transition: KeyTransition::Up,
        }
    }
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("global keyboard hooks are not supported on this platform")]
    Unsupported,
    #[error("failed to resolve module handle for hook: {0}")]
    ModuleHandle(String),
    #[error("platform rejected keyboard hook: {0}")]
    Install(String),
    #[error("hook thread failed: {0}")]
    Thread(#[from] std::io::Error),
    #[error("hook thread exited before reporting installation")]
    ThreadExited,
}

/// Receives every raw key event seen by the system-wide hook.
///
/// Called on the platform's hook thread; implementations must return within
/// microseconds and must never block.
pub trait KeyListener: Send {
    fn on_key(&mut self, event: RawKeyEvent);
}

/// Reduces the raw key stream to genuine key-down transitions of one key.
///
/// Low-level hooks report auto-repeat as repeated key-downs, so a key-down is
/// only accepted when the key was not already held.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    trigger: TriggerKey,
    held: bool,
}

impl KeyFilter {
    pub const fn new(trigger: TriggerKey) -> Self {
        Self {
            trigger,
            held: false,
        }
    }

    pub fn accept(&mut self, event: RawKeyEvent) -> bool {
        if event.code != self.trigger.code() {
            return false;
        }

        match event.transition {
            KeyTransition::Down => !std::mem::replace(&mut self.held, true),
            KeyTransition::Up => {
                self.held = false;
                false
            }
        }
    }
}

/// Listener that forwards accepted trigger presses into a channel.
pub struct TriggerDispatcher {
    filter: KeyFilter,
    sink: Sender<TriggerEvent>,
}

impl TriggerDispatcher {
    pub fn new(trigger: TriggerKey, sink: Sender<TriggerEvent>) -> Self {
        Self {
            filter: KeyFilter::new(trigger),
            sink,
        }
    }
}

impl KeyListener for TriggerDispatcher {
    fn on_key(&mut self, event: RawKeyEvent) {
        if self.filter.accept(event) {
            // A closed receiver means the app is shutting down.
            let _ = self.sink.send(TriggerEvent::now());
        }
    }
}

/// Handle of an installed hook. Dropping it uninstalls the hook.
pub struct HotkeyInterceptor {
    trigger: TriggerKey,
    #[cfg(windows)]
    hook: Option<win32::HookThread>,
}

impl HotkeyInterceptor {
    pub fn start(trigger: TriggerKey, sink: Sender<TriggerEvent>) -> Result<Self, HookError> {
        let listener = TriggerDispatcher::new(trigger, sink);
        Self::start_with_listener(trigger, Box::new(listener))
    }

    #[cfg(windows)]
    pub fn start_with_listener(
        trigger: TriggerKey,
        listener: Box<dyn KeyListener>,
    ) -> Result<Self, HookError> {
        let hook = win32::install(listener)?;
        tracing::info!(key = %trigger, "installed low-level keyboard hook");
        Ok(Self {
            trigger,
            hook: Some(hook),
        })
    }

    #[cfg(not(windows))]
    pub fn start_with_listener(
        trigger: TriggerKey,
        listener: Box<dyn KeyListener>,
    ) -> Result<Self, HookError> {
        drop(listener);
        tracing::debug!(key = %trigger, "no keyboard hook backend for this platform");
        Err(HookError::Unsupported)
    }

    pub fn trigger(&self) -> TriggerKey {
        self.trigger
    }

    #[cfg(windows)]
    pub fn is_running(&self) -> bool {
        self.hook.is_some()
    }

    #[cfg(not(windows))]
    pub fn is_running(&self) -> bool {
        false
    }

    /// Uninstalls the hook. Safe to call more than once.
    pub fn stop(&mut self) {
        #[cfg(windows)]
        if let Some(hook) = self.hook.take() {
            hook.shutdown();
            tracing::info!(key = %self.trigger, "uninstalled low-level keyboard hook");
        }
    }
}

impl Drop for HotkeyInterceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const SPACE: u32 = 0x20;
    const LETTER_A: u32 = 0x41;

    #[test]
    fn key_filter_accepts_only_first_down_of_held_trigger() {
        let mut filter = KeyFilter::new(TriggerKey::SPACE);

        assert!(filter.accept(RawKeyEvent::down(SPACE)));
        assert!(!filter.accept(RawKeyEvent::down(SPACE)));
        assert!(!filter.accept(RawKeyEvent::down(SPACE)));
        assert!(!filter.accept(RawKeyEvent::up(SPACE)));
        assert!(filter.accept(RawKeyEvent::down(SPACE)));
    }

    #[test]
    fn key_filter_ignores_other_keys_without_resetting_hold() {
        let mut filter = KeyFilter::new(TriggerKey::SPACE);

        assert!(filter.accept(RawKeyEvent::down(SPACE)));
        assert!(!filter.accept(RawKeyEvent::down(LETTER_A)));
        assert!(!filter.accept(RawKeyEvent::up(LETTER_A)));
        assert!(!filter.accept(RawKeyEvent::down(SPACE)));
    }

    #[test]
    fn trigger_dispatcher_emits_one_event_per_physical_press() {
        let (tx, rx) = mpsc::channel();
        let mut dispatcher = TriggerDispatcher::new(TriggerKey::SPACE, tx);

        for event in [
            RawKeyEvent::down(SPACE),
            RawKeyEvent::down(SPACE),
            RawKeyEvent::up(SPACE),
            RawKeyEvent::down(LETTER_A),
            RawKeyEvent::down(SPACE),
            RawKeyEvent::up(SPACE),
        ] {
            dispatcher.on_key(event);
        }

        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn trigger_dispatcher_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut dispatcher = TriggerDispatcher::new(TriggerKey::SPACE, tx);
        dispatcher.on_key(RawKeyEvent::down(SPACE));
    }

    #[cfg(not(windows))]
    #[test]
    fn start_reports_unsupported_platform() {
        let (tx, _rx) = mpsc::channel();
        let err = HotkeyInterceptor::start(TriggerKey::SPACE, tx)
            .err()
            .expect("no hook backend off windows");
        assert!(matches!(err, HookError::Unsupported));
    }
}
