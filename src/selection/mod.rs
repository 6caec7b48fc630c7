//! Resolves the file currently selected in the foreground file-manager window.
//!
//! The foreign automation surface is modelled as a chain of typed capability
//! probes. Each step answers `Supported(handle)`, `Unsupported`, or fails with
//! a [`ProbeError`]; a failure on one window never stops the scan of the
//! others.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use thiserror::Error;

#[cfg(windows)]
mod win32;

#[cfg(windows)]
pub use win32::ShellWindowsConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Outcome of asking a foreign object for one capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Supported(T),
    Unsupported,
}

impl<T> Probe<T> {
    pub fn supported(self) -> Option<T> {
        match self {
            Self::Supported(value) => Some(value),
            Self::Unsupported => None,
        }
    }
}

impl<T> From<Option<T>> for Probe<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unsupported, Self::Supported)
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{operation} failed: {message}")]
    Call {
        operation: &'static str,
        message: String,
    },
    #[error("shell automation unavailable: {0}")]
    Unavailable(String),
}

impl ProbeError {
    pub fn call(operation: &'static str, message: impl ToString) -> Self {
        Self::Call {
            operation,
            message: message.to_string(),
        }
    }
}

pub type ProbeResult<T> = Result<Probe<T>, ProbeError>;

/// Live view of the shell's open windows, valid for one resolution.
pub trait ShellSession {
    fn foreground_window(&self) -> Option<WindowHandle>;
    /// Whether `window` is the desktop surface rather than a folder window.
    fn is_desktop(&self, window: WindowHandle) -> bool;
    fn window_count(&self) -> Result<usize, ProbeError>;
    fn window(&self, index: usize) -> ProbeResult<Box<dyn ShellWindow + '_>>;
}

pub trait ShellWindow {
    fn handle(&self) -> ProbeResult<WindowHandle>;
    fn document(&self) -> ProbeResult<Box<dyn FolderDocument + '_>>;
}

pub trait FolderDocument {
    fn selected_items(&self) -> ProbeResult<Box<dyn SelectedItems + '_>>;
}

pub trait SelectedItems {
    fn count(&self) -> Result<usize, ProbeError>;
    fn item_path(&self, index: usize) -> ProbeResult<PathBuf>;
}

/// Opens a [`ShellSession`] on the calling thread.
///
/// Automation objects are usually bound to the thread that created them, so
/// every resolution connects afresh on the worker that runs it.
pub trait ShellConnector: Send + Sync {
    type Session: ShellSession;

    fn connect(&self) -> Result<Self::Session, ProbeError>;
}

/// Object-safe entry point used by the runtime.
pub trait SelectionSource: Send + Sync {
    /// `None` covers both "nothing selected" and "could not tell".
    fn selected_path(&self) -> Option<PathBuf>;
}

pub struct SelectionResolver<C> {
    connector: C,
}

impl<C: ShellConnector> SelectionResolver<C> {
    pub const fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn resolve(&self) -> Option<PathBuf> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let session = self.connector.connect()?;
            resolve_in_session(&session)
        }));

        match outcome {
            Ok(Ok(path)) => path,
            Ok(Err(err)) => {
                tracing::debug!(%err, "selection resolution failed");
                None
            }
            Err(_) => {
                tracing::error!("selection resolution panicked");
                None
            }
        }
    }
}

impl<C: ShellConnector> SelectionSource for SelectionResolver<C> {
    fn selected_path(&self) -> Option<PathBuf> {
        self.resolve()
    }
}

/// Scans the shell windows for the foreground one and returns its first
/// selected item.
pub fn resolve_in_session<S: ShellSession + ?Sized>(
    session: &S,
) -> Result<Option<PathBuf>, ProbeError> {
    let Some(foreground) = session.foreground_window() else {
        return Ok(None);
    };

    let count = session.window_count()?;
    let found = (0..count).find_map(|index| match probe_window(session, index, foreground) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(index, %err, "skipping shell window that refused probing");
            None
        }
    });
    if found.is_some() {
        return Ok(found);
    }

    if session.is_desktop(foreground) {
        tracing::debug!("desktop icon selection is not resolved");
    }
    Ok(None)
}

fn probe_window<S: ShellSession + ?Sized>(
    session: &S,
    index: usize,
    foreground: WindowHandle,
) -> Result<Option<PathBuf>, ProbeError> {
    let Probe::Supported(window) = session.window(index)? else {
        return Ok(None);
    };
    let Probe::Supported(handle) = window.handle()? else {
        return Ok(None);
    };
    if handle != foreground {
        return Ok(None);
    }

    let Probe::Supported(document) = window.document()? else {
        return Ok(None);
    };
    let Probe::Supported(items) = document.selected_items()? else {
        return Ok(None);
    };
    if items.count()? == 0 {
        return Ok(None);
    }
    Ok(items.item_path(0)?.supported())
}

/// Connector for platforms without a shell automation backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableConnector;

impl ShellConnector for UnavailableConnector {
    type Session = NoShellSession;

    fn connect(&self) -> Result<Self::Session, ProbeError> {
        Err(ProbeError::Unavailable(
            "no shell automation backend for this platform".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NoShellSession;

impl ShellSession for NoShellSession {
    fn foreground_window(&self) -> Option<WindowHandle> {
        None
    }

    fn is_desktop(&self, _window: WindowHandle) -> bool {
        false
    }

    fn window_count(&self) -> Result<usize, ProbeError> {
        Ok(0)
    }

    fn window(&self, _index: usize) -> ProbeResult<Box<dyn ShellWindow + '_>> {
        Ok(Probe::Unsupported)
    }
}

#[cfg(windows)]
pub fn platform_selection_source() -> Box<dyn SelectionSource> {
    Box::new(SelectionResolver::new(ShellWindowsConnector))
}

#[cfg(not(windows))]
pub fn platform_selection_source() -> Box<dyn SelectionSource> {
    Box::new(SelectionResolver::new(UnavailableConnector))
}
