use std::path::PathBuf;

use windows::core::{Interface, VARIANT};
use windows::Win32::Foundation::{HWND, RPC_E_CHANGED_MODE};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Shell::{
    FolderItems, IShellFolderViewDual, IShellWindows, IWebBrowserApp, ShellWindows,
};
use windows::Win32::UI::WindowsAndMessaging::{GetClassNameW, GetForegroundWindow};

use super::{
    FolderDocument, Probe, ProbeError, ProbeResult, SelectedItems, ShellConnector, ShellSession,
    ShellWindow, WindowHandle,
};

const DESKTOP_WINDOW_CLASSES: [&str; 2] = ["Progman", "WorkerW"];

/// Connects to the shell's `ShellWindows` collection through COM.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellWindowsConnector;

impl ShellConnector for ShellWindowsConnector {
    type Session = ComShellSession;

    fn connect(&self) -> Result<ComShellSession, ProbeError> {
        let apartment = ComApartment::enter()?;
        // SAFETY: COM is initialized on this thread for the lifetime of the
        // session, which owns the apartment guard.
        let windows: IShellWindows = unsafe { CoCreateInstance(&ShellWindows, None, CLSCTX_ALL) }
            .map_err(|err| ProbeError::call("CoCreateInstance(ShellWindows)", err))?;
        Ok(ComShellSession {
            windows,
            _apartment: apartment,
        })
    }
}

struct ComApartment {
    owns_initialization: bool,
}

impl ComApartment {
    fn enter() -> Result<Self, ProbeError> {
        // SAFETY: balanced by CoUninitialize in Drop when we initialized.
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            // The thread already joined a multithreaded apartment; use it.
            return Ok(Self {
                owns_initialization: false,
            });
        }
        hr.ok()
            .map_err(|err| ProbeError::Unavailable(err.to_string()))?;
        Ok(Self {
            owns_initialization: true,
        })
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.owns_initialization {
            // SAFETY: paired with a successful CoInitializeEx on this thread.
            unsafe { CoUninitialize() };
        }
    }
}

/// Field order matters: the COM interface is released before the apartment.
pub struct ComShellSession {
    windows: IShellWindows,
    _apartment: ComApartment,
}

impl ShellSession for ComShellSession {
    fn foreground_window(&self) -> Option<WindowHandle> {
        // SAFETY: no preconditions.
        let hwnd = unsafe { GetForegroundWindow() };
        (!hwnd.0.is_null()).then(|| WindowHandle(hwnd.0 as isize))
    }

    fn is_desktop(&self, window: WindowHandle) -> bool {
        let mut buffer = [0u16; 256];
        // SAFETY: the buffer outlives the call; a stale handle yields 0.
        let len = unsafe { GetClassNameW(HWND(window.0 as *mut _), &mut buffer) };
        if len <= 0 {
            return false;
        }
        let class_name = String::from_utf16_lossy(&buffer[..len as usize]);
        DESKTOP_WINDOW_CLASSES.contains(&class_name.as_str())
    }

    fn window_count(&self) -> Result<usize, ProbeError> {
        // SAFETY: plain COM property read.
        let count = unsafe { self.windows.Count() }
            .map_err(|err| ProbeError::call("IShellWindows::Count", err))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn window(&self, index: usize) -> ProbeResult<Box<dyn ShellWindow + '_>> {
        let index = i32::try_from(index).map_err(|err| ProbeError::call("index", err))?;
        // SAFETY: plain COM call with an owned VARIANT.
        let dispatch = unsafe { self.windows.Item(&VARIANT::from(index)) }
            .map_err(|err| ProbeError::call("IShellWindows::Item", err))?;
        Ok(match dispatch.cast::<IWebBrowserApp>() {
            Ok(browser) => Probe::Supported(Box::new(ComShellWindow { browser })),
            Err(_) => Probe::Unsupported,
        })
    }
}

struct ComShellWindow {
    browser: IWebBrowserApp,
}

impl ShellWindow for ComShellWindow {
    fn handle(&self) -> ProbeResult<WindowHandle> {
        // SAFETY: plain COM property read.
        let hwnd = unsafe { self.browser.HWND() }
            .map_err(|err| ProbeError::call("IWebBrowserApp::HWND", err))?;
        Ok(Probe::Supported(WindowHandle(hwnd.0)))
    }

    fn document(&self) -> ProbeResult<Box<dyn FolderDocument + '_>> {
        // SAFETY: plain COM property read.
        let document = unsafe { self.browser.Document() }
            .map_err(|err| ProbeError::call("IWebBrowserApp::Document", err))?;
        Ok(match document.cast::<IShellFolderViewDual>() {
            Ok(view) => Probe::Supported(Box::new(ComFolderDocument { view })),
            Err(_) => Probe::Unsupported,
        })
    }
}

struct ComFolderDocument {
    view: IShellFolderViewDual,
}

impl FolderDocument for ComFolderDocument {
    fn selected_items(&self) -> ProbeResult<Box<dyn SelectedItems + '_>> {
        // SAFETY: plain COM call.
        let items = unsafe { self.view.SelectedItems() }
            .map_err(|err| ProbeError::call("IShellFolderViewDual::SelectedItems", err))?;
        Ok(Probe::Supported(Box::new(ComSelectedItems { items })))
    }
}

struct ComSelectedItems {
    items: FolderItems,
}

impl SelectedItems for ComSelectedItems {
    fn count(&self) -> Result<usize, ProbeError> {
        // SAFETY: plain COM property read.
        let count = unsafe { self.items.Count() }
            .map_err(|err| ProbeError::call("FolderItems::Count", err))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn item_path(&self, index: usize) -> ProbeResult<PathBuf> {
        let index = i32::try_from(index).map_err(|err| ProbeError::call("index", err))?;
        // SAFETY: plain COM calls with an owned VARIANT.
        let item = unsafe { self.items.Item(&VARIANT::from(index)) }
            .map_err(|err| ProbeError::call("FolderItems::Item", err))?;
        let path = unsafe { item.Path() }.map_err(|err| ProbeError::call("FolderItem::Path", err))?;
        let path = path.to_string();
        Ok(if path.is_empty() {
            Probe::Unsupported
        } else {
            Probe::Supported(PathBuf::from(path))
        })
    }
}
