//! Window-manager requests GTK4 does not expose: absolute placement,
//! keep-above and the global pointer position. The window is located by its
//! unique title. Where the platform offers no such request the calls report
//! `false` and the compositor decides.

use crate::geometry::{Point, Rect};

#[cfg(windows)]
mod win32 {
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::{HWND, POINT};
    use windows::Win32::UI::WindowsAndMessaging::{
        FindWindowW, GetCursorPos, SetWindowPos, HWND_NOTOPMOST, HWND_TOPMOST, SWP_NOACTIVATE,
        SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
    };

    use crate::geometry::{Point, Rect};

    pub(super) fn find_window(title: &str) -> Option<HWND> {
        let title = HSTRING::from(title);
        // SAFETY: both arguments are valid null-terminated wide strings or null.
        match unsafe { FindWindowW(PCWSTR::null(), &title) } {
            Ok(hwnd) if !hwnd.is_invalid() => Some(hwnd),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(%err, "preview window handle not found");
                None
            }
        }
    }

    pub(super) fn cursor_position() -> Option<Point> {
        let mut point = POINT::default();
        // SAFETY: `point` is a valid out pointer for the duration of the call.
        unsafe { GetCursorPos(&mut point) }.ok()?;
        Some(Point::new(point.x, point.y))
    }

    pub(super) fn move_window(title: &str, bounds: Rect) -> bool {
        let Some(hwnd) = find_window(title) else {
            return false;
        };
        // SAFETY: `hwnd` was just returned by FindWindowW.
        let moved = unsafe {
            SetWindowPos(
                hwnd,
                HWND::default(),
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
        if let Err(err) = &moved {
            tracing::warn!(%err, "SetWindowPos failed for preview placement");
        }
        moved.is_ok()
    }

    pub(super) fn set_topmost(title: &str, enabled: bool) -> bool {
        let Some(hwnd) = find_window(title) else {
            return false;
        };
        let insert_after = if enabled { HWND_TOPMOST } else { HWND_NOTOPMOST };
        // SAFETY: `hwnd` was just returned by FindWindowW.
        let changed = unsafe {
            SetWindowPos(
                hwnd,
                insert_after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        };
        if let Err(err) = &changed {
            tracing::warn!(%err, enabled, "SetWindowPos failed for stay-on-top");
        }
        changed.is_ok()
    }
}

/// Native handle of the top-level window titled `title`.
#[cfg(windows)]
pub(super) fn window_handle(title: &str) -> Option<windows::Win32::Foundation::HWND> {
    win32::find_window(title)
}

#[cfg(windows)]
pub(super) fn cursor_position() -> Option<Point> {
    win32::cursor_position()
}

#[cfg(not(windows))]
pub(super) fn cursor_position() -> Option<Point> {
    None
}

#[cfg(windows)]
pub(super) fn move_window(title: &str, bounds: Rect) -> bool {
    win32::move_window(title, bounds)
}

#[cfg(not(windows))]
pub(super) fn move_window(title: &str, bounds: Rect) -> bool {
    tracing::trace!(title, ?bounds, "absolute placement unavailable; size only");
    false
}

#[cfg(windows)]
pub(super) fn set_window_topmost(title: &str, enabled: bool) -> bool {
    win32::set_topmost(title, enabled)
}

#[cfg(not(windows))]
pub(super) fn set_window_topmost(title: &str, enabled: bool) -> bool {
    tracing::debug!(title, enabled, "keep-above is left to the window manager");
    false
}
