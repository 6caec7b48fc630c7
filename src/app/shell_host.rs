//! Hosts a system preview handler inside the preview window.
//!
//! On Windows the handler registered for the file type is created from its
//! class id, initialised with the file, and parented to the window's native
//! handle over the region the content area occupies. A tick callback keeps
//! that region in sync while the content is mapped. Elsewhere hosting is
//! unavailable and the provider card stays in place.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::ApplicationWindow;
use thiserror::Error;

use crate::geometry::Rect;

#[derive(Debug, Error)]
#[cfg_attr(not(windows), allow(dead_code))]
pub(super) enum HostError {
    #[error("system preview handlers are not available on this platform")]
    Unsupported,
    #[error("preview window has no native handle")]
    NoWindow,
    #[error("{operation} failed: {message}")]
    Call {
        operation: &'static str,
        message: String,
    },
}

/// Handler currently drawing into the window, if any. Dropping it unloads
/// the handler.
pub(super) type HostSlot = Rc<RefCell<Option<HostedPreview>>>;

pub(super) struct HostedPreview {
    #[cfg(windows)]
    handler: win32::PreviewHandler,
    region: Rect,
}

impl HostedPreview {
    #[cfg(windows)]
    fn start(window_title: &str, clsid: &str, path: &Path, region: Rect) -> Result<Self, HostError> {
        let parent = super::native::window_handle(window_title).ok_or(HostError::NoWindow)?;
        let handler = win32::PreviewHandler::start(parent, clsid, path, region)?;
        Ok(Self { handler, region })
    }

    #[cfg(not(windows))]
    fn start(
        _window_title: &str,
        _clsid: &str,
        _path: &Path,
        _region: Rect,
    ) -> Result<Self, HostError> {
        Err(HostError::Unsupported)
    }

    fn resize(&mut self, region: Rect) {
        if region == self.region {
            return;
        }
        self.region = region;
        #[cfg(windows)]
        self.handler.resize(region);
    }
}

pub(super) const fn hosting_supported() -> bool {
    cfg!(windows)
}

/// Widget bounds in window coordinates to device pixels within the native
/// client area. `None` until the widget has a size.
fn device_region(
    (x, y, width, height): (f32, f32, f32, f32),
    surface_offset: (f64, f64),
    scale_factor: i32,
) -> Option<Rect> {
    let scale = f64::from(scale_factor.max(1));
    let to_device = |value: f64| (value * scale).round() as i32;
    let width = to_device(f64::from(width));
    let height = to_device(f64::from(height));
    if width <= 0 || height <= 0 {
        return None;
    }
    Some(Rect::new(
        to_device(f64::from(x) + surface_offset.0),
        to_device(f64::from(y) + surface_offset.1),
        width,
        height,
    ))
}

fn widget_region(window: &ApplicationWindow, widget: &gtk4::Widget) -> Option<Rect> {
    let bounds = widget.compute_bounds(window)?;
    device_region(
        (bounds.x(), bounds.y(), bounds.width(), bounds.height()),
        window.surface_transform(),
        window.scale_factor(),
    )
}

/// Starts the handler for `path` once `region` is laid out and keeps it sized
/// to `region`. `fallback` is hidden while the handler draws and stays when
/// hosting fails.
pub(super) fn attach(
    window: &ApplicationWindow,
    window_title: &'static str,
    region: &gtk4::Widget,
    fallback: Option<gtk4::Widget>,
    slot: HostSlot,
    clsid: String,
    path: PathBuf,
) {
    let window = window.clone();
    let gave_up = Cell::new(false);
    region.add_tick_callback(move |region, _clock| {
        if gave_up.get() {
            return gtk4::glib::ControlFlow::Break;
        }
        let Some(bounds) = widget_region(&window, region) else {
            return gtk4::glib::ControlFlow::Continue;
        };
        let mut slot = slot.borrow_mut();
        if let Some(hosted) = slot.as_mut() {
            hosted.resize(bounds);
            return gtk4::glib::ControlFlow::Continue;
        }
        match HostedPreview::start(window_title, &clsid, &path, bounds) {
            Ok(hosted) => {
                tracing::info!(path = %path.display(), %clsid, "system preview handler hosted");
                if let Some(fallback) = &fallback {
                    fallback.set_opacity(0.0);
                    fallback.set_can_target(false);
                }
                slot.replace(hosted);
                gtk4::glib::ControlFlow::Continue
            }
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), %clsid, "could not host preview handler");
                gave_up.set(true);
                gtk4::glib::ControlFlow::Break
            }
        }
    });
}

#[cfg(windows)]
mod win32 {
    use std::path::Path;

    use windows::core::{Interface, HSTRING};
    use windows::Win32::Foundation::{HWND, RECT};
    use windows::Win32::System::Com::{
        CLSIDFromString, CoCreateInstance, CoInitializeEx, CLSCTX_INPROC_SERVER,
        CLSCTX_LOCAL_SERVER, COINIT_APARTMENTTHREADED, STGM_READ,
    };
    use windows::Win32::UI::Shell::PropertiesSystem::{IInitializeWithFile, IInitializeWithStream};
    use windows::Win32::UI::Shell::{
        IInitializeWithItem, IPreviewHandler, IShellItem, SHCreateItemFromParsingName,
        SHCreateMemStream,
    };

    use super::HostError;
    use crate::geometry::Rect;

    /// Stream-only handlers get the file in memory; larger files keep the card.
    const MAX_STREAM_BYTES: u64 = 64 * 1024 * 1024;

    fn failed(operation: &'static str) -> impl FnOnce(windows::core::Error) -> HostError {
        move |err| HostError::Call {
            operation,
            message: err.to_string(),
        }
    }

    fn to_rect(region: Rect) -> RECT {
        RECT {
            left: region.x,
            top: region.y,
            right: region.right(),
            bottom: region.bottom(),
        }
    }

    pub(super) struct PreviewHandler {
        handler: IPreviewHandler,
    }

    impl PreviewHandler {
        pub(super) fn start(
            parent: HWND,
            clsid: &str,
            path: &Path,
            region: Rect,
        ) -> Result<Self, HostError> {
            // SAFETY: runs on the GTK main thread. S_FALSE (already in an
            // apartment) and RPC_E_CHANGED_MODE both leave COM usable.
            let _ = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
            // SAFETY: the HSTRING outlives the call.
            let class = unsafe { CLSIDFromString(&HSTRING::from(clsid)) }
                .map_err(failed("CLSIDFromString"))?;
            // SAFETY: COM is initialized on this thread.
            let handler: IPreviewHandler = unsafe {
                CoCreateInstance(&class, None, CLSCTX_INPROC_SERVER | CLSCTX_LOCAL_SERVER)
            }
            .map_err(failed("CoCreateInstance"))?;
            initialize(&handler, path)?;

            let rect = to_rect(region);
            // SAFETY: `parent` is a live top-level window and `rect` outlives the call.
            unsafe { handler.SetWindow(parent, &rect) }
                .map_err(failed("IPreviewHandler::SetWindow"))?;
            // SAFETY: the handler is initialized and parented.
            unsafe { handler.DoPreview() }.map_err(failed("IPreviewHandler::DoPreview"))?;
            Ok(Self { handler })
        }

        pub(super) fn resize(&self, region: Rect) {
            let rect = to_rect(region);
            // SAFETY: `rect` outlives the call.
            if let Err(err) = unsafe { self.handler.SetRect(&rect) } {
                tracing::debug!(%err, "IPreviewHandler::SetRect failed");
            }
        }
    }

    impl Drop for PreviewHandler {
        fn drop(&mut self) {
            // SAFETY: Unload is valid at any point after creation.
            if let Err(err) = unsafe { self.handler.Unload() } {
                tracing::debug!(%err, "IPreviewHandler::Unload failed");
            }
        }
    }

    fn initialize(handler: &IPreviewHandler, path: &Path) -> Result<(), HostError> {
        let wide_path = HSTRING::from(path);
        if let Ok(init) = handler.cast::<IInitializeWithFile>() {
            // SAFETY: the path string outlives the call.
            return unsafe { init.Initialize(&wide_path, STGM_READ.0) }
                .map_err(failed("IInitializeWithFile::Initialize"));
        }
        if let Ok(init) = handler.cast::<IInitializeWithItem>() {
            // SAFETY: the path string outlives the call.
            let item: IShellItem = unsafe { SHCreateItemFromParsingName(&wide_path, None) }
                .map_err(failed("SHCreateItemFromParsingName"))?;
            // SAFETY: `item` is a live shell item.
            return unsafe { init.Initialize(&item, STGM_READ.0) }
                .map_err(failed("IInitializeWithItem::Initialize"));
        }
        if let Ok(init) = handler.cast::<IInitializeWithStream>() {
            let io_failed = |err: std::io::Error| HostError::Call {
                operation: "reading file for preview handler",
                message: err.to_string(),
            };
            if std::fs::metadata(path).map_err(io_failed)?.len() > MAX_STREAM_BYTES {
                return Err(HostError::Call {
                    operation: "IInitializeWithStream::Initialize",
                    message: "file is too large to stream".to_string(),
                });
            }
            let bytes = std::fs::read(path).map_err(io_failed)?;
            // SAFETY: the stream copies `bytes`.
            let stream = unsafe { SHCreateMemStream(Some(&bytes)) }.ok_or(HostError::Call {
                operation: "SHCreateMemStream",
                message: "no stream returned".to_string(),
            })?;
            // SAFETY: `stream` is a live stream.
            return unsafe { init.Initialize(&stream, STGM_READ.0) }
                .map_err(failed("IInitializeWithStream::Initialize"));
        }
        Err(HostError::Call {
            operation: "initializing preview handler",
            message: "handler accepts no file, item or stream".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_is_offset_by_surface_and_scaled() {
        assert_eq!(
            device_region((10.0, 45.0, 800.0, 600.0), (0.0, 0.0), 1),
            Some(Rect::new(10, 45, 800, 600))
        );
        assert_eq!(
            device_region((10.0, 45.0, 800.0, 600.0), (12.0, 8.0), 2),
            Some(Rect::new(44, 106, 1600, 1200))
        );
    }

    #[test]
    fn unallocated_region_is_not_hosted() {
        assert_eq!(device_region((0.0, 0.0, 0.0, 300.0), (0.0, 0.0), 1), None);
        assert_eq!(device_region((0.0, 0.0, 200.0, 0.2), (0.0, 0.0), 1), None);
    }

    #[cfg(not(windows))]
    #[test]
    fn hosting_is_unsupported_off_windows() {
        assert!(!hosting_supported());
        let started = HostedPreview::start(
            "QuickPeek",
            "{84F66100-FF7C-4fb4-B0C0-02CD7FB668FE}",
            Path::new("report.docx"),
            Rect::new(0, 45, 800, 600),
        );
        assert!(matches!(started, Err(HostError::Unsupported)));
    }
}
