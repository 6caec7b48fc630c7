use crate::geometry::Rect;
use crate::preview::PreviewBounds;
use gtk4::prelude::*;

fn bounds_from_monitor_geometry(x: i32, y: i32, width: i32, height: i32) -> PreviewBounds {
    Rect::new(x, y, width.max(1), height.max(1))
}

/// Geometry of every connected monitor, in GDK's global coordinates.
pub(super) fn monitor_bounds() -> Vec<PreviewBounds> {
    let Some(display) = gtk4::gdk::Display::default() else {
        return Vec::new();
    };
    let monitors = display.monitors();
    let mut bounds_list = Vec::new();

    for index in 0..monitors.n_items() {
        let Some(item) = monitors.item(index) else {
            continue;
        };
        let Ok(monitor) = item.downcast::<gtk4::gdk::Monitor>() else {
            continue;
        };
        let geometry = monitor.geometry();
        bounds_list.push(bounds_from_monitor_geometry(
            geometry.x(),
            geometry.y(),
            geometry.width(),
            geometry.height(),
        ));
    }

    bounds_list
}
