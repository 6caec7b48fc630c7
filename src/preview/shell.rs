use std::time::{Duration, Instant};

use crate::geometry::Rect;

// Combined with the 160ms revealer transition, this targets ~600ms perceived hide timing.
const PREVIEW_CONTROL_HIDE_DELAY: Duration = Duration::from_millis(480);

/// Window-level presentation state that outlives individual previews.
#[derive(Debug, Clone)]
pub struct PreviewWindowShell {
    geometry: Option<Rect>,
    controls_visible: bool,
    hover_depth: usize,
    controls_hide_at: Option<Instant>,
    stay_on_top: bool,
}

impl PreviewWindowShell {
    pub fn new(stay_on_top: bool) -> Self {
        Self {
            geometry: None,
            controls_visible: false,
            hover_depth: 0,
            controls_hide_at: None,
            stay_on_top,
        }
    }

    pub fn geometry(&self) -> Option<Rect> {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: Rect) {
        self.geometry = Some(geometry);
    }

    pub fn stay_on_top(&self) -> bool {
        self.stay_on_top
    }

    /// Flips pinning and returns the new value.
    pub fn toggle_stay_on_top(&mut self) -> bool {
        self.stay_on_top = !self.stay_on_top;
        self.stay_on_top
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn hover_enter(&mut self, _now: Instant) {
        self.hover_depth += 1;
        self.controls_visible = true;
        self.controls_hide_at = None;
    }

    pub fn hover_exit(&mut self, now: Instant) {
        if self.hover_depth == 0 {
            return;
        }
        self.hover_depth -= 1;
        if self.hover_depth == 0 {
            self.controls_hide_at = Some(now + PREVIEW_CONTROL_HIDE_DELAY);
        }
    }

    pub fn update_hover_controls_visibility(&mut self, now: Instant) {
        if let Some(deadline) = self.controls_hide_at {
            if now >= deadline {
                self.controls_visible = false;
                self.controls_hide_at = None;
            }
        }
    }

    /// Forgets pointer state when the window goes away.
    pub fn reset_hover(&mut self) {
        self.hover_depth = 0;
        self.controls_visible = false;
        self.controls_hide_at = None;
    }
}

impl Default for PreviewWindowShell {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
impl PreviewWindowShell {
    fn hover_depth(&self) -> usize {
        self.hover_depth
    }
}
