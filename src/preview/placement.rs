use crate::geometry::{Point, Rect, Size};
use crate::renderer::ContentLayout;
use crate::ui::StyleTokens;

/// Work area of one display in virtual-desktop coordinates.
pub type PreviewBounds = Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSizingTokens {
    pub default_size: Size,
    pub wide_size: Size,
    pub min_width: i32,
    pub min_height: i32,
    pub chrome_height: i32,
    pub max_display_percent: u8,
}

impl PreviewSizingTokens {
    pub fn from_style(tokens: StyleTokens) -> Self {
        let size = |width: i32, height: i32| {
            Size::new(
                u32::try_from(width).unwrap_or(1),
                u32::try_from(height).unwrap_or(1),
            )
        };
        Self {
            default_size: size(tokens.preview_default_width, tokens.preview_default_height),
            wide_size: size(tokens.preview_wide_width, tokens.preview_wide_height),
            min_width: tokens.preview_min_width,
            min_height: tokens.preview_min_height,
            chrome_height: tokens.preview_chrome_height,
            max_display_percent: tokens.preview_max_display_percent,
        }
    }
}

fn distance_sq_point_to_bounds(point: Point, bounds: PreviewBounds) -> i64 {
    let max_x = bounds.right().saturating_sub(1);
    let max_y = bounds.bottom().saturating_sub(1);
    let dx = if point.x < bounds.x {
        bounds.x - point.x
    } else if point.x > max_x {
        point.x - max_x
    } else {
        0
    };
    let dy = if point.y < bounds.y {
        bounds.y - point.y
    } else if point.y > max_y {
        point.y - max_y
    } else {
        0
    };
    i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy)
}

/// The display under the pointer, or the nearest one when the pointer sits
/// in a gap between displays.
pub fn display_for_point(point: Point, displays: &[PreviewBounds]) -> Option<PreviewBounds> {
    displays
        .iter()
        .copied()
        .find(|bounds| bounds.contains(point))
        .or_else(|| {
            displays
                .iter()
                .copied()
                .min_by_key(|bounds| distance_sq_point_to_bounds(point, *bounds))
        })
}

/// Window rectangle for a preview: intrinsic or layout-default content size,
/// scaled down (aspect preserved) to fit the display share, floored to the
/// minimum, centered on the pointer and shifted (never resized) to stay on
/// the display.
pub fn compute_preview_placement(
    pointer: Point,
    displays: &[PreviewBounds],
    size_hint: Option<Size>,
    layout: ContentLayout,
    tokens: PreviewSizingTokens,
) -> Rect {
    let base = size_hint
        .filter(|size| !size.is_empty())
        .unwrap_or(match layout {
            ContentLayout::Standard => tokens.default_size,
            ContentLayout::Wide => tokens.wide_size,
        });
    let mut width = f64::from(base.width);
    let mut height = f64::from(base.height);

    let display = display_for_point(pointer, displays);
    if let Some(display) = display {
        let share = f64::from(tokens.max_display_percent) / 100.0;
        let max_width = f64::from(display.width.max(1)) * share;
        // The header strip counts against the display share too.
        let max_height = (f64::from(display.height.max(1)) * share).floor()
            - f64::from(tokens.chrome_height);
        let max_height = max_height.max(1.0);
        let ratio = (max_width / width).min(max_height / height);
        if ratio < 1.0 {
            width *= ratio;
            height *= ratio;
        }
    }

    let width = (width.round() as i32).max(tokens.min_width);
    let height = (height.round() as i32)
        .saturating_add(tokens.chrome_height)
        .max(tokens.min_height);
    let mut x = pointer.x.saturating_sub(width / 2);
    let mut y = pointer.y.saturating_sub(height / 2);

    if let Some(display) = display {
        if x.saturating_add(width) > display.right() {
            x = display.right().saturating_sub(width);
        }
        if y.saturating_add(height) > display.bottom() {
            y = display.bottom().saturating_sub(height);
        }
        // Top-left wins when the window is larger than the display.
        x = x.max(display.x);
        y = y.max(display.y);
    }

    Rect::new(x, y, width, height)
}
