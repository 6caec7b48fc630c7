/// Compile-time layout tokens; not user-overridable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub spacing_20: i32,
    pub panel_radius: u16,
    pub control_size: u16,
    pub icon_size: u16,
    pub preview_default_width: i32,
    pub preview_default_height: i32,
    pub preview_wide_width: i32,
    pub preview_wide_height: i32,
    pub preview_min_width: i32,
    pub preview_min_height: i32,
    /// Header strip above the content area.
    pub preview_chrome_height: i32,
    /// Largest share of a display the preview may cover, in percent.
    pub preview_max_display_percent: u8,
    pub motion_hover_ms: u32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    spacing_20: 20,
    panel_radius: 12,
    control_size: 32,
    icon_size: 16,
    preview_default_width: 800,
    preview_default_height: 600,
    preview_wide_width: 600,
    preview_wide_height: 500,
    preview_min_width: 400,
    preview_min_height: 300,
    preview_chrome_height: 45,
    preview_max_display_percent: 85,
    motion_hover_ms: 160,
};
