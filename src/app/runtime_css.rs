use crate::ui::StyleTokens;
use gtk4::CssProvider;

fn runtime_css(tokens: StyleTokens, motion_enabled: bool) -> String {
    let motion_hover_ms = if motion_enabled {
        tokens.motion_hover_ms
    } else {
        0
    };
    format!(
        "
window.quickpeek-root {{
  background: @theme_bg_color;
  color: @theme_fg_color;
}}
.quickpeek-root button image {{
  -gtk-icon-style: symbolic;
  color: inherit;
}}
/* ── Header ── */
.preview-header {{
  min-height: {chrome_height}px;
  padding: 0 {spacing_12}px;
  border-bottom: 1px solid @borders;
}}
.preview-title {{
  font-weight: 600;
}}
.badge {{
  border-radius: {badge_radius}px;
  padding: 1px {spacing_8}px;
  font-size: 11px;
  font-weight: 600;
  background: alpha(@theme_fg_color, 0.10);
}}
.badge.truncated-badge {{
  background: alpha(@warning_color, 0.25);
}}
/* ── Controls ── */
.preview-action-group {{
  border-radius: {panel_radius}px;
  padding: {spacing_4}px;
  background: alpha(@theme_bg_color, 0.92);
  transition: opacity {motion_hover_ms}ms ease-out;
}}
button.icon-button {{
  min-width: {control_size}px;
  min-height: {control_size}px;
  padding: 0;
}}
button.icon-button image {{
  -gtk-icon-size: {icon_size}px;
}}
/* ── Content ── */
.preview-surface {{
  padding: {spacing_12}px;
}}
.preview-text,
.preview-hex {{
  font-family: monospace;
  font-size: 12px;
}}
.preview-message {{
  padding: {spacing_20}px;
}}
.preview-message.error {{
  color: @error_color;
}}
.preview-summary {{
  opacity: 0.75;
}}
.preview-field-name {{
  font-weight: 600;
}}
.preview-host {{
  background: @theme_base_color;
}}
.preview-provider-card {{
  border-radius: {panel_radius}px;
  padding: {spacing_20}px;
  background: alpha(@theme_fg_color, 0.05);
}}
",
        chrome_height = tokens.preview_chrome_height,
        spacing_4 = tokens.spacing_4,
        spacing_8 = tokens.spacing_8,
        spacing_12 = tokens.spacing_12,
        spacing_20 = tokens.spacing_20,
        panel_radius = tokens.panel_radius,
        badge_radius = tokens.panel_radius / 2,
        control_size = tokens.control_size,
        icon_size = tokens.icon_size,
        motion_hover_ms = motion_hover_ms,
    )
}

pub(super) fn install_runtime_css(tokens: StyleTokens, motion_enabled: bool) {
    let provider = CssProvider::new();
    provider.load_from_data(&runtime_css(tokens, motion_enabled));
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::LAYOUT_TOKENS;

    #[test]
    fn css_uses_layout_tokens_and_disables_motion_on_request() {
        let css = runtime_css(LAYOUT_TOKENS, false);
        assert!(css.contains("min-height: 45px;"));
        assert!(css.contains("transition: opacity 0ms"));

        let css = runtime_css(LAYOUT_TOKENS, true);
        assert!(css.contains("transition: opacity 160ms"));
    }
}
