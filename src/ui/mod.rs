pub mod style;
#[cfg(feature = "gtk")]
pub mod widgets;

pub use style::{StyleTokens, LAYOUT_TOKENS};
#[cfg(feature = "gtk")]
pub use widgets::{badge_label, icon_button, icon_toggle_button};
