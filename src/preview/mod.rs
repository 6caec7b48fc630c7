mod actions;
mod placement;
mod shell;

pub use actions::PreviewAction;
pub use placement::{
    compute_preview_placement, display_for_point, PreviewBounds, PreviewSizingTokens,
};
pub use shell::PreviewWindowShell;
