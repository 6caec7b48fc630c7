use std::path::{Path, PathBuf};

/// Lifecycle of the single preview window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Hidden,
    /// Window is up with a placeholder while content for the path loads.
    Loading(PathBuf),
    Shown(PathBuf),
}

impl SessionState {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Hidden => None,
            Self::Loading(path) | Self::Shown(path) => Some(path),
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// Whether the window currently shows (or is loading) `path`.
    pub fn targets(&self, path: &Path) -> bool {
        self.path() == Some(path)
    }
}
