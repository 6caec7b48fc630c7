/// User-invocable commands on the preview window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewAction {
    CopyPath,
    CopyContent,
    ToggleStayOnTop,
    RevealInFolder,
    Refresh,
    OpenExternally,
    Close,
    About,
}

impl PreviewAction {
    /// Header buttons, left to right.
    pub const TOOLBAR: [PreviewAction; 8] = [
        PreviewAction::CopyPath,
        PreviewAction::CopyContent,
        PreviewAction::ToggleStayOnTop,
        PreviewAction::RevealInFolder,
        PreviewAction::Refresh,
        PreviewAction::OpenExternally,
        PreviewAction::About,
        PreviewAction::Close,
    ];

    pub const fn tooltip(self) -> &'static str {
        match self {
            Self::CopyPath => "Copy path",
            Self::CopyContent => "Copy content",
            Self::ToggleStayOnTop => "Stay on top",
            Self::RevealInFolder => "Show in folder",
            Self::Refresh => "Refresh",
            Self::OpenExternally => "Open with default app",
            Self::Close => "Close",
            Self::About => "About",
        }
    }

    pub const fn icon_name(self) -> &'static str {
        match self {
            Self::CopyPath => "insert-link-symbolic",
            Self::CopyContent => "edit-copy-symbolic",
            Self::ToggleStayOnTop => "view-pin-symbolic",
            Self::RevealInFolder => "folder-open-symbolic",
            Self::Refresh => "view-refresh-symbolic",
            Self::OpenExternally => "document-open-symbolic",
            Self::Close => "window-close-symbolic",
            Self::About => "help-about-symbolic",
        }
    }
}
