use crate::preview::PreviewAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Space,
    Enter,
    Escape,
    F5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub dialog_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DialogClose,
    Dismiss,
    OpenExternally,
    Refresh,
    CopyContent,
    CopyPath,
    ToggleStayOnTop,
}

impl ShortcutAction {
    /// The window action a shortcut stands for; dialog shortcuts have none.
    pub const fn preview_action(self) -> Option<PreviewAction> {
        match self {
            Self::DialogClose => None,
            Self::Dismiss => Some(PreviewAction::Close),
            Self::OpenExternally => Some(PreviewAction::OpenExternally),
            Self::Refresh => Some(PreviewAction::Refresh),
            Self::CopyContent => Some(PreviewAction::CopyContent),
            Self::CopyPath => Some(PreviewAction::CopyPath),
            Self::ToggleStayOnTop => Some(PreviewAction::ToggleStayOnTop),
        }
    }
}

fn resolve_dialog_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Escape => Some(ShortcutAction::DialogClose),
        _ => None,
    }
}

fn resolve_preview_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    let key = match key {
        ShortcutKey::Character(ch) => ShortcutKey::Character(ch.to_ascii_lowercase()),
        other => other,
    };
    match (key, modifiers.ctrl, modifiers.shift) {
        (ShortcutKey::Escape, _, _) | (ShortcutKey::Space, false, false) => {
            Some(ShortcutAction::Dismiss)
        }
        (ShortcutKey::Enter, false, false) => Some(ShortcutAction::OpenExternally),
        (ShortcutKey::F5, false, false) | (ShortcutKey::Character('r'), true, false) => {
            Some(ShortcutAction::Refresh)
        }
        (ShortcutKey::Character('c'), true, false) => Some(ShortcutAction::CopyContent),
        (ShortcutKey::Character('c'), true, true) => Some(ShortcutAction::CopyPath),
        (ShortcutKey::Character('t'), true, false) => Some(ShortcutAction::ToggleStayOnTop),
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.dialog_open {
        return resolve_dialog_shortcut(key);
    }

    resolve_preview_shortcut(key, modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: ShortcutModifiers = ShortcutModifiers::new(false, false);
    const CTRL: ShortcutModifiers = ShortcutModifiers::new(true, false);
    const CTRL_SHIFT: ShortcutModifiers = ShortcutModifiers::new(true, true);

    fn preview(key: ShortcutKey, modifiers: ShortcutModifiers) -> Option<ShortcutAction> {
        resolve_shortcut(key, modifiers, InputContext::default())
    }

    #[test]
    fn resolve_shortcut_only_honours_escape_while_dialog_is_open() {
        let context = InputContext { dialog_open: true };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, NONE, context),
            Some(ShortcutAction::DialogClose)
        );
        for key in [
            ShortcutKey::Space,
            ShortcutKey::Enter,
            ShortcutKey::F5,
            ShortcutKey::Character('c'),
        ] {
            assert_eq!(resolve_shortcut(key, CTRL, context), None);
            assert_eq!(resolve_shortcut(key, NONE, context), None);
        }
    }

    #[test]
    fn escape_and_space_dismiss_the_preview() {
        assert_eq!(preview(ShortcutKey::Escape, NONE), Some(ShortcutAction::Dismiss));
        assert_eq!(preview(ShortcutKey::Space, NONE), Some(ShortcutAction::Dismiss));
        assert_eq!(preview(ShortcutKey::Space, CTRL), None);
    }

    #[test]
    fn refresh_has_two_bindings() {
        assert_eq!(preview(ShortcutKey::F5, NONE), Some(ShortcutAction::Refresh));
        assert_eq!(
            preview(ShortcutKey::Character('r'), CTRL),
            Some(ShortcutAction::Refresh)
        );
        assert_eq!(preview(ShortcutKey::Character('r'), NONE), None);
    }

    #[test]
    fn copy_shortcuts_split_on_shift() {
        assert_eq!(
            preview(ShortcutKey::Character('c'), CTRL),
            Some(ShortcutAction::CopyContent)
        );
        assert_eq!(
            preview(ShortcutKey::Character('C'), CTRL_SHIFT),
            Some(ShortcutAction::CopyPath)
        );
        assert_eq!(preview(ShortcutKey::Character('c'), NONE), None);
    }

    #[test]
    fn shortcuts_map_onto_window_actions() {
        assert_eq!(
            preview(ShortcutKey::Enter, NONE).and_then(ShortcutAction::preview_action),
            Some(PreviewAction::OpenExternally)
        );
        assert_eq!(
            preview(ShortcutKey::Character('t'), CTRL).and_then(ShortcutAction::preview_action),
            Some(PreviewAction::ToggleStayOnTop)
        );
        assert_eq!(ShortcutAction::DialogClose.preview_action(), None);
    }
}
