use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use crate::geometry::{Point, Rect};
use crate::input::{resolve_shortcut, InputContext, ShortcutKey, ShortcutModifiers};
use crate::preview::{PreviewAction, PreviewBounds};
use crate::renderer::{extension_of, file_title, FileKind, PreviewContent};
use crate::session::{PreviewSurface, SurfaceError, SurfaceResult};
use crate::ui::{badge_label, icon_button, icon_toggle_button, StyleTokens};
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Label, Orientation, Overlay, Revealer,
    RevealerTransitionType, ToggleButton,
};

use super::content_view::build_content_widget;
use super::input_bridge::{normalize_shortcut_key, shortcut_modifiers};
use super::layout::monitor_bounds;
use super::native;
use super::shell_host::{self, HostSlot};

/// Unique title used to locate the native window.
pub(super) const WINDOW_TITLE: &str = "QuickPeek";

/// Window events forwarded to the session on the next main-loop tick, so no
/// signal handler ever re-enters the session while it drives the window.
/// Key presses are resolved there against the session's dialog guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SurfaceCommand {
    Action(PreviewAction),
    Shortcut {
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
    },
    Deactivated { minimized: bool },
    DialogClosed,
    HoverEnter,
    HoverExit,
}

fn extension_badge_text(path: &Path) -> String {
    if path.is_dir() {
        return String::new();
    }
    extension_of(path)
        .map(|ext| ext.to_ascii_uppercase())
        .unwrap_or_default()
}

fn send(commands: &Sender<SurfaceCommand>, command: SurfaceCommand) {
    if commands.send(command).is_err() {
        tracing::debug!(?command, "surface command dropped after shutdown");
    }
}

pub(super) struct GtkSurface {
    window: ApplicationWindow,
    tokens: StyleTokens,
    commands: Sender<SurfaceCommand>,
    title_label: Label,
    extension_badge: Label,
    truncated_badge: Label,
    kind_icon: gtk4::Image,
    content_host: GtkBox,
    controls: Revealer,
    pin_toggle: ToggleButton,
    about: Rc<RefCell<Option<gtk4::AboutDialog>>>,
    hosted: HostSlot,
}

impl GtkSurface {
    pub(super) fn new(
        app: &Application,
        tokens: StyleTokens,
        motion_hover_ms: u32,
        commands: Sender<SurfaceCommand>,
    ) -> Self {
        let window = ApplicationWindow::new(app);
        window.set_title(Some(WINDOW_TITLE));
        window.add_css_class("quickpeek-root");
        window.set_default_size(tokens.preview_default_width, tokens.preview_default_height);
        window.set_size_request(tokens.preview_min_width, tokens.preview_min_height);
        window.set_hide_on_close(true);

        let header = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
        header.add_css_class("preview-header");
        header.set_size_request(-1, tokens.preview_chrome_height);
        let kind_icon = gtk4::Image::from_icon_name(FileKind::Document.icon_name());
        let title_label = Label::new(None);
        title_label.add_css_class("preview-title");
        title_label.set_xalign(0.0);
        title_label.set_hexpand(true);
        title_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        let extension_badge = badge_label("", &["extension-badge"]);
        let truncated_badge = badge_label("Truncated", &["truncated-badge"]);
        truncated_badge.set_visible(false);
        header.append(&kind_icon);
        header.append(&title_label);
        header.append(&truncated_badge);
        header.append(&extension_badge);

        let (controls, pin_toggle) = build_controls(tokens, motion_hover_ms, &commands);

        let content_host = GtkBox::new(Orientation::Vertical, 0);
        content_host.add_css_class("preview-surface");
        content_host.set_hexpand(true);
        content_host.set_vexpand(true);

        let overlay = Overlay::new();
        overlay.set_child(Some(&content_host));
        overlay.add_overlay(&controls);

        let root = GtkBox::new(Orientation::Vertical, 0);
        root.append(&header);
        root.append(&overlay);
        window.set_child(Some(&root));

        connect_window_signals(&window, &overlay, &commands);

        Self {
            window,
            tokens,
            commands,
            title_label,
            extension_badge,
            truncated_badge,
            kind_icon,
            content_host,
            controls,
            pin_toggle,
            about: Rc::new(RefCell::new(None)),
            hosted: Rc::new(RefCell::new(None)),
        }
    }

    pub(super) fn set_controls_visible(&self, visible: bool) {
        if self.controls.reveals_child() != visible {
            self.controls.set_reveal_child(visible);
        }
        self.controls.set_can_target(visible);
    }

    /// Shows the about dialog; `DialogClosed` is sent when it goes away.
    pub(super) fn show_about(&self) {
        if let Some(dialog) = self.about.borrow().as_ref() {
            dialog.present();
            return;
        }
        let dialog = gtk4::AboutDialog::builder()
            .transient_for(&self.window)
            .modal(true)
            .program_name(WINDOW_TITLE)
            .version(env!("CARGO_PKG_VERSION"))
            .comments("Press the trigger key on a selected file to preview it.")
            .build();
        let commands = self.commands.clone();
        let about = Rc::clone(&self.about);
        dialog.connect_close_request(move |_| {
            about.borrow_mut().take();
            send(&commands, SurfaceCommand::DialogClosed);
            gtk4::glib::Propagation::Proceed
        });
        dialog.present();
        self.about.borrow_mut().replace(dialog);
    }

    pub(super) fn close_dialog(&self) {
        let dialog = self.about.borrow().clone();
        if let Some(dialog) = dialog {
            dialog.close();
        }
    }

    fn ensure_alive(&self) -> SurfaceResult<()> {
        if self.window.application().is_none() {
            return Err(SurfaceError::Unavailable(
                "preview window was detached from the application".to_string(),
            ));
        }
        Ok(())
    }

    fn release_hosted(&self) {
        if self.hosted.borrow_mut().take().is_some() {
            tracing::debug!("system preview handler unloaded");
        }
    }

    fn open_externally_callback(&self) -> Rc<dyn Fn()> {
        let commands = self.commands.clone();
        Rc::new(move || send(&commands, SurfaceCommand::Action(PreviewAction::OpenExternally)))
    }
}

fn build_controls(
    tokens: StyleTokens,
    motion_hover_ms: u32,
    commands: &Sender<SurfaceCommand>,
) -> (Revealer, ToggleButton) {
    let group = GtkBox::new(Orientation::Horizontal, tokens.spacing_4);
    group.add_css_class("preview-action-group");
    group.set_halign(Align::End);
    group.set_valign(Align::Start);
    group.set_margin_top(tokens.spacing_8);
    group.set_margin_end(tokens.spacing_8);

    let control_size = i32::from(tokens.control_size);
    let mut pin_toggle = None;
    for action in PreviewAction::TOOLBAR {
        let commands = commands.clone();
        if action == PreviewAction::ToggleStayOnTop {
            let toggle = icon_toggle_button(
                action.icon_name(),
                action.tooltip(),
                control_size,
                &["preview-pin-toggle"],
            );
            toggle.connect_clicked(move |_| send(&commands, SurfaceCommand::Action(action)));
            group.append(&toggle);
            pin_toggle = Some(toggle);
        } else {
            let button = icon_button(action.icon_name(), action.tooltip(), control_size, &[]);
            button.connect_clicked(move |_| send(&commands, SurfaceCommand::Action(action)));
            group.append(&button);
        }
    }

    let controls = Revealer::new();
    controls.set_transition_duration(motion_hover_ms);
    controls.set_transition_type(RevealerTransitionType::Crossfade);
    controls.set_halign(Align::End);
    controls.set_valign(Align::Start);
    controls.set_child(Some(&group));
    controls.set_reveal_child(false);
    controls.set_can_target(false);

    let pin_toggle = pin_toggle.unwrap_or_else(ToggleButton::new);
    (controls, pin_toggle)
}

fn window_is_minimized(window: &ApplicationWindow) -> bool {
    window
        .surface()
        .and_then(|surface| surface.downcast::<gtk4::gdk::Toplevel>().ok())
        .is_some_and(|toplevel| {
            toplevel
                .state()
                .contains(gtk4::gdk::ToplevelState::MINIMIZED)
        })
}

fn connect_window_signals(
    window: &ApplicationWindow,
    overlay: &Overlay,
    commands: &Sender<SurfaceCommand>,
) {
    {
        let commands = commands.clone();
        let key_controller = gtk4::EventControllerKey::new();
        key_controller.connect_key_pressed(move |_, key, keycode, modifier| {
            let Some(key) = normalize_shortcut_key(key, keycode) else {
                return gtk4::glib::Propagation::Proceed;
            };
            let modifiers = shortcut_modifiers(modifier);
            // Claim only keys that are shortcuts in some context.
            if resolve_shortcut(key, modifiers, InputContext::default()).is_none() {
                return gtk4::glib::Propagation::Proceed;
            }
            send(&commands, SurfaceCommand::Shortcut { key, modifiers });
            gtk4::glib::Propagation::Stop
        });
        window.add_controller(key_controller);
    }
    {
        let commands = commands.clone();
        window.connect_is_active_notify(move |window| {
            if window.is_active() || !window.is_visible() {
                return;
            }
            send(
                &commands,
                SurfaceCommand::Deactivated {
                    minimized: window_is_minimized(window),
                },
            );
        });
    }
    {
        let commands = commands.clone();
        window.connect_close_request(move |_| {
            send(&commands, SurfaceCommand::Action(PreviewAction::Close));
            gtk4::glib::Propagation::Stop
        });
    }
    {
        let pointer = gtk4::EventControllerMotion::new();
        {
            let commands = commands.clone();
            pointer.connect_enter(move |_, _, _| send(&commands, SurfaceCommand::HoverEnter));
        }
        {
            let commands = commands.clone();
            pointer.connect_leave(move |_| send(&commands, SurfaceCommand::HoverExit));
        }
        overlay.add_controller(pointer);
    }
}

impl PreviewSurface for GtkSurface {
    fn show_content(&mut self, path: &Path, content: &PreviewContent) -> SurfaceResult<()> {
        self.ensure_alive()?;
        self.title_label.set_text(&file_title(path));
        self.title_label.set_tooltip_text(Some(&path.display().to_string()));
        let badge = extension_badge_text(path);
        self.extension_badge.set_text(&badge);
        self.extension_badge.set_visible(!badge.is_empty());
        self.truncated_badge.set_visible(content.is_truncated());
        self.kind_icon
            .set_icon_name(Some(FileKind::for_path(path).icon_name()));

        self.release_hosted();
        while let Some(child) = self.content_host.first_child() {
            self.content_host.remove(&child);
        }
        let widget = build_content_widget(content, self.tokens, self.open_externally_callback());
        self.content_host.append(&widget);
        if let PreviewContent::ShellProvider { path, clsid, .. } = content {
            if shell_host::hosting_supported() {
                shell_host::attach(
                    &self.window,
                    WINDOW_TITLE,
                    &widget,
                    widget.first_child(),
                    Rc::clone(&self.hosted),
                    clsid.clone(),
                    path.clone(),
                );
            }
        }
        Ok(())
    }

    fn place(&mut self, bounds: Rect) -> SurfaceResult<()> {
        self.ensure_alive()?;
        self.window.set_default_size(bounds.width, bounds.height);
        self.window.present();
        if !native::move_window(WINDOW_TITLE, bounds) {
            tracing::trace!(?bounds, "window position left to the window manager");
        }
        Ok(())
    }

    fn hide(&mut self) -> SurfaceResult<()> {
        self.release_hosted();
        self.set_controls_visible(false);
        self.window.set_visible(false);
        Ok(())
    }

    fn pointer_position(&self) -> Option<Point> {
        native::cursor_position()
    }

    fn displays(&self) -> Vec<PreviewBounds> {
        monitor_bounds()
    }

    fn set_stay_on_top(&mut self, enabled: bool) -> SurfaceResult<()> {
        self.pin_toggle.set_active(enabled);
        native::set_window_topmost(WINDOW_TITLE, enabled);
        Ok(())
    }

    fn copy_text(&mut self, text: &str) -> SurfaceResult<()> {
        self.ensure_alive()?;
        self.window.clipboard().set_text(text);
        Ok(())
    }
}
