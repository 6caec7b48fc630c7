//! Preview session controller.
//!
//! Owns the single preview surface and drives it from hotkey triggers and
//! window actions. The session itself runs on the UI thread. Renderer
//! resolution and `render` touch the filesystem, so the runtime does them on
//! a worker through [`PreparedPreview::render`] and hands the result to
//! [`PreviewSession::handle_prepared`]. Renderer loaders are handed back as
//! [`PendingLoad`] values for the caller to run on a worker, and their
//! results re-enter through [`PreviewSession::complete_load`], which drops
//! any result whose path no longer matches the session.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::geometry::{Point, Rect};
use crate::input::InputContext;
use crate::launcher::Launcher;
use crate::notification::Notifier;
use crate::preview::{
    compute_preview_placement, PreviewAction, PreviewBounds, PreviewSizingTokens,
    PreviewWindowShell,
};
use crate::registry::RendererRegistry;
use crate::renderer::{ContentHandle, ContentLoader, PreviewContent};
use crate::state::{SessionEvent, SessionMachine, SessionState};
use crate::ui::LAYOUT_TOKENS;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("preview surface is unavailable: {0}")]
    Unavailable(String),
    #[error("failed to {operation}: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },
}

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// The window the session drives.
pub trait PreviewSurface {
    /// Attaches content for `path`, replacing whatever was shown.
    fn show_content(&mut self, path: &Path, content: &PreviewContent) -> SurfaceResult<()>;
    /// Moves and resizes the window to `bounds` and makes it visible.
    fn place(&mut self, bounds: Rect) -> SurfaceResult<()>;
    fn hide(&mut self) -> SurfaceResult<()>;
    fn pointer_position(&self) -> Option<Point>;
    fn displays(&self) -> Vec<PreviewBounds>;
    fn set_stay_on_top(&mut self, enabled: bool) -> SurfaceResult<()>;
    fn copy_text(&mut self, text: &str) -> SurfaceResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub hide_on_deactivate: bool,
    pub stay_on_top: bool,
    pub sizing: PreviewSizingTokens,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            hide_on_deactivate: true,
            stay_on_top: false,
            sizing: PreviewSizingTokens::from_style(LAYOUT_TOKENS),
        }
    }
}

/// Deferred content population for one path; safe to run on any thread.
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    loader: ContentLoader,
}

impl PendingLoad {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs the loader. A panic inside it becomes the generic failure message.
    pub fn run(self) -> LoadedContent {
        let Self { path, loader } = self;
        let content = match panic::catch_unwind(AssertUnwindSafe(|| loader.load())) {
            Ok(content) => content,
            Err(_) => {
                tracing::error!(path = %path.display(), "content loader panicked");
                PreviewContent::failed()
            }
        };
        LoadedContent { path, content }
    }
}

/// A path with its renderer output, ready to be attached by the session.
#[derive(Debug)]
pub struct PreparedPreview {
    path: PathBuf,
    handle: ContentHandle,
}

impl PreparedPreview {
    /// Resolves and renders `path`, containing renderer panics. Renderers
    /// touch the filesystem here (directory checks, image headers, shell
    /// registry lookups), so call this off the UI thread.
    pub fn render(registry: &RendererRegistry, path: PathBuf) -> Self {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.resolve(&path).map(|renderer| renderer.render(&path))
        }));
        let handle = match rendered {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                tracing::warn!(path = %path.display(), "no renderer for file");
                ContentHandle::ready(PreviewContent::no_preview())
            }
            Err(_) => {
                tracing::error!(path = %path.display(), "renderer panicked");
                ContentHandle::ready(PreviewContent::failed())
            }
        };
        Self { path, handle }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedContent {
    pub path: PathBuf,
    pub content: PreviewContent,
}

pub struct PreviewSession<S: PreviewSurface> {
    machine: SessionMachine,
    registry: Arc<RendererRegistry>,
    surface: S,
    launcher: Box<dyn Launcher>,
    notifier: Box<dyn Notifier>,
    shell: PreviewWindowShell,
    options: SessionOptions,
    dialog_open: bool,
    content: Option<PreviewContent>,
}

impl<S: PreviewSurface> PreviewSession<S> {
    pub fn new(
        surface: S,
        registry: RendererRegistry,
        launcher: Box<dyn Launcher>,
        notifier: Box<dyn Notifier>,
        options: SessionOptions,
    ) -> Self {
        Self {
            machine: SessionMachine::new(),
            registry: Arc::new(registry),
            surface,
            launcher,
            notifier,
            shell: PreviewWindowShell::new(options.stay_on_top),
            options,
            dialog_open: false,
            content: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.machine.state().path()
    }

    /// Shared handle for rendering off the UI thread.
    pub fn registry(&self) -> Arc<RendererRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn content(&self) -> Option<&PreviewContent> {
        self.content.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn shell(&self) -> &PreviewWindowShell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut PreviewWindowShell {
        &mut self.shell
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    /// Context for resolving keyboard shortcuts in the preview window.
    pub fn input_context(&self) -> InputContext {
        InputContext {
            dialog_open: self.dialog_open,
        }
    }

    /// While a dialog is open the window ignores dismissal of any kind.
    pub fn set_dialog_open(&mut self, open: bool) {
        tracing::debug!(open, "dialog guard changed");
        self.dialog_open = open;
    }

    /// Reacts to a hotkey trigger whose selection has been resolved,
    /// rendering on the calling thread.
    ///
    /// Same path as the visible preview toggles it off (unless a dialog is
    /// open); a different path retargets the window; no path does nothing.
    pub fn handle_trigger(&mut self, selection: Option<PathBuf>) -> Option<PendingLoad> {
        let Some(path) = selection else {
            tracing::debug!("trigger without a selected path");
            return None;
        };
        self.trigger(path, None)
    }

    /// [`Self::handle_trigger`] with content already rendered by a worker.
    pub fn handle_prepared(&mut self, prepared: Option<PreparedPreview>) -> Option<PendingLoad> {
        let Some(PreparedPreview { path, handle }) = prepared else {
            tracing::debug!("trigger without a selected path");
            return None;
        };
        self.trigger(path, Some(handle))
    }

    fn trigger(&mut self, path: PathBuf, handle: Option<ContentHandle>) -> Option<PendingLoad> {
        if self.dialog_open && self.machine.state().targets(&path) {
            tracing::debug!(path = %path.display(), "toggle-off ignored while a dialog is open");
            return None;
        }

        let visible = match self.machine.transition(SessionEvent::Trigger(path.clone())) {
            Ok(state) => state.is_visible(),
            Err(err) => {
                tracing::warn!(?err, "trigger rejected");
                return None;
            }
        };
        if visible {
            tracing::info!(path = %path.display(), "showing preview");
            let handle = handle.unwrap_or_else(|| self.render_inline(&path));
            self.present(path, handle)
        } else {
            tracing::debug!(path = %path.display(), "toggling preview off");
            self.hide_surface();
            None
        }
    }

    /// Applies loader output if the session still targets its path.
    pub fn complete_load(&mut self, loaded: LoadedContent) -> bool {
        let LoadedContent { path, content } = loaded;
        let event = SessionEvent::ContentAttached(path.clone());
        if !self.machine.can_transition(&event) {
            tracing::debug!(
                path = %path.display(),
                state = ?self.machine.state(),
                "discarding stale preview content"
            );
            return false;
        }
        if let Err(err) = self.surface.show_content(&path, &content) {
            self.fail_surface(err);
            return false;
        }
        if let Err(err) = self.machine.transition(event) {
            tracing::warn!(?err, "content attach rejected");
            return false;
        }
        self.content = Some(content);
        true
    }

    pub fn dismiss(&mut self) -> bool {
        if self.dialog_open {
            tracing::debug!("dismiss ignored while a dialog is open");
            return false;
        }
        if !self.machine.can_transition(&SessionEvent::Dismiss) {
            return false;
        }
        if let Err(err) = self.machine.transition(SessionEvent::Dismiss) {
            tracing::warn!(?err, "dismiss rejected");
            return false;
        }
        self.hide_surface();
        true
    }

    /// Focus moved to another window.
    pub fn on_deactivated(&mut self, minimized: bool) -> bool {
        if !self.options.hide_on_deactivate || minimized || self.shell.stay_on_top() {
            return false;
        }
        self.dismiss()
    }

    /// Re-renders the shown path from scratch on the calling thread.
    pub fn refresh(&mut self) -> Option<PendingLoad> {
        let path = self.refreshable_path()?;
        let handle = self.render_inline(&path);
        self.refresh_with(path, handle)
    }

    /// The path a refresh would re-render: only a fully shown preview.
    pub fn refreshable_path(&self) -> Option<PathBuf> {
        self.machine
            .can_transition(&SessionEvent::Refresh)
            .then(|| self.current_path().map(Path::to_path_buf))
            .flatten()
    }

    /// Applies a worker-rendered refresh if the session still shows its path.
    pub fn refresh_prepared(&mut self, prepared: PreparedPreview) -> Option<PendingLoad> {
        let PreparedPreview { path, handle } = prepared;
        if self.refreshable_path().as_deref() != Some(path.as_path()) {
            tracing::debug!(path = %path.display(), "discarding stale refresh");
            return None;
        }
        self.refresh_with(path, handle)
    }

    fn refresh_with(&mut self, path: PathBuf, handle: ContentHandle) -> Option<PendingLoad> {
        if let Err(err) = self.machine.transition(SessionEvent::Refresh) {
            tracing::debug!(?err, "refresh ignored");
            return None;
        }
        tracing::debug!(path = %path.display(), "refreshing preview");
        self.present(path, handle)
    }

    pub fn open_externally(&mut self) {
        let Some(path) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        match self.launcher.open(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "opened externally");
                self.dismiss();
            }
            Err(err) => {
                tracing::error!(?err, path = %path.display(), "could not open file");
                self.notifier.notify("Could not open file", &err.to_string());
            }
        }
    }

    pub fn reveal_in_folder(&mut self) {
        let Some(path) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        if let Err(err) = self.launcher.reveal(&path) {
            tracing::error!(?err, path = %path.display(), "could not open folder");
            self.notifier.notify("Could not open folder", &err.to_string());
        }
    }

    pub fn copy_path(&mut self) {
        let Some(text) = self.current_path().map(|path| path.display().to_string()) else {
            return;
        };
        self.copy(&text, "path");
    }

    pub fn copy_content(&mut self) {
        let Some(text) = self.content.as_ref().and_then(PreviewContent::clipboard_text) else {
            tracing::debug!("current preview has no text to copy");
            return;
        };
        self.copy(&text, "content");
    }

    pub fn toggle_stay_on_top(&mut self) -> bool {
        let enabled = self.shell.toggle_stay_on_top();
        if let Err(err) = self.surface.set_stay_on_top(enabled) {
            tracing::warn!(?err, enabled, "failed to change stay-on-top");
        }
        tracing::debug!(enabled, "toggled stay on top");
        enabled
    }

    /// Dispatches a toolbar or shortcut action. `About` only raises the dialog
    /// guard; the caller shows the dialog and lowers the guard when it closes.
    pub fn perform(&mut self, action: PreviewAction) -> Option<PendingLoad> {
        match action {
            PreviewAction::CopyPath => self.copy_path(),
            PreviewAction::CopyContent => self.copy_content(),
            PreviewAction::ToggleStayOnTop => {
                self.toggle_stay_on_top();
            }
            PreviewAction::RevealInFolder => self.reveal_in_folder(),
            PreviewAction::Refresh => return self.refresh(),
            PreviewAction::OpenExternally => self.open_externally(),
            PreviewAction::Close => {
                self.dismiss();
            }
            PreviewAction::About => self.set_dialog_open(true),
        }
        None
    }

    fn copy(&mut self, text: &str, what: &'static str) {
        match self.surface.copy_text(text) {
            Ok(()) => tracing::debug!(what, "copied to clipboard"),
            Err(err) => tracing::error!(?err, what, "failed to copy to clipboard"),
        }
    }

    fn render_inline(&self, path: &Path) -> ContentHandle {
        PreparedPreview::render(&self.registry, path.to_path_buf()).handle
    }

    fn present(&mut self, path: PathBuf, mut handle: ContentHandle) -> Option<PendingLoad> {
        let loader = handle.take_loader();

        let displays = self.surface.displays();
        let pointer = self
            .surface
            .pointer_position()
            .or_else(|| {
                displays
                    .first()
                    .map(|d| Point::new(d.x + d.width / 2, d.y + d.height / 2))
            })
            .unwrap_or_default();
        let bounds = compute_preview_placement(
            pointer,
            &displays,
            handle.size_hint(),
            handle.layout(),
            self.options.sizing,
        );

        let shown = self
            .surface
            .show_content(&path, handle.content())
            .and_then(|()| self.surface.place(bounds));
        if let Err(err) = shown {
            self.fail_surface(err);
            return None;
        }
        self.shell.set_geometry(bounds);
        self.content = Some(handle.content().clone());

        match loader {
            Some(loader) => Some(PendingLoad { path, loader }),
            None => {
                if let Err(err) = self.machine.transition(SessionEvent::ContentAttached(path)) {
                    tracing::warn!(?err, "content attach rejected");
                }
                None
            }
        }
    }

    fn hide_surface(&mut self) {
        self.content = None;
        self.shell.reset_hover();
        if let Err(err) = self.surface.hide() {
            tracing::warn!(?err, "failed to hide preview surface");
        }
    }

    fn fail_surface(&mut self, err: SurfaceError) {
        tracing::error!(?err, "preview surface failed");
        if let Err(err) = self.machine.transition(SessionEvent::SurfaceFailed) {
            tracing::warn!(?err, "surface failure transition rejected");
        }
        self.content = None;
        self.shell.reset_hover();
        let _ = self.surface.hide();
        self.notifier.notify("Preview unavailable", &err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{LaunchError, LaunchResult};
    use crate::renderer::{Renderer, TextRenderer};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SurfaceOp {
        Show(PathBuf, PreviewContent),
        Place(Rect),
        Hide,
        StayOnTop(bool),
        Copy(String),
    }

    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<SurfaceOp>,
        fail_show: bool,
        pointer: Option<Point>,
        displays: Vec<Rect>,
    }

    impl RecordingSurface {
        fn hides(&self) -> usize {
            self.ops.iter().filter(|op| **op == SurfaceOp::Hide).count()
        }

        fn last_shown(&self) -> Option<&PreviewContent> {
            self.ops.iter().rev().find_map(|op| match op {
                SurfaceOp::Show(_, content) => Some(content),
                _ => None,
            })
        }
    }

    impl PreviewSurface for RecordingSurface {
        fn show_content(&mut self, path: &Path, content: &PreviewContent) -> SurfaceResult<()> {
            if self.fail_show {
                return Err(SurfaceError::Unavailable("window destroyed".to_string()));
            }
            self.ops
                .push(SurfaceOp::Show(path.to_path_buf(), content.clone()));
            Ok(())
        }

        fn place(&mut self, bounds: Rect) -> SurfaceResult<()> {
            self.ops.push(SurfaceOp::Place(bounds));
            Ok(())
        }

        fn hide(&mut self) -> SurfaceResult<()> {
            self.ops.push(SurfaceOp::Hide);
            Ok(())
        }

        fn pointer_position(&self) -> Option<Point> {
            self.pointer
        }

        fn displays(&self) -> Vec<PreviewBounds> {
            self.displays.clone()
        }

        fn set_stay_on_top(&mut self, enabled: bool) -> SurfaceResult<()> {
            self.ops.push(SurfaceOp::StayOnTop(enabled));
            Ok(())
        }

        fn copy_text(&mut self, text: &str) -> SurfaceResult<()> {
            self.ops.push(SurfaceOp::Copy(text.to_string()));
            Ok(())
        }
    }

    /// Claims one extension; `.slow` content arrives through a loader and
    /// `.boom` panics.
    struct FakeRenderer {
        suffix: &'static str,
    }

    impl Renderer for FakeRenderer {
        fn name(&self) -> &'static str {
            self.suffix
        }

        fn can_handle(&self, path: &Path) -> bool {
            path.to_string_lossy().ends_with(self.suffix)
        }

        fn render(&self, path: &Path) -> ContentHandle {
            let name = path.display().to_string();
            match self.suffix {
                ".slow" => ContentHandle::loading("Loading", move || {
                    PreviewContent::info(format!("loaded {name}"))
                }),
                ".boom" => panic!("renderer exploded"),
                ".badloader" => ContentHandle::loading("Loading", || panic!("loader exploded")),
                _ => ContentHandle::ready(PreviewContent::info(format!("ready {name}"))),
            }
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    struct RecordingLauncher {
        log: Log,
        fail: bool,
    }

    impl Launcher for RecordingLauncher {
        fn open(&self, path: &Path) -> LaunchResult<()> {
            if self.fail {
                return Err(LaunchError::NoParent {
                    path: path.to_path_buf(),
                });
            }
            self.log.lock().expect("log").push(format!("open {}", path.display()));
            Ok(())
        }

        fn reveal(&self, path: &Path) -> LaunchResult<()> {
            self.log.lock().expect("log").push(format!("reveal {}", path.display()));
            Ok(())
        }
    }

    struct RecordingNotifier(Log);

    impl Notifier for RecordingNotifier {
        fn notify(&self, summary: &str, _body: &str) {
            self.0.lock().expect("log").push(summary.to_string());
        }
    }

    struct Harness {
        session: PreviewSession<RecordingSurface>,
        launches: Log,
        notices: Log,
    }

    fn harness_with(surface: RecordingSurface, options: SessionOptions, launch_fails: bool) -> Harness {
        let mut registry = RendererRegistry::new();
        for suffix in [".ready", ".slow", ".boom", ".badloader"] {
            registry.register(FakeRenderer { suffix });
        }
        harness_over(registry, surface, options, launch_fails)
    }

    fn harness_over(
        registry: RendererRegistry,
        surface: RecordingSurface,
        options: SessionOptions,
        launch_fails: bool,
    ) -> Harness {
        let launches = Log::default();
        let notices = Log::default();
        let session = PreviewSession::new(
            surface,
            registry,
            Box::new(RecordingLauncher {
                log: launches.clone(),
                fail: launch_fails,
            }),
            Box::new(RecordingNotifier(notices.clone())),
            options,
        );
        Harness {
            session,
            launches,
            notices,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingSurface::default(), SessionOptions::default(), false)
    }

    fn p(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn trigger_without_selection_changes_nothing() {
        let mut h = harness();
        assert!(h.session.handle_trigger(None).is_none());
        assert_eq!(h.session.state(), &SessionState::Hidden);
        assert!(h.session.surface().ops.is_empty());
    }

    #[test]
    fn same_path_trigger_toggles_the_window() {
        let mut h = harness();
        assert!(h.session.handle_trigger(Some(p("a.ready"))).is_none());
        assert_eq!(h.session.state(), &SessionState::Shown(p("a.ready")));
        assert_eq!(
            h.session.surface().last_shown(),
            Some(&PreviewContent::info("ready a.ready"))
        );

        h.session.handle_trigger(Some(p("a.ready")));
        assert_eq!(h.session.state(), &SessionState::Hidden);
        assert_eq!(h.session.surface().ops.last(), Some(&SurfaceOp::Hide));
        assert_eq!(h.session.content(), None);
    }

    #[test]
    fn third_press_on_same_path_shows_it_again() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        h.session.handle_trigger(Some(p("a.ready")));
        assert_eq!(h.session.state(), &SessionState::Hidden);

        h.session.handle_trigger(Some(p("a.ready")));
        assert_eq!(h.session.state(), &SessionState::Shown(p("a.ready")));
        assert_eq!(
            h.session.content(),
            Some(&PreviewContent::info("ready a.ready"))
        );
        assert_eq!(h.session.surface().hides(), 1);
    }

    #[test]
    fn rendering_an_unchanged_file_twice_gives_equal_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "0123456789abcdefghij").expect("write");

        let mut registry = RendererRegistry::new();
        registry.register(TextRenderer::new(8));
        let mut h = harness_over(
            registry,
            RecordingSurface::default(),
            SessionOptions::default(),
            false,
        );

        let first = h.session.handle_trigger(Some(path.clone())).expect("text loads");
        assert!(h.session.complete_load(first.run()));
        let shown = h.session.content().cloned().expect("content");
        assert!(shown.is_truncated());

        let again = h.session.refresh().expect("reloads");
        assert!(h.session.complete_load(again.run()));
        assert_eq!(h.session.content(), Some(&shown));

        h.session.handle_trigger(Some(path.clone()));
        let reopened = h.session.handle_trigger(Some(path.clone())).expect("text loads");
        assert!(h.session.complete_load(reopened.run()));
        assert_eq!(h.session.content(), Some(&shown));
        assert_eq!(h.session.state(), &SessionState::Shown(path));
    }

    #[test]
    fn different_path_retargets_without_hiding() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        h.session.handle_trigger(Some(p("b.ready")));
        assert_eq!(h.session.state(), &SessionState::Shown(p("b.ready")));
        assert_eq!(h.session.surface().hides(), 0);
    }

    #[test]
    fn deferred_content_stays_loading_until_completed() {
        let mut h = harness();
        let pending = h
            .session
            .handle_trigger(Some(p("x.slow")))
            .expect("loader handed out");
        assert_eq!(h.session.state(), &SessionState::Loading(p("x.slow")));
        assert!(h.session.content().is_some_and(PreviewContent::is_loading));
        assert_eq!(pending.path(), Path::new("x.slow"));

        assert!(h.session.complete_load(pending.run()));
        assert_eq!(h.session.state(), &SessionState::Shown(p("x.slow")));
        assert_eq!(
            h.session.content(),
            Some(&PreviewContent::info("loaded x.slow"))
        );
    }

    #[test]
    fn late_completion_for_previous_target_is_discarded() {
        let mut h = harness();
        let first = h.session.handle_trigger(Some(p("a.slow"))).expect("a");
        let second = h.session.handle_trigger(Some(p("b.slow"))).expect("b");
        let shown_before = h.session.surface().ops.len();

        assert!(!h.session.complete_load(first.run()));
        assert_eq!(h.session.state(), &SessionState::Loading(p("b.slow")));
        assert_eq!(h.session.surface().ops.len(), shown_before);

        assert!(h.session.complete_load(second.run()));
        assert_eq!(h.session.state(), &SessionState::Shown(p("b.slow")));
    }

    #[test]
    fn completion_after_toggle_off_is_discarded() {
        let mut h = harness();
        let pending = h.session.handle_trigger(Some(p("a.slow"))).expect("a");
        assert!(h.session.handle_trigger(Some(p("a.slow"))).is_none());
        assert_eq!(h.session.state(), &SessionState::Hidden);

        assert!(!h.session.complete_load(pending.run()));
        assert_eq!(h.session.state(), &SessionState::Hidden);
    }

    #[test]
    fn dialog_guard_blocks_every_kind_of_dismissal() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        assert!(h.session.perform(PreviewAction::About).is_none());
        assert!(h.session.dialog_open());

        assert!(!h.session.dismiss());
        assert!(!h.session.on_deactivated(false));
        assert!(h.session.handle_trigger(Some(p("a.ready"))).is_none());
        assert_eq!(h.session.state(), &SessionState::Shown(p("a.ready")));

        h.session.set_dialog_open(false);
        assert!(h.session.dismiss());
        assert_eq!(h.session.state(), &SessionState::Hidden);
    }

    #[test]
    fn shortcuts_follow_the_session_dialog_guard() {
        use crate::input::{resolve_shortcut, ShortcutAction, ShortcutKey, ShortcutModifiers};

        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        let escape = |session: &PreviewSession<RecordingSurface>| {
            resolve_shortcut(
                ShortcutKey::Escape,
                ShortcutModifiers::default(),
                session.input_context(),
            )
        };
        assert_eq!(escape(&h.session), Some(ShortcutAction::Dismiss));

        h.session.perform(PreviewAction::About);
        assert_eq!(escape(&h.session), Some(ShortcutAction::DialogClose));

        h.session.set_dialog_open(false);
        assert_eq!(escape(&h.session), Some(ShortcutAction::Dismiss));
    }

    #[test]
    fn dialog_guard_still_allows_retargeting() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        h.session.perform(PreviewAction::About);

        assert!(h.session.handle_trigger(Some(p("b.ready"))).is_none());
        assert_eq!(h.session.state(), &SessionState::Shown(p("b.ready")));
        assert_eq!(h.session.surface().hides(), 0);
        assert!(h.session.dialog_open());
    }

    #[test]
    fn deactivation_respects_minimize_pinning_and_options() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        assert!(!h.session.on_deactivated(true));

        assert!(h.session.toggle_stay_on_top());
        assert!(!h.session.on_deactivated(false));
        assert!(!h.session.toggle_stay_on_top());
        assert!(h.session.on_deactivated(false));
        assert_eq!(h.session.state(), &SessionState::Hidden);

        let options = SessionOptions {
            hide_on_deactivate: false,
            ..SessionOptions::default()
        };
        let mut h = harness_with(RecordingSurface::default(), options, false);
        h.session.handle_trigger(Some(p("a.ready")));
        assert!(!h.session.on_deactivated(false));
    }

    #[test]
    fn surface_failure_forces_hidden_and_notifies() {
        let surface = RecordingSurface {
            fail_show: true,
            ..RecordingSurface::default()
        };
        let mut h = harness_with(surface, SessionOptions::default(), false);
        assert!(h.session.handle_trigger(Some(p("a.slow"))).is_none());
        assert_eq!(h.session.state(), &SessionState::Hidden);
        assert_eq!(*h.notices.lock().expect("log"), vec!["Preview unavailable"]);
        assert_eq!(h.session.surface().ops, vec![SurfaceOp::Hide]);
    }

    #[test]
    fn renderer_panic_is_contained_as_failure_message() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("x.boom")));
        assert_eq!(h.session.state(), &SessionState::Shown(p("x.boom")));
        assert_eq!(h.session.content(), Some(&PreviewContent::failed()));
    }

    #[test]
    fn loader_panic_is_contained_as_failure_message() {
        let mut h = harness();
        let pending = h.session.handle_trigger(Some(p("x.badloader"))).expect("loader");
        let loaded = pending.run();
        assert_eq!(loaded.content, PreviewContent::failed());
        assert!(h.session.complete_load(loaded));
    }

    #[test]
    fn unclaimed_path_shows_no_preview_message() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("photo.unknown")));
        assert_eq!(h.session.state(), &SessionState::Shown(p("photo.unknown")));
        assert_eq!(h.session.content(), Some(&PreviewContent::no_preview()));
    }

    #[test]
    fn window_is_placed_around_the_pointer() {
        let surface = RecordingSurface {
            pointer: Some(Point::new(960, 540)),
            displays: vec![Rect::new(0, 0, 1920, 1080)],
            ..RecordingSurface::default()
        };
        let mut h = harness_with(surface, SessionOptions::default(), false);
        h.session.handle_trigger(Some(p("a.ready")));
        let expected = Rect::new(560, 218, 800, 645);
        assert!(h.session.surface().ops.contains(&SurfaceOp::Place(expected)));
        assert_eq!(h.session.shell().geometry(), Some(expected));
    }

    #[test]
    fn open_externally_hides_on_success_and_notifies_on_failure() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        h.session.perform(PreviewAction::OpenExternally);
        assert_eq!(*h.launches.lock().expect("log"), vec!["open a.ready"]);
        assert_eq!(h.session.state(), &SessionState::Hidden);

        let mut h = harness_with(RecordingSurface::default(), SessionOptions::default(), true);
        h.session.handle_trigger(Some(p("a.ready")));
        h.session.open_externally();
        assert_eq!(*h.notices.lock().expect("log"), vec!["Could not open file"]);
        assert_eq!(h.session.state(), &SessionState::Shown(p("a.ready")));
    }

    #[test]
    fn reveal_and_copy_actions_use_current_path_and_content() {
        let mut h = harness();
        h.session.perform(PreviewAction::CopyPath);
        assert!(h.session.surface().ops.is_empty());

        h.session.handle_trigger(Some(p("a.ready")));
        h.session.perform(PreviewAction::RevealInFolder);
        h.session.perform(PreviewAction::CopyPath);
        h.session.perform(PreviewAction::CopyContent);
        assert_eq!(*h.launches.lock().expect("log"), vec!["reveal a.ready"]);
        let copies: Vec<_> = h
            .session
            .surface()
            .ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Copy(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(copies, vec!["a.ready", "ready a.ready"]);
    }

    #[test]
    fn refresh_renders_the_current_path_again() {
        let mut h = harness();
        assert!(h.session.refresh().is_none());

        h.session.handle_trigger(Some(p("a.slow")));
        assert!(h.session.refresh().is_none(), "refresh waits for the first load");

        let mut h = harness();
        let pending = h.session.handle_trigger(Some(p("a.slow"))).expect("a");
        h.session.complete_load(pending.run());
        let again = h.session.perform(PreviewAction::Refresh).expect("reloads");
        assert_eq!(h.session.state(), &SessionState::Loading(p("a.slow")));
        assert!(h.session.complete_load(again.run()));
    }

    #[test]
    fn prepared_content_is_attached_without_rendering_again() {
        let mut h = harness();
        let registry = h.session.registry();
        let prepared = PreparedPreview::render(&registry, p("a.ready"));
        assert_eq!(prepared.path(), Path::new("a.ready"));

        assert!(h.session.handle_prepared(Some(prepared)).is_none());
        assert_eq!(h.session.state(), &SessionState::Shown(p("a.ready")));
        assert_eq!(
            h.session.content(),
            Some(&PreviewContent::info("ready a.ready"))
        );

        let panicked = PreparedPreview::render(&registry, p("x.boom"));
        h.session.handle_prepared(Some(panicked));
        assert_eq!(h.session.content(), Some(&PreviewContent::failed()));
        assert!(h.session.handle_prepared(None).is_none());
    }

    #[test]
    fn worker_refresh_for_a_path_no_longer_shown_is_discarded() {
        let mut h = harness();
        h.session.handle_trigger(Some(p("a.ready")));
        assert_eq!(h.session.refreshable_path(), Some(p("a.ready")));
        let registry = h.session.registry();
        let stale = PreparedPreview::render(&registry, p("a.ready"));

        h.session.handle_trigger(Some(p("b.ready")));
        let ops_before = h.session.surface().ops.len();
        assert!(h.session.refresh_prepared(stale).is_none());
        assert_eq!(h.session.state(), &SessionState::Shown(p("b.ready")));
        assert_eq!(h.session.surface().ops.len(), ops_before);

        let fresh = PreparedPreview::render(&registry, p("b.ready"));
        assert!(h.session.refresh_prepared(fresh).is_none());
        assert_eq!(h.session.state(), &SessionState::Shown(p("b.ready")));
        assert!(h.session.surface().ops.len() > ops_before);
    }

    #[test]
    fn stay_on_top_is_forwarded_to_surface() {
        let mut h = harness();
        h.session.perform(PreviewAction::ToggleStayOnTop);
        assert_eq!(h.session.surface().ops, vec![SurfaceOp::StayOnTop(true)]);
    }
}
