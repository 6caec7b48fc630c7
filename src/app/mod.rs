//! GTK4 runtime: the UI-affine thread that owns the preview window.
//!
//! Three inputs reach the session, all on the GTK main loop:
//! hotkey triggers (selection resolved on a worker first), window commands
//! from [`surface::SurfaceCommand`], and loader results from workers.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{load_app_config, AppConfig};
use crate::error::AppResult;
use crate::hotkey::{HotkeyInterceptor, TriggerEvent};
use crate::input::{resolve_shortcut, ShortcutAction};
use crate::instance::{InstanceError, InstanceGuard};
use crate::launcher::SystemLauncher;
use crate::notification::{self, DesktopNotifier};
use crate::preview::PreviewAction;
use crate::registry::RendererRegistry;
use crate::renderer::platform_preview_handlers;
use crate::selection::{platform_selection_source, SelectionSource};
use crate::session::{PendingLoad, PreparedPreview, PreviewSession};
use crate::ui::LAYOUT_TOKENS;
use gtk4::prelude::*;
use gtk4::Application;

mod content_view;
mod input_bridge;
mod layout;
mod native;
mod runtime_css;
mod shell_host;
mod startup;
mod surface;
mod worker;

use self::runtime_css::install_runtime_css;
use self::startup::{gtk_launch_args, StartupConfig};
use self::surface::{GtkSurface, SurfaceCommand};
use self::worker::{pump_channel, spawn_worker_action, ACTION_RESULT_POLL_INTERVAL};

const APP_ID: &str = "io.github.quickpeek";

type SharedSession = Rc<RefCell<PreviewSession<GtkSurface>>>;

#[derive(Clone)]
struct RuntimeContext {
    app: Application,
    session: SharedSession,
    /// Without a hotkey nothing can bring the window back once hidden.
    quit_when_hidden: bool,
}

impl RuntimeContext {
    fn dispatch_trigger(&self, prepared: Option<PreparedPreview>) {
        let pending = self.session.borrow_mut().handle_prepared(prepared);
        if let Some(pending) = pending {
            self.run_pending_load(pending);
        }
        self.quit_if_idle();
    }

    /// Renders `path` on a worker, then feeds it to the session as a trigger.
    fn trigger_path(&self, path: PathBuf) {
        let registry = self.session.borrow().registry();
        let context = self.clone();
        spawn_worker_action(
            "render",
            move || PreparedPreview::render(&registry, path),
            move |prepared| context.dispatch_trigger(Some(prepared)),
        );
    }

    fn refresh(&self) {
        let (path, registry) = {
            let session = self.session.borrow();
            (session.refreshable_path(), session.registry())
        };
        let Some(path) = path else {
            tracing::debug!("nothing to refresh");
            return;
        };
        let context = self.clone();
        spawn_worker_action(
            "render",
            move || PreparedPreview::render(&registry, path),
            move |prepared| {
                let pending = context.session.borrow_mut().refresh_prepared(prepared);
                if let Some(pending) = pending {
                    context.run_pending_load(pending);
                }
            },
        );
    }

    fn run_pending_load(&self, pending: PendingLoad) {
        tracing::debug!(path = %pending.path().display(), "loading preview content");
        let context = self.clone();
        spawn_worker_action("loader", move || pending.run(), move |loaded| {
            if !context.session.borrow_mut().complete_load(loaded) {
                tracing::debug!("loader result arrived after the preview moved on");
            }
            context.quit_if_idle();
        });
    }

    fn handle_command(&self, command: SurfaceCommand) {
        let now = Instant::now();
        match command {
            SurfaceCommand::Action(PreviewAction::About) => {
                let mut session = self.session.borrow_mut();
                session.perform(PreviewAction::About);
                session.surface().show_about();
            }
            SurfaceCommand::Shortcut { key, modifiers } => {
                let context = self.session.borrow().input_context();
                match resolve_shortcut(key, modifiers, context) {
                    Some(ShortcutAction::DialogClose) => {
                        self.session.borrow().surface().close_dialog();
                    }
                    Some(shortcut) => {
                        if let Some(action) = shortcut.preview_action() {
                            self.handle_command(SurfaceCommand::Action(action));
                        }
                    }
                    None => {}
                }
                return;
            }
            SurfaceCommand::Action(PreviewAction::Refresh) => self.refresh(),
            SurfaceCommand::Action(action) => {
                let pending = self.session.borrow_mut().perform(action);
                if let Some(pending) = pending {
                    self.run_pending_load(pending);
                }
            }
            SurfaceCommand::Deactivated { minimized } => {
                self.session.borrow_mut().on_deactivated(minimized);
            }
            SurfaceCommand::DialogClosed => self.session.borrow_mut().set_dialog_open(false),
            SurfaceCommand::HoverEnter => {
                let mut session = self.session.borrow_mut();
                session.shell_mut().hover_enter(now);
                let visible = session.shell().controls_visible();
                session.surface().set_controls_visible(visible);
            }
            SurfaceCommand::HoverExit => self.session.borrow_mut().shell_mut().hover_exit(now),
        }
        self.quit_if_idle();
    }

    fn sync_hover_controls(&self) {
        let mut session = self.session.borrow_mut();
        let was_visible = session.shell().controls_visible();
        session
            .shell_mut()
            .update_hover_controls_visibility(Instant::now());
        let visible = session.shell().controls_visible();
        if was_visible != visible {
            session.surface().set_controls_visible(visible);
        }
    }

    fn quit_if_idle(&self) {
        if self.quit_when_hidden && !self.session.borrow().state().is_visible() {
            tracing::info!("preview closed and no hotkey is installed; quitting");
            self.app.quit();
        }
    }
}

fn install_command_tick(context: RuntimeContext, commands: Receiver<SurfaceCommand>) {
    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || {
        loop {
            match commands.try_recv() {
                Ok(command) => context.handle_command(command),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return gtk4::glib::ControlFlow::Break,
            }
        }
        context.sync_hover_controls();
        gtk4::glib::ControlFlow::Continue
    });
}

fn install_trigger_pump(
    context: RuntimeContext,
    triggers: Receiver<TriggerEvent>,
    selection: Arc<dyn SelectionSource>,
) {
    pump_channel(triggers, move |event: TriggerEvent| {
        tracing::debug!(latency = ?event.at.elapsed(), "trigger received");
        let selection = selection.clone();
        let registry = context.session.borrow().registry();
        let context = context.clone();
        spawn_worker_action(
            "selection",
            move || {
                selection
                    .selected_path()
                    .map(|path| PreparedPreview::render(&registry, path))
            },
            move |prepared| context.dispatch_trigger(prepared),
        );
    });
}

fn start_hotkey(
    config: &AppConfig,
    enabled: bool,
) -> (Option<HotkeyInterceptor>, Receiver<TriggerEvent>) {
    let (trigger_tx, trigger_rx) = mpsc::channel::<TriggerEvent>();
    if !enabled {
        tracing::info!("hotkey disabled from the command line");
        return (None, trigger_rx);
    }
    match HotkeyInterceptor::start(config.trigger_key(), trigger_tx) {
        Ok(hotkey) => (Some(hotkey), trigger_rx),
        Err(err) => {
            tracing::warn!(%err, "hotkey unavailable; previews only open from --path");
            (None, trigger_rx)
        }
    }
}

pub struct App {
    config: AppConfig,
    hotkey: Option<HotkeyInterceptor>,
}

impl App {
    pub fn new() -> Self {
        Self {
            config: load_app_config(),
            hotkey: None,
        }
    }

    pub fn start(&mut self) -> AppResult<()> {
        let startup_config = StartupConfig::from_args();
        let _instance = match InstanceGuard::acquire() {
            Ok(guard) => guard,
            Err(InstanceError::AlreadyRunning) => {
                tracing::info!("another instance is already running; exiting");
                notification::send("QuickPeek is already running.");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let (hotkey, trigger_rx) = start_hotkey(&self.config, startup_config.hotkey_enabled);
        let hotkey_running = hotkey.is_some();
        self.hotkey = hotkey;
        if !hotkey_running && startup_config.path.is_none() {
            tracing::warn!("no hotkey and no --path given; nothing to preview");
            self.shutdown();
            return Ok(());
        }

        tracing::info!("starting gtk runtime");
        let application = Application::new(Some(APP_ID), gtk4::gio::ApplicationFlags::NON_UNIQUE);
        let limits = self.config.render_limits();
        let options = self.config.session_options();
        let trigger_rx = Rc::new(RefCell::new(Some(trigger_rx)));
        let hold_guard = Rc::new(RefCell::new(None::<gtk4::gio::ApplicationHoldGuard>));
        let activate_once = Rc::new(Cell::new(false));
        let startup_path = startup_config.path.clone();

        application.connect_activate(move |app| {
            if activate_once.replace(true) {
                tracing::debug!("ignoring duplicate gtk activate signal");
                return;
            }
            if hotkey_running {
                // The window is hidden between previews; keep the loop alive.
                let guard = <gtk4::Application as gtk4::gio::prelude::ApplicationExtManual>::hold(app);
                hold_guard.borrow_mut().replace(guard);
            }

            let motion_enabled = gtk4::Settings::default()
                .map(|settings| settings.is_gtk_enable_animations())
                .unwrap_or(true);
            let motion_hover_ms = if motion_enabled {
                LAYOUT_TOKENS.motion_hover_ms
            } else {
                0
            };
            install_runtime_css(LAYOUT_TOKENS, motion_enabled);

            let (command_tx, command_rx) = mpsc::channel::<SurfaceCommand>();
            let surface = GtkSurface::new(app, LAYOUT_TOKENS, motion_hover_ms, command_tx);
            let registry = RendererRegistry::with_defaults(limits, platform_preview_handlers());
            tracing::info!(renderers = ?registry.names(), "renderer registry ready");
            let session = PreviewSession::new(
                surface,
                registry,
                Box::new(SystemLauncher),
                Box::new(DesktopNotifier),
                options,
            );
            let context = RuntimeContext {
                app: app.clone(),
                session: Rc::new(RefCell::new(session)),
                quit_when_hidden: !hotkey_running,
            };

            install_command_tick(context.clone(), command_rx);
            if let Some(triggers) = trigger_rx.borrow_mut().take() {
                let selection: Arc<dyn SelectionSource> = Arc::from(platform_selection_source());
                install_trigger_pump(context.clone(), triggers, selection);
            }
            if let Some(path) = startup_path.clone() {
                tracing::info!(path = %path.display(), "previewing startup path");
                context.trigger_path(path);
            }
        });

        application.run_with_args(&gtk_launch_args());
        self.shutdown();
        Ok(())
    }

    /// Stops the hotkey; later calls do nothing.
    pub fn shutdown(&mut self) {
        if let Some(mut hotkey) = self.hotkey.take() {
            hotkey.stop();
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
