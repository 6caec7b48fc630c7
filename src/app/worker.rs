use std::sync::mpsc;
use std::time::Duration;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Runs `work` on a named background thread and hands its result to
/// `on_result` on the GTK main loop. If the thread cannot be spawned or dies
/// before sending, `on_result` is never called.
pub(super) fn spawn_worker_action<T, W, H>(name: &str, work: W, mut on_result: H)
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
    H: FnMut(T) + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    let spawned = std::thread::Builder::new()
        .name(format!("quickpeek-{name}"))
        .spawn(move || {
            let result = work();
            let _ = tx.send(result);
        });
    if let Err(err) = spawned {
        tracing::error!(?err, worker = name, "failed to spawn worker thread");
        return;
    }

    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || match rx.try_recv() {
        Ok(result) => {
            on_result(result);
            gtk4::glib::ControlFlow::Break
        }
        Err(mpsc::TryRecvError::Empty) => gtk4::glib::ControlFlow::Continue,
        Err(mpsc::TryRecvError::Disconnected) => gtk4::glib::ControlFlow::Break,
    });
}

/// Drains a channel fed by another thread on every main-loop tick.
pub(super) fn pump_channel<T, H>(rx: mpsc::Receiver<T>, mut on_item: H)
where
    T: 'static,
    H: FnMut(T) + 'static,
{
    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || loop {
        match rx.try_recv() {
            Ok(item) => on_item(item),
            Err(mpsc::TryRecvError::Empty) => break gtk4::glib::ControlFlow::Continue,
            Err(mpsc::TryRecvError::Disconnected) => break gtk4::glib::ControlFlow::Break,
        }
    });
}
