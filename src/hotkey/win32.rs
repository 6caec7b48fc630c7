use std::cell::RefCell;
use std::sync::mpsc;
use std::thread::JoinHandle;

use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN,
    WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP,
};

use super::{HookError, KeyListener, KeyTransition, RawKeyEvent};

thread_local! {
    static LISTENER: RefCell<Option<Box<dyn KeyListener>>> = const { RefCell::new(None) };
}

/// Dedicated thread owning the hook and the message loop that services it.
pub(super) struct HookThread {
    thread_id: u32,
    join: Option<JoinHandle<()>>,
}

impl HookThread {
    pub(super) fn shutdown(mut self) {
        // SAFETY: posting to a thread id we created; failure only means the
        // loop already exited.
        let posted =
            unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
        if let Err(err) = posted {
            tracing::debug!(?err, "hook thread already gone");
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("keyboard hook thread panicked during shutdown");
            }
        }
    }
}

pub(super) fn install(listener: Box<dyn KeyListener>) -> Result<HookThread, HookError> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<u32, HookError>>(1);

    let join = std::thread::Builder::new()
        .name("quickpeek-hook".to_string())
        .spawn(move || run_hook_thread(listener, ready_tx))?;

    match ready_rx.recv() {
        Ok(Ok(thread_id)) => Ok(HookThread {
            thread_id,
            join: Some(join),
        }),
        Ok(Err(err)) => {
            let _ = join.join();
            Err(err)
        }
        Err(_) => {
            let _ = join.join();
            Err(HookError::ThreadExited)
        }
    }
}

fn run_hook_thread(
    listener: Box<dyn KeyListener>,
    ready: mpsc::SyncSender<Result<u32, HookError>>,
) {
    LISTENER.with(|slot| *slot.borrow_mut() = Some(listener));

    // SAFETY: plain Win32 calls; the hook procedure is a `'static` function
    // and is unhooked on this same thread before it exits.
    let module = match unsafe { GetModuleHandleW(None) } {
        Ok(module) => module,
        Err(err) => {
            let _ = ready.send(Err(HookError::ModuleHandle(err.to_string())));
            return;
        }
    };
    let installed = unsafe {
        SetWindowsHookExW(
            WH_KEYBOARD_LL,
            Some(keyboard_proc),
            HINSTANCE(module.0),
            0,
        )
    };
    let hook = match installed {
        Ok(hook) => hook,
        Err(err) => {
            let _ = ready.send(Err(HookError::Install(err.to_string())));
            return;
        }
    };

    let _ = ready.send(Ok(unsafe { GetCurrentThreadId() }));

    let mut message = MSG::default();
    // SAFETY: standard message pump on the thread that owns the hook.
    unsafe {
        while GetMessageW(&mut message, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&message);
            DispatchMessageW(&message);
        }
        if let Err(err) = UnhookWindowsHookEx(hook) {
            tracing::warn!(?err, "failed to unhook keyboard hook");
        }
    }

    LISTENER.with(|slot| slot.borrow_mut().take());
}

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let transition = match wparam.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyTransition::Down),
            WM_KEYUP | WM_SYSKEYUP => Some(KeyTransition::Up),
            _ => None,
        };
        if let Some(transition) = transition {
            // SAFETY: for WH_KEYBOARD_LL with HC_ACTION, lparam points to a
            // KBDLLHOOKSTRUCT valid for the duration of the call.
            let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
            let event = RawKeyEvent {
                code: info.vkCode,
                transition,
            };
            LISTENER.with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    if let Some(listener) = slot.as_mut() {
                        listener.on_key(event);
                    }
                }
            });
        }
    }

    // Every key, the trigger included, continues down the hook chain.
    CallNextHookEx(None, code, wparam, lparam)
}
