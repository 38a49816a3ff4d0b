use super::handle::Handle;

use std::cell::RefCell;

thread_local! {
    /// Handle of the runtime whose jobs the current thread is running.
    ///
    /// Set on worker threads for their whole lifetime, and on the calling
    /// thread while a current-thread runtime drains its queue.
    pub(crate) static CURRENT_HANDLE: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Installs `handle` as the current runtime handle for the duration of `f`.
///
/// The previous handle is restored afterwards, so runtimes nest.
pub(crate) fn enter_context<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_HANDLE.with(|cell| cell.replace(Some(handle)));

    let out = f();

    CURRENT_HANDLE.with(|cell| cell.replace(prev));

    out
}

/// Returns the current runtime handle, if any.
pub(crate) fn current() -> Option<Handle> {
    CURRENT_HANDLE.with(|cell| cell.borrow().clone())
}
